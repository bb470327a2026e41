use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cash_flow::{build_cash_flow, CashFlowOutput, CashFlowSources};
use crate::cost::tables::CostInputs;
use crate::cost::{build_costs, CostOutput};
use crate::indicators::summary::SummarySources;
use crate::indicators::{build_summary, investment_returns, FinancialSummary, InvestmentReturns};
use crate::loan::{
    build_loan_repayment_table, schedule_loan, LoanRepaymentOutput, LoanSchedule,
    RepaymentSources,
};
use crate::profit::{build_profit, ProfitOutput, ProfitSources};
use crate::revenue::items::escalation_overflows;
use crate::revenue::{build_revenue, RevenueOutput};
use crate::table::sum_series;
use crate::types::*;
use crate::vat::{build_vat, VatOutput};
use crate::FeasibilityResult;

use super::input::FeasibilityInput;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub schedule: LoanSchedule,
    pub repayment: LoanRepaymentOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialIndicators {
    pub returns: InvestmentReturns,
    pub summary: FinancialSummary,
}

/// Every derived table of the report plus the summary indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityOutput {
    pub revenue: RevenueOutput,
    pub costs: CostOutput,
    pub vat: VatOutput,
    pub profit: ProfitOutput,
    pub loan: LoanOutput,
    pub cash_flow: CashFlowOutput,
    pub indicators: FinancialIndicators,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The project context, or `None` (with a warning) when it is missing.
fn context<'a>(
    input: &'a FeasibilityInput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<Option<&'a ProjectContext>> {
    match &input.context {
        Some(ctx) => {
            ctx.validate()?;
            Ok(Some(ctx))
        }
        None => {
            warnings.push("No project context supplied; all tables are empty".into());
            Ok(None)
        }
    }
}

fn loan_schedule(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<LoanSchedule> {
    let Some(loan) = &input.loan else {
        return Ok(LoanSchedule::none(ctx.operation_years));
    };
    let schedule = schedule_loan(loan, ctx.operation_years, warnings)?;
    if schedule.outstanding_at_horizon > Decimal::ZERO {
        warnings.push(format!(
            "Loan balance of {} remains outstanding after the last operation year",
            schedule.outstanding_at_horizon.round_dp(2)
        ));
    }
    Ok(schedule)
}

fn costs(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    schedule: &LoanSchedule,
    warnings: &mut Vec<String>,
) -> CostOutput {
    let interest = schedule.interest();
    let inputs = CostInputs {
        config: &input.cost_config,
        revenue_items: &input.revenue_items,
        rates: &input.production_rates,
        depreciation: &input.depreciation,
        construction_interest: input.construction_interest,
        interest_expense: &interest,
    };
    build_costs(ctx, &inputs, warnings)
}

/// Revenue through VAT, the part of the chain that does not depend on profit.
struct Operating {
    schedule: LoanSchedule,
    revenue: RevenueOutput,
    costs: CostOutput,
    vat: VatOutput,
}

fn operating(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<Operating> {
    let schedule = loan_schedule(ctx, input, warnings)?;
    let revenue = build_revenue(ctx, &input.revenue_items, &input.production_rates);
    warnings.extend(escalation_overflows(&input.revenue_items, ctx.operation_years));
    let costs = costs(ctx, input, &schedule, warnings);
    let vat = build_vat(ctx, &revenue.output_tax, &costs.input_tax, &input.tax_config);
    Ok(Operating {
        schedule,
        revenue,
        costs,
        vat,
    })
}

fn profit(ctx: &ProjectContext, input: &FeasibilityInput, op: &Operating) -> ProfitOutput {
    let sources = ProfitSources {
        net_revenue: &op.revenue.net_revenue,
        surcharges: &op.vat.surcharges,
        total_cost: &op.costs.total_cost,
        interest: &op.costs.interest,
        depreciation: &op.costs.depreciation,
        amortization: &op.costs.amortization,
        subsidy_income: input.subsidy_income,
    };
    build_profit(ctx, &sources, &input.tax_config)
}

fn loan_repayment(ctx: &ProjectContext, op: &Operating, profit: &ProfitOutput) -> LoanRepaymentOutput {
    let len = ctx.operation_years as usize;
    let depreciation_amortization = sum_series(len, &[&op.costs.depreciation, &op.costs.amortization]);
    let sources = RepaymentSources {
        depreciation_amortization: &depreciation_amortization,
        net_profit: &profit.net_profit,
        ebit: &profit.ebit,
        ebitda: &profit.ebitda,
        income_tax: &profit.income_tax,
    };
    build_loan_repayment_table(&op.schedule, &sources)
}

fn cash_flow(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    op: &Operating,
    profit: &ProfitOutput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<CashFlowOutput> {
    let len = ctx.operation_years as usize;
    let operating_cost = sum_series(len, &[&op.costs.operating_cost, &op.costs.management]);
    let sources = CashFlowSources {
        net_revenue: &op.revenue.net_revenue,
        operating_cost: &operating_cost,
        surcharges: &op.vat.surcharges,
        ebit: &profit.ebit,
        depreciation: &input.depreciation,
        subsidy_income: input.subsidy_income,
    };
    build_cash_flow(
        ctx,
        &input.cash_flow,
        &sources,
        &input.tax_config,
        &input.benchmark_rates,
        warnings,
    )
}

fn indicators(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    op: &Operating,
    profit: &ProfitOutput,
    repayment: &LoanRepaymentOutput,
    cash_flow: &CashFlowOutput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<FinancialIndicators> {
    let returns = investment_returns(cash_flow, &input.benchmark_rates, warnings)?;
    let debt_service: Vec<Money> = op.schedule.years.iter().map(|y| y.debt_service()).collect();
    let sources = SummarySources {
        total_investment: ctx.total_investment,
        construction_investment: input.cash_flow.investment.total(),
        construction_interest: input.construction_interest,
        working_capital: input.cash_flow.working_capital.amount,
        loan_amount: input.loan.as_ref().map(|l| l.loan_amount).unwrap_or(Decimal::ZERO),
        net_revenue: &op.revenue.net_revenue,
        total_cost: &op.costs.total_cost,
        surcharges: &op.vat.surcharges,
        vat: &op.vat.vat_payable,
        ebit: &profit.ebit,
        total_profit: &profit.total_profit,
        income_tax: &profit.income_tax,
        net_profit: &profit.net_profit,
        interest_coverage: &repayment.interest_coverage,
        debt_service_coverage: &repayment.debt_service_coverage,
        debt_service: &debt_service,
    };
    Ok(FinancialIndicators {
        returns,
        summary: build_summary(ctx.operation_years, &sources),
    })
}

fn empty_indicators(input: &FeasibilityInput) -> FinancialIndicators {
    FinancialIndicators {
        returns: InvestmentReturns::empty(&input.benchmark_rates),
        summary: build_summary(
            0,
            &SummarySources {
                total_investment: Decimal::ZERO,
                construction_investment: Decimal::ZERO,
                construction_interest: Decimal::ZERO,
                working_capital: Decimal::ZERO,
                loan_amount: Decimal::ZERO,
                net_revenue: &[],
                total_cost: &[],
                surcharges: &[],
                vat: &[],
                ebit: &[],
                total_profit: &[],
                income_tax: &[],
                net_profit: &[],
                interest_coverage: &[],
                debt_service_coverage: &[],
                debt_service: &[],
            },
        ),
    }
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// 营业收入估算表.
pub fn calculate_revenue(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<RevenueOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => build_revenue(ctx, &input.revenue_items, &input.production_rates),
        None => RevenueOutput::empty(),
    };
    Ok(with_metadata(
        "Tax-inclusive revenue by item with output VAT split",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// Operating cost, total cost and the purchase and wage detail tables.
pub fn calculate_costs(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<CostOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => {
            let schedule = loan_schedule(ctx, input, &mut warnings)?;
            costs(ctx, input, &schedule, &mut warnings)
        }
        None => CostOutput::empty(),
    };
    Ok(with_metadata(
        "Cost categories with tax-inclusive input amounts, plus financing and depreciation",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// 增值税及附加.
pub fn calculate_vat(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<VatOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => operating(ctx, input, &mut warnings)?.vat,
        None => VatOutput::empty(),
    };
    Ok(with_metadata(
        "VAT payable after input tax and fixed-asset credits, with surcharges",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// 利润与利润分配表.
pub fn calculate_profit(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<ProfitOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => {
            let op = operating(ctx, input, &mut warnings)?;
            profit(ctx, input, &op)
        }
        None => ProfitOutput::empty(),
    };
    Ok(with_metadata(
        "Profit with unlimited loss carry-forward and statutory distribution",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// Loan schedule and 借款还本付息计划表.
pub fn calculate_loan(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => {
            let op = operating(ctx, input, &mut warnings)?;
            let profit = profit(ctx, input, &op);
            let repayment = loan_repayment(ctx, &op, &profit);
            LoanOutput {
                schedule: op.schedule,
                repayment,
            }
        }
        None => LoanOutput {
            schedule: LoanSchedule::none(0),
            repayment: LoanRepaymentOutput::empty(),
        },
    };
    Ok(with_metadata(
        "Monthly amortization rolled up to operation years, with coverage ratios",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// 项目投资现金流量表.
pub fn calculate_cash_flow(input: &FeasibilityInput) -> FeasibilityResult<ComputationOutput<CashFlowOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => {
            let op = operating(ctx, input, &mut warnings)?;
            let profit = profit(ctx, input, &op);
            cash_flow(ctx, input, &op, &profit, &mut warnings)?
        }
        None => CashFlowOutput::empty(),
    };
    Ok(with_metadata(
        "Project investment cash flow before and after adjusted income tax",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

/// IRR, NPV, paybacks and the summary ratios.
pub fn calculate_indicators(
    input: &FeasibilityInput,
) -> FeasibilityResult<ComputationOutput<FinancialIndicators>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => build_projection_inner(ctx, input, &mut warnings)?.indicators,
        None => empty_indicators(input),
    };
    Ok(with_metadata(
        "IRR (Newton-Raphson with bisection fallback), end-of-year NPV, interpolated payback",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}

fn build_projection_inner(
    ctx: &ProjectContext,
    input: &FeasibilityInput,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<FeasibilityOutput> {
    let _span = tracing::debug_span!(
        "projection",
        construction_years = ctx.construction_years,
        operation_years = ctx.operation_years
    )
    .entered();

    let op = operating(ctx, input, warnings)?;
    let profit = profit(ctx, input, &op);
    let repayment = loan_repayment(ctx, &op, &profit);
    let cash_flow = cash_flow(ctx, input, &op, &profit, warnings)?;
    let indicators = indicators(ctx, input, &op, &profit, &repayment, &cash_flow, warnings)?;

    Ok(FeasibilityOutput {
        revenue: op.revenue,
        costs: op.costs,
        vat: op.vat,
        profit,
        loan: LoanOutput {
            schedule: op.schedule,
            repayment,
        },
        cash_flow,
        indicators,
    })
}

/// Run the whole chain: revenue, loan schedule, cost, VAT, profit, loan
/// repayment, cash flow and indicators.
pub fn build_projection(
    input: &FeasibilityInput,
) -> FeasibilityResult<ComputationOutput<FeasibilityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let result = match context(input, &mut warnings)? {
        Some(ctx) => build_projection_inner(ctx, input, &mut warnings)?,
        None => FeasibilityOutput {
            revenue: RevenueOutput::empty(),
            costs: CostOutput::empty(),
            vat: VatOutput::empty(),
            profit: ProfitOutput::empty(),
            loan: LoanOutput {
                schedule: LoanSchedule::none(0),
                repayment: LoanRepaymentOutput::empty(),
            },
            cash_flow: CashFlowOutput::empty(),
            indicators: empty_indicators(input),
        },
    };
    Ok(with_metadata(
        "Feasibility projection: revenue, cost, VAT, profit, loan, cash flow, indicators",
        input,
        warnings,
        elapsed_us(start),
        result,
    ))
}
