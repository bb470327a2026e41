//! 财务指标汇总: annual averages and the static profitability ratios.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Operation-year series and scalars the summary is computed from.
#[derive(Debug, Clone, Copy)]
pub struct SummarySources<'a> {
    pub total_investment: Money,
    pub construction_investment: Money,
    pub construction_interest: Money,
    pub working_capital: Money,
    pub loan_amount: Money,
    pub net_revenue: &'a [Money],
    pub total_cost: &'a [Money],
    pub surcharges: &'a [Money],
    pub vat: &'a [Money],
    pub ebit: &'a [Money],
    pub total_profit: &'a [Money],
    pub income_tax: &'a [Money],
    pub net_profit: &'a [Money],
    pub interest_coverage: &'a [Decimal],
    pub debt_service_coverage: &'a [Decimal],
    /// Principal plus interest per year; years with none are left out of the
    /// coverage averages
    pub debt_service: &'a [Money],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_investment: Money,
    pub construction_investment: Money,
    pub construction_interest: Money,
    pub working_capital: Money,
    pub loan_amount: Money,
    pub equity: Money,
    pub average_revenue: Money,
    pub average_total_cost: Money,
    pub average_surcharges: Money,
    pub average_vat: Money,
    pub average_ebit: Money,
    pub average_total_profit: Money,
    pub average_income_tax: Money,
    pub average_net_profit: Money,
    /// 总投资收益率: average EBIT over total investment
    pub return_on_investment: Rate,
    /// 投资利税率: (average profit + surcharges + VAT) over total investment
    pub investment_profit_tax_rate: Rate,
    /// 项目资本金净利润率: average net profit over equity
    pub return_on_equity: Rate,
    pub average_interest_coverage: Decimal,
    pub average_debt_service_coverage: Decimal,
}

fn average(values: &[Money], years: usize) -> Money {
    safe_ratio(values.iter().copied().sum(), Decimal::from(years as u64))
}

pub fn build_summary(operation_years: u32, sources: &SummarySources<'_>) -> FinancialSummary {
    let years = operation_years as usize;
    let ti = sources.total_investment;
    let equity = (ti - sources.loan_amount).max(Decimal::ZERO);

    let average_revenue = average(sources.net_revenue, years);
    let average_total_cost = average(sources.total_cost, years);
    let average_surcharges = average(sources.surcharges, years);
    let average_vat = average(sources.vat, years);
    let average_ebit = average(sources.ebit, years);
    let average_total_profit = average(sources.total_profit, years);
    let average_income_tax = average(sources.income_tax, years);
    let average_net_profit = average(sources.net_profit, years);

    let serviced: Vec<usize> = (0..years)
        .filter(|i| sources.debt_service.get(*i).is_some_and(|d| !d.is_zero()))
        .collect();
    let coverage_average = |ratios: &[Decimal]| -> Decimal {
        let sum: Decimal = serviced
            .iter()
            .map(|i| ratios.get(*i).copied().unwrap_or(Decimal::ZERO))
            .sum();
        safe_ratio(sum, Decimal::from(serviced.len() as u64))
    };

    FinancialSummary {
        total_investment: ti,
        construction_investment: sources.construction_investment,
        construction_interest: sources.construction_interest,
        working_capital: sources.working_capital,
        loan_amount: sources.loan_amount,
        equity,
        average_revenue,
        average_total_cost,
        average_surcharges,
        average_vat,
        average_ebit,
        average_total_profit,
        average_income_tax,
        average_net_profit,
        return_on_investment: safe_ratio(average_ebit, ti),
        investment_profit_tax_rate: safe_ratio(
            average_total_profit + average_surcharges + average_vat,
            ti,
        ),
        return_on_equity: safe_ratio(average_net_profit, equity),
        average_interest_coverage: coverage_average(sources.interest_coverage),
        average_debt_service_coverage: coverage_average(sources.debt_service_coverage),
    }
}
