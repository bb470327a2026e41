use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::depreciation::{residual_value, DepreciationRow};
use crate::table::{cumulative, DerivedTable, DerivedTableRow, YearSpan};
use crate::time_value::discount_factor;
use crate::types::*;
use crate::FeasibilityResult;

pub const CASH_FLOW_TABLE_TITLE: &str = "项目投资现金流量表";

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Construction investment by component, as estimated for the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentBreakdown {
    /// Building and installation works, spread evenly over construction
    #[serde(default)]
    pub building_installation: Money,
    /// Equipment purchase, paid in the last construction year
    #[serde(default)]
    pub equipment: Money,
    /// Other engineering fees, paid in the first construction year
    #[serde(default)]
    pub other_fees: Money,
    /// Land and other intangibles, paid in the first construction year
    #[serde(default)]
    pub intangible_assets: Money,
    /// Basic and price contingencies, paid in the last construction year
    #[serde(default)]
    pub reserve_fees: Money,
}

impl InvestmentBreakdown {
    pub fn total(&self) -> Money {
        self.building_installation
            + self.equipment
            + self.other_fees
            + self.intangible_assets
            + self.reserve_fees
    }

    /// Outflow per construction year. A project without construction years
    /// spends everything in its first column.
    pub fn allocate(&self, construction_years: u32) -> Vec<Money> {
        let n = construction_years.max(1) as usize;
        let share = self.building_installation / Decimal::from(n as u64);
        (0..n)
            .map(|i| {
                let mut amount = share;
                if i == 0 {
                    amount += self.other_fees + self.intangible_assets;
                }
                if i == n - 1 {
                    amount += self.equipment + self.reserve_fees;
                }
                amount
            })
            .collect()
    }
}

/// 流动资金
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingCapital {
    #[serde(default)]
    pub amount: Money,
    /// 1-based column on the full horizon; defaults to the first operation year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_year: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlowConfig {
    #[serde(default)]
    pub investment: InvestmentBreakdown,
    #[serde(default)]
    pub working_capital: WorkingCapital,
    /// 维持运营投资 per operation year
    #[serde(default)]
    pub maintenance_investment: Vec<Money>,
}

/// 基准收益率 used for discounting, before and after income tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRates {
    #[serde(default = "default_benchmark_rate")]
    pub pre_tax: Rate,
    #[serde(default = "default_benchmark_rate")]
    pub post_tax: Rate,
}

fn default_benchmark_rate() -> Rate {
    dec!(0.06)
}

impl Default for BenchmarkRates {
    fn default() -> Self {
        BenchmarkRates {
            pre_tax: default_benchmark_rate(),
            post_tax: default_benchmark_rate(),
        }
    }
}

/// Operation-year series from the upstream tables.
#[derive(Debug, Clone, Copy)]
pub struct CashFlowSources<'a> {
    pub net_revenue: &'a [Money],
    /// 经营成本: operating cost plus management, excluding depreciation,
    /// amortization and interest
    pub operating_cost: &'a [Money],
    pub surcharges: &'a [Money],
    pub ebit: &'a [Money],
    pub depreciation: &'a [DepreciationRow],
    pub subsidy_income: Money,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Full-horizon series (construction followed by operation years).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowOutput {
    pub table: DerivedTable,
    pub pre_tax: Vec<Money>,
    pub cumulative_pre_tax: Vec<Money>,
    /// EBIT × income tax rate, never negative
    pub adjusted_income_tax: Vec<Money>,
    pub post_tax: Vec<Money>,
    pub cumulative_post_tax: Vec<Money>,
    pub pre_tax_discounted: Vec<Money>,
    pub post_tax_discounted: Vec<Money>,
}

impl CashFlowOutput {
    pub fn empty() -> Self {
        CashFlowOutput {
            table: DerivedTable::new(CASH_FLOW_TABLE_TITLE, YearSpan::Calculation),
            pre_tax: Vec::new(),
            cumulative_pre_tax: Vec::new(),
            adjusted_income_tax: Vec::new(),
            post_tax: Vec::new(),
            cumulative_post_tax: Vec::new(),
            pre_tax_discounted: Vec::new(),
            post_tax_discounted: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Discount a full-horizon series; column `j` is discounted `j + 1` periods.
fn discount_series(values: &[Money], rate: Rate) -> FeasibilityResult<Vec<Money>> {
    values
        .iter()
        .enumerate()
        .map(|(j, v)| -> FeasibilityResult<Money> { Ok(v * discount_factor(rate, j as u32 + 1)?) })
        .collect()
}

/// Project investment cash flow over construction and operation years.
pub fn build_cash_flow(
    ctx: &ProjectContext,
    config: &CashFlowConfig,
    sources: &CashFlowSources<'_>,
    tax: &TaxConfig,
    rates: &BenchmarkRates,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<CashFlowOutput> {
    let construction = ctx.construction_years as usize;
    let operation = ctx.operation_years as usize;
    let len = construction + operation;
    if len == 0 {
        return Ok(CashFlowOutput::empty());
    }

    let op = |s: &[Money], i: usize| -> Money {
        i.checked_sub(construction)
            .and_then(|k| s.get(k).copied())
            .unwrap_or(Decimal::ZERO)
    };
    let over_operation = |s: &[Money]| -> Vec<Money> { (0..len).map(|i| op(s, i)).collect() };

    let revenue = over_operation(sources.net_revenue);
    let subsidy: Vec<Money> = (0..len)
        .map(|i| if i >= construction { sources.subsidy_income } else { Decimal::ZERO })
        .collect();

    let mut investment = vec![Decimal::ZERO; len];
    for (i, amount) in config.investment.allocate(ctx.construction_years).into_iter().enumerate() {
        if let Some(slot) = investment.get_mut(i) {
            *slot += amount;
        }
    }
    let mut working_capital = vec![Decimal::ZERO; len];
    if !config.working_capital.amount.is_zero() {
        let draw_year = config
            .working_capital
            .draw_year
            .unwrap_or(ctx.construction_years + 1);
        match (draw_year as usize).checked_sub(1).filter(|j| *j < len) {
            Some(j) => working_capital[j] += config.working_capital.amount,
            None => warnings.push(format!(
                "Working capital draw year {draw_year} is outside the {len}-year horizon; ignored"
            )),
        }
    }
    let mut residual = vec![Decimal::ZERO; len];
    let mut working_capital_recovery = vec![Decimal::ZERO; len];
    if operation > 0 {
        residual[len - 1] = residual_value(sources.depreciation, operation);
        working_capital_recovery[len - 1] = working_capital.iter().copied().sum();
    }

    let operating_cost = over_operation(sources.operating_cost);
    let surcharges = over_operation(sources.surcharges);
    let maintenance = over_operation(&config.maintenance_investment);

    let inflow: Vec<Money> = (0..len)
        .map(|i| revenue[i] + subsidy[i] + residual[i] + working_capital_recovery[i])
        .collect();
    let outflow: Vec<Money> = (0..len)
        .map(|i| investment[i] + working_capital[i] + operating_cost[i] + surcharges[i] + maintenance[i])
        .collect();

    let pre_tax: Vec<Money> = (0..len).map(|i| inflow[i] - outflow[i]).collect();
    let adjusted_income_tax: Vec<Money> = (0..len)
        .map(|i| op(sources.ebit, i) * tax.income_tax_rate)
        .collect();
    let post_tax: Vec<Money> = (0..len).map(|i| pre_tax[i] - adjusted_income_tax[i]).collect();
    let cumulative_pre_tax = cumulative(&pre_tax);
    let cumulative_post_tax = cumulative(&post_tax);
    let pre_tax_discounted = discount_series(&pre_tax, rates.pre_tax)?;
    let post_tax_discounted = discount_series(&post_tax, rates.post_tax)?;

    let mut table = DerivedTable::new(CASH_FLOW_TABLE_TITLE, YearSpan::Calculation);
    table.push(DerivedTableRow::subtotal("1", "现金流入", inflow));
    table.push(DerivedTableRow::item("1.1", "营业收入", revenue));
    table.push(DerivedTableRow::item("1.2", "补贴收入", subsidy));
    table.push(DerivedTableRow::item("1.3", "回收固定资产余值", residual));
    table.push(DerivedTableRow::item("1.4", "回收流动资金", working_capital_recovery));
    table.push(DerivedTableRow::subtotal("2", "现金流出", outflow));
    table.push(DerivedTableRow::item("2.1", "建设投资", investment));
    table.push(DerivedTableRow::item("2.2", "流动资金", working_capital));
    table.push(DerivedTableRow::item("2.3", "经营成本", operating_cost));
    table.push(DerivedTableRow::item("2.4", "税金及附加", surcharges));
    table.push(DerivedTableRow::item("2.5", "维持运营投资", maintenance));
    table.push(DerivedTableRow::total("3", "所得税前净现金流量", pre_tax.clone()));
    table.push(DerivedTableRow::balance("4", "累计所得税前净现金流量", cumulative_pre_tax.clone()));
    table.push(DerivedTableRow::item("5", "调整所得税", adjusted_income_tax.clone()));
    table.push(DerivedTableRow::total("6", "所得税后净现金流量", post_tax.clone()));
    table.push(DerivedTableRow::balance("7", "累计所得税后净现金流量", cumulative_post_tax.clone()));
    table.push(DerivedTableRow::item("8", "所得税前净现金流量现值", pre_tax_discounted.clone()));
    table.push(DerivedTableRow::balance(
        "9",
        "累计所得税前净现金流量现值",
        cumulative(&pre_tax_discounted),
    ));
    table.push(DerivedTableRow::item("10", "所得税后净现金流量现值", post_tax_discounted.clone()));
    table.push(DerivedTableRow::balance(
        "11",
        "累计所得税后净现金流量现值",
        cumulative(&post_tax_discounted),
    ));

    tracing::debug!(construction, operation, "cash flow table built");

    Ok(CashFlowOutput {
        table,
        pre_tax,
        cumulative_pre_tax,
        adjusted_income_tax,
        post_tax,
        cumulative_post_tax,
        pre_tax_discounted,
        post_tax_discounted,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
