use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::table::{DerivedTable, DerivedTableRow, YearSpan};
use crate::types::*;

pub const PROFIT_TABLE_TITLE: &str = "利润与利润分配表";

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Upstream series feeding the profit table, one value per operation year.
#[derive(Debug, Clone, Copy)]
pub struct ProfitSources<'a> {
    /// 营业收入, net of output VAT
    pub net_revenue: &'a [Money],
    /// 税金及附加
    pub surcharges: &'a [Money],
    /// 总成本费用
    pub total_cost: &'a [Money],
    pub interest: &'a [Money],
    pub depreciation: &'a [Money],
    pub amortization: &'a [Money],
    /// 补贴收入, the same amount every operation year
    pub subsidy_income: Money,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitOutput {
    pub table: DerivedTable,
    pub total_profit: Vec<Money>,
    /// Loss balance from earlier years available for offset
    pub loss_carried_forward: Vec<Money>,
    pub taxable_income: Vec<Money>,
    pub income_tax: Vec<Money>,
    pub net_profit: Vec<Money>,
    pub statutory_surplus: Vec<Money>,
    pub undistributed_profit: Vec<Money>,
    pub ebit: Vec<Money>,
    pub ebitda: Vec<Money>,
}

impl ProfitOutput {
    pub fn empty() -> Self {
        ProfitOutput {
            table: DerivedTable::new(PROFIT_TABLE_TITLE, YearSpan::Operation),
            total_profit: Vec::new(),
            loss_carried_forward: Vec::new(),
            taxable_income: Vec::new(),
            income_tax: Vec::new(),
            net_profit: Vec::new(),
            statutory_surplus: Vec::new(),
            undistributed_profit: Vec::new(),
            ebit: Vec::new(),
            ebitda: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Loss balance entering each year. Losses accumulate without expiry;
/// profits draw the balance down, never below zero.
pub fn loss_carry_forward(total_profit: &[Money]) -> Vec<Money> {
    let mut balance = Decimal::ZERO;
    total_profit
        .iter()
        .map(|profit| {
            let entering = balance;
            if *profit < Decimal::ZERO {
                balance += profit.abs();
            } else {
                balance = (balance - profit).max(Decimal::ZERO);
            }
            entering
        })
        .collect()
}

/// Profit, income tax and the distribution waterfall for every operation year.
pub fn build_profit(ctx: &ProjectContext, sources: &ProfitSources<'_>, tax: &TaxConfig) -> ProfitOutput {
    let len = ctx.operation_years as usize;
    let at = |s: &[Money], i: usize| s.get(i).copied().unwrap_or(Decimal::ZERO);
    let series = |s: &[Money]| -> Vec<Money> { (0..len).map(|i| at(s, i)).collect() };

    let revenue = series(sources.net_revenue);
    let surcharges = series(sources.surcharges);
    let total_cost = series(sources.total_cost);
    let subsidy = vec![sources.subsidy_income; len];

    let total_profit: Vec<Money> = (0..len)
        .map(|i| revenue[i] - surcharges[i] - total_cost[i] + subsidy[i])
        .collect();
    let loss_carried_forward = loss_carry_forward(&total_profit);
    let taxable_income: Vec<Money> = (0..len)
        .map(|i| (total_profit[i] - loss_carried_forward[i]).max(Decimal::ZERO))
        .collect();
    let income_tax: Vec<Money> = taxable_income
        .iter()
        .map(|t| t * tax.income_tax_rate)
        .collect();
    let net_profit: Vec<Money> = (0..len).map(|i| total_profit[i] - income_tax[i]).collect();

    let surplus_rate = percent_to_rate(tax.statutory_surplus_rate);
    let retained_share = Decimal::ONE - surplus_rate;
    let initial_undistributed: Vec<Money> = (0..len)
        .map(|i| net_profit[..i].iter().map(|n| n * retained_share).sum())
        .collect();
    let distributable: Vec<Money> = (0..len)
        .map(|i| net_profit[i] + initial_undistributed[i])
        .collect();
    let statutory_surplus: Vec<Money> = net_profit.iter().map(|n| n * surplus_rate).collect();
    let investor_distributable: Vec<Money> = (0..len)
        .map(|i| distributable[i] - statutory_surplus[i])
        .collect();

    // Preferred dividends, discretionary reserve and investor distributions are not modelled.
    let preferred = vec![Decimal::ZERO; len];
    let discretionary = vec![Decimal::ZERO; len];
    let investor_distribution = vec![Decimal::ZERO; len];
    let common_dividend: Vec<Money> = (0..len)
        .map(|i| investor_distributable[i] - preferred[i] - discretionary[i])
        .collect();
    let undistributed_profit: Vec<Money> = (0..len)
        .map(|i| investor_distributable[i] - preferred[i] - discretionary[i] - investor_distribution[i])
        .collect();

    let interest = series(sources.interest);
    let ebit: Vec<Money> = (0..len).map(|i| total_profit[i] + interest[i]).collect();
    let ebitda: Vec<Money> = (0..len)
        .map(|i| ebit[i] + at(sources.depreciation, i) + at(sources.amortization, i))
        .collect();

    let mut table = DerivedTable::new(PROFIT_TABLE_TITLE, YearSpan::Operation);
    table.push(DerivedTableRow::item("1", "营业收入", revenue));
    table.push(DerivedTableRow::item("2", "税金附加等", surcharges));
    table.push(DerivedTableRow::item("3", "总成本费用", total_cost));
    table.push(DerivedTableRow::item("4", "补贴收入", subsidy));
    table.push(DerivedTableRow::subtotal("5", "利润总额", total_profit.clone()));
    table.push(
        DerivedTableRow::item("6", "弥补以前年度亏损", loss_carried_forward.clone())
            .with_conventional_total(Decimal::ZERO),
    );
    table.push(DerivedTableRow::item("7", "应纳税所得额", taxable_income.clone()));
    table.push(DerivedTableRow::item("8", "所得税", income_tax.clone()));
    table.push(DerivedTableRow::subtotal("9", "净利润", net_profit.clone()));
    table.push(
        DerivedTableRow::item("10", "期初未分配利润", initial_undistributed)
            .with_conventional_total(Decimal::ZERO),
    );
    table.push(DerivedTableRow::subtotal("11", "可供分配的利润", distributable));
    table.push(DerivedTableRow::item("12", "提取法定盈余公积金", statutory_surplus.clone()));
    table.push(DerivedTableRow::subtotal("13", "可供投资者分配的利润", investor_distributable));
    table.push(DerivedTableRow::item("14", "应付优先股股利", preferred));
    table.push(DerivedTableRow::item("15", "提取任意盈余公积金", discretionary));
    table.push(DerivedTableRow::item("16", "应付普通股股利", common_dividend));
    table.push(DerivedTableRow::item("17", "各投资方利润分配", investor_distribution));
    table.push(DerivedTableRow::total("18", "未分配利润", undistributed_profit.clone()));
    table.push(DerivedTableRow::item("19", "息税前利润（利润总额+利息支出）", ebit.clone()));
    table.push(DerivedTableRow::item(
        "20",
        "息税折旧摊销前利润（息税前利润+折旧+摊销）",
        ebitda.clone(),
    ));

    tracing::debug!(years = len, "profit table built");

    ProfitOutput {
        table,
        total_profit,
        loss_carried_forward,
        taxable_income,
        income_tax,
        net_profit,
        statutory_surplus,
        undistributed_profit,
        ebit,
        ebitda,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_loss_carry_forward_balance() {
        let balance = loss_carry_forward(&[dec!(-100), dec!(-50), dec!(60), dec!(200), dec!(10)]);
        assert_eq!(
            balance,
            vec![dec!(0), dec!(100), dec!(150), dec!(90), dec!(0)]
        );
    }

    #[test]
    fn test_taxable_income_after_losses() {
        let ctx = ProjectContext {
            construction_years: 1,
            operation_years: 3,
            total_investment: dec!(500),
        };
        let revenue = [dec!(50), dec!(200), dec!(200)];
        let cost = [dec!(100), dec!(100), dec!(100)];
        let zeros = [Decimal::ZERO; 3];
        let sources = ProfitSources {
            net_revenue: &revenue,
            surcharges: &zeros,
            total_cost: &cost,
            interest: &zeros,
            depreciation: &zeros,
            amortization: &zeros,
            subsidy_income: Decimal::ZERO,
        };
        let out = build_profit(&ctx, &sources, &TaxConfig::default());
        assert_eq!(out.total_profit, vec![dec!(-50), dec!(100), dec!(100)]);
        assert_eq!(out.taxable_income, vec![dec!(0), dec!(50), dec!(100)]);
        assert_eq!(out.income_tax, vec![dec!(0), dec!(12.5), dec!(25)]);
        assert_eq!(out.net_profit, vec![dec!(-50), dec!(87.5), dec!(75)]);
        assert!(out.table.verify_totals().is_empty());
    }
}
