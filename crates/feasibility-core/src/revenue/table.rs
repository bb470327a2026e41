use serde::{Deserialize, Serialize};

use crate::production_rate::ProductionRateSchedule;
use crate::table::{DerivedTable, DerivedTableRow, YearSpan};
use crate::types::*;

use super::items::{output_tax, RevenueItem};

pub const REVENUE_TABLE_TITLE: &str = "营业收入估算表";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Per-item yearly figures over the operation years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueItemSeries {
    pub id: String,
    pub name: String,
    pub tax_inclusive: Vec<Money>,
    pub output_tax: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueOutput {
    pub table: DerivedTable,
    pub items: Vec<RevenueItemSeries>,
    /// 营业收入 (含税)
    pub tax_inclusive: Vec<Money>,
    /// 销项税额
    pub output_tax: Vec<Money>,
    /// Revenue net of output VAT, used by every downstream table
    pub net_revenue: Vec<Money>,
}

impl RevenueOutput {
    pub fn empty() -> Self {
        RevenueOutput {
            table: DerivedTable::new(REVENUE_TABLE_TITLE, YearSpan::Operation),
            items: Vec::new(),
            tax_inclusive: Vec::new(),
            output_tax: Vec::new(),
            net_revenue: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Per-item and aggregated revenue with its output VAT for every operation year.
pub fn build_revenue(
    ctx: &ProjectContext,
    items: &[RevenueItem],
    rates: &ProductionRateSchedule,
) -> RevenueOutput {
    let years = ctx.operation_years;
    let len = years as usize;

    let series: Vec<RevenueItemSeries> = items
        .iter()
        .map(|item| {
            let tax_inclusive: Vec<Money> = (1..=years)
                .map(|y| item.tax_inclusive_revenue(y, rates))
                .collect();
            let output_tax = tax_inclusive
                .iter()
                .map(|v| output_tax(*v, item.vat_rate))
                .collect();
            RevenueItemSeries {
                id: item.id.clone(),
                name: item.name.clone(),
                tax_inclusive,
                output_tax,
            }
        })
        .collect();

    let tax_inclusive: Vec<Money> = (0..len)
        .map(|i| series.iter().map(|s| s.tax_inclusive[i]).sum())
        .collect();
    let total_output_tax: Vec<Money> = (0..len)
        .map(|i| series.iter().map(|s| s.output_tax[i]).sum())
        .collect();
    let net_revenue: Vec<Money> = tax_inclusive
        .iter()
        .zip(&total_output_tax)
        .map(|(gross, tax)| gross - tax)
        .collect();

    let mut table = DerivedTable::new(REVENUE_TABLE_TITLE, YearSpan::Operation);
    table.push(DerivedTableRow::subtotal("1", "营业收入", tax_inclusive.clone()));
    for (idx, s) in series.iter().enumerate() {
        table.push(DerivedTableRow::item(
            &format!("1.{}", idx + 1),
            &s.name,
            s.tax_inclusive.clone(),
        ));
    }
    table.push(DerivedTableRow::subtotal("2", "销项税额", total_output_tax.clone()));
    for (idx, s) in series.iter().enumerate() {
        table.push(DerivedTableRow::item(
            &format!("2.{}", idx + 1),
            &s.name,
            s.output_tax.clone(),
        ));
    }
    table.push(DerivedTableRow::total("3", "营业收入（不含税）", net_revenue.clone()));

    tracing::debug!(items = items.len(), years, "revenue table built");

    RevenueOutput {
        table,
        items: series,
        tax_inclusive,
        output_tax: total_output_tax,
        net_revenue,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revenue::items::{PriceUnit, RevenueTemplate};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ctx(operation_years: u32) -> ProjectContext {
        ProjectContext {
            construction_years: 2,
            operation_years,
            total_investment: dec!(1000),
        }
    }

    fn item(id: &str, amount: Money, vat_rate: Rate) -> RevenueItem {
        RevenueItem {
            id: id.into(),
            name: format!("产品{id}"),
            template: RevenueTemplate::DirectAmount { amount },
            price_unit: PriceUnit::WanYuan,
            vat_rate,
            escalation: None,
            apply_production_rate: true,
        }
    }

    #[test]
    fn test_aggregation_over_items() {
        let items = vec![item("a", dec!(100), dec!(0.13)), item("b", dec!(50), dec!(0.09))];
        let out = build_revenue(&ctx(2), &items, &ProductionRateSchedule::default());
        assert_eq!(out.tax_inclusive, vec![dec!(150), dec!(150)]);
        let expected_tax = (dec!(100) - dec!(100) / dec!(1.13)) + (dec!(50) - dec!(50) / dec!(1.09));
        assert!((out.output_tax[0] - expected_tax).abs() < dec!(0.000001));
        assert_eq!(out.table.row("1.2").map(|r| r.label.as_str()), Some("产品b"));
        assert!(out.table.verify_totals().is_empty());
    }

    #[test]
    fn test_ramp_up_scales_revenue() {
        let items = vec![item("a", dec!(100), dec!(0.13))];
        let out = build_revenue(&ctx(3), &items, &ProductionRateSchedule::ramp_up(3));
        assert_eq!(out.tax_inclusive, vec![dec!(50), dec!(75), dec!(100)]);
    }

    #[test]
    fn test_no_items_gives_zero_rows() {
        let out = build_revenue(&ctx(3), &[], &ProductionRateSchedule::default());
        assert_eq!(out.tax_inclusive, vec![Decimal::ZERO; 3]);
        assert_eq!(out.table.row("1").and_then(|r| r.total), Some(Decimal::ZERO));
    }
}
