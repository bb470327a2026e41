//! 增值税及附加: VAT payable after input-tax and fixed-asset credits, and the
//! surcharges levied on it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::table::{DerivedTable, DerivedTableRow, YearSpan};
use crate::types::*;

pub const VAT_TABLE_TITLE: &str = "增值税及附加估算表";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatOutput {
    pub table: DerivedTable,
    /// Fixed-asset input tax consumed each year
    pub fixed_asset_deduction: Vec<Money>,
    /// 应纳增值税
    pub vat_payable: Vec<Money>,
    /// 税金及附加
    pub surcharges: Vec<Money>,
}

impl VatOutput {
    pub fn empty() -> Self {
        VatOutput {
            table: DerivedTable::new(VAT_TABLE_TITLE, YearSpan::Operation),
            fixed_asset_deduction: Vec::new(),
            vat_payable: Vec::new(),
            surcharges: Vec::new(),
        }
    }
}

/// VAT and surcharges per operation year.
///
/// The fixed-asset input tax pool is drawn down each year by at most the VAT
/// otherwise payable, so it never turns a year's VAT negative.
pub fn build_vat(
    ctx: &ProjectContext,
    output_tax: &[Money],
    input_tax: &[Money],
    tax: &TaxConfig,
) -> VatOutput {
    let len = ctx.operation_years as usize;
    let at = |s: &[Money], i: usize| s.get(i).copied().unwrap_or(Decimal::ZERO);

    let mut remaining = tax.fixed_asset_input_tax.max(Decimal::ZERO);
    let mut deduction = Vec::with_capacity(len);
    let mut vat_payable = Vec::with_capacity(len);
    for i in 0..len {
        let before_credit = (at(output_tax, i) - at(input_tax, i)).max(Decimal::ZERO);
        let used = before_credit.min(remaining);
        remaining -= used;
        deduction.push(used);
        vat_payable.push(before_credit - used);
    }

    let surcharge = |rate: Rate| -> Vec<Money> { vat_payable.iter().map(|v| v * rate).collect() };
    let urban = surcharge(tax.urban_construction_rate);
    let education = surcharge(tax.education_surcharge_rate);
    let local_education = surcharge(tax.local_education_surcharge_rate);
    let surcharges: Vec<Money> = (0..len)
        .map(|i| urban[i] + education[i] + local_education[i])
        .collect();

    let mut table = DerivedTable::new(VAT_TABLE_TITLE, YearSpan::Operation);
    table.push(DerivedTableRow::item("1", "销项税额", (0..len).map(|i| at(output_tax, i)).collect()));
    table.push(DerivedTableRow::item("2", "进项税额", (0..len).map(|i| at(input_tax, i)).collect()));
    table.push(DerivedTableRow::item("3", "进项税额（固定资产待抵扣）", deduction.clone()));
    table.push(DerivedTableRow::subtotal("4", "应纳增值税", vat_payable.clone()));
    table.push(DerivedTableRow::subtotal("5", "税金及附加", surcharges.clone()));
    table.push(DerivedTableRow::item("5.1", "城市维护建设税", urban));
    table.push(DerivedTableRow::item("5.2", "教育费附加", education));
    table.push(DerivedTableRow::item("5.3", "地方教育附加", local_education));

    if remaining > Decimal::ZERO && len > 0 {
        tracing::debug!(%remaining, "fixed-asset input tax not fully used within the horizon");
    }

    VatOutput {
        table,
        fixed_asset_deduction: deduction,
        vat_payable,
        surcharges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx(operation_years: u32) -> ProjectContext {
        ProjectContext {
            construction_years: 1,
            operation_years,
            total_investment: dec!(100),
        }
    }

    #[test]
    fn test_vat_and_surcharges() {
        let out = build_vat(&ctx(2), &[dec!(13), dec!(13)], &[dec!(3), dec!(3)], &TaxConfig::default());
        assert_eq!(out.vat_payable, vec![dec!(10), dec!(10)]);
        assert_eq!(out.surcharges, vec![dec!(1.2), dec!(1.2)]);
        assert!(out.table.verify_totals().is_empty());
    }

    #[test]
    fn test_fixed_asset_credit_consumed_over_years() {
        let tax = TaxConfig {
            fixed_asset_input_tax: dec!(15),
            ..TaxConfig::default()
        };
        let out = build_vat(
            &ctx(3),
            &[dec!(13), dec!(13), dec!(13)],
            &[dec!(3), dec!(3), dec!(3)],
            &tax,
        );
        assert_eq!(out.fixed_asset_deduction, vec![dec!(10), dec!(5), dec!(0)]);
        assert_eq!(out.vat_payable, vec![dec!(0), dec!(5), dec!(10)]);
    }

    #[test]
    fn test_excess_input_tax_never_negative() {
        let out = build_vat(&ctx(1), &[dec!(2)], &[dec!(5)], &TaxConfig::default());
        assert_eq!(out.vat_payable, vec![Decimal::ZERO]);
        assert_eq!(out.surcharges, vec![Decimal::ZERO]);
    }
}
