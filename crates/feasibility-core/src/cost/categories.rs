//! Year values for each cost category. Every table that needs a category's
//! figure for a year goes through these functions.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::production_rate::ProductionRateSchedule;
use crate::revenue::items::{linked_steady_state_revenue, RevenueItem};
use crate::types::*;

use super::config::*;

/// Fuels priced per tonne in yuan while consumption is in tonnes, so the
/// product has to be brought back to 万元.
const YUAN_PRICED_FUELS: [&str; 2] = ["汽油", "柴油"];

/// A category's year value split into its VAT components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSplit {
    /// Configured full-output amount, before the ramp-up
    pub base: Money,
    /// Amount actually paid in the year, tax-inclusive
    pub with_tax: Money,
    pub input_tax: Money,
    pub net_of_tax: Money,
}

impl TaxSplit {
    /// Split a tax-inclusive `base` scaled by `production_rate`.
    pub fn tax_inclusive(base: Money, production_rate: Rate, tax_rate: Percent) -> Self {
        let t = percent_to_rate(tax_rate);
        let with_tax = base * production_rate;
        let input_tax = safe_ratio(with_tax * t, Decimal::ONE + t);
        TaxSplit {
            base,
            with_tax,
            input_tax,
            net_of_tax: with_tax - input_tax,
        }
    }

    /// Amount that carries no deductible VAT (wages, land fees).
    pub fn untaxed(base: Money, production_rate: Rate) -> Self {
        let with_tax = base * production_rate;
        TaxSplit {
            base,
            with_tax,
            input_tax: Decimal::ZERO,
            net_of_tax: with_tax,
        }
    }
}

impl Add for TaxSplit {
    type Output = TaxSplit;

    fn add(self, rhs: TaxSplit) -> TaxSplit {
        TaxSplit {
            base: self.base + rhs.base,
            with_tax: self.with_tax + rhs.with_tax,
            input_tax: self.input_tax + rhs.input_tax,
            net_of_tax: self.net_of_tax + rhs.net_of_tax,
        }
    }
}

impl Sum for TaxSplit {
    fn sum<I: Iterator<Item = TaxSplit>>(iter: I) -> TaxSplit {
        iter.fold(TaxSplit::default(), Add::add)
    }
}

/// Inputs shared by the category calculators.
#[derive(Debug, Clone, Copy)]
pub struct CostDrivers<'a> {
    pub revenue_items: &'a [RevenueItem],
    pub rates: &'a ProductionRateSchedule,
    /// Base for percentage repair costs
    pub fixed_assets_investment: Money,
}

// ---------------------------------------------------------------------------
// 外购原材料费
// ---------------------------------------------------------------------------

/// Full-output amount of a raw material, `None` when its revenue link dangles.
pub fn raw_material_base(item: &RawMaterialItem, revenue_items: &[RevenueItem], year: u32) -> Option<Money> {
    match &item.source {
        MaterialSource::PercentageOfRevenue {
            linked_revenue_id,
            percentage,
        } => linked_steady_state_revenue(revenue_items, linked_revenue_id.as_deref(), year)
            .map(|revenue| revenue * percent_to_rate(*percentage)),
        MaterialSource::QuantityTimesPrice {
            quantity,
            unit_price,
        } => Some(quantity * unit_price),
        MaterialSource::DirectAmount { amount } => Some(*amount),
    }
}

pub fn raw_material_year(
    item: &RawMaterialItem,
    apply_production_rate: bool,
    drivers: &CostDrivers<'_>,
    year: u32,
) -> TaxSplit {
    let base = raw_material_base(item, drivers.revenue_items, year).unwrap_or(Decimal::ZERO);
    let rate = drivers.rates.effective_rate(apply_production_rate, year);
    TaxSplit::tax_inclusive(base, rate, item.tax_rate)
}

// ---------------------------------------------------------------------------
// 外购燃料及动力费
// ---------------------------------------------------------------------------

/// Full-output amount of a fuel or power line.
pub fn fuel_power_amount(item: &FuelPowerItem) -> Money {
    if YUAN_PRICED_FUELS.contains(&item.name.as_str()) {
        item.price * item.consumption / dec!(10000)
    } else {
        item.consumption * item.price
    }
}

pub fn fuel_power_year(
    item: &FuelPowerItem,
    apply_production_rate: bool,
    rates: &ProductionRateSchedule,
    year: u32,
) -> TaxSplit {
    let rate = rates.effective_rate(apply_production_rate, year);
    TaxSplit::tax_inclusive(fuel_power_amount(item), rate, item.tax_rate)
}

// ---------------------------------------------------------------------------
// 工资及福利费
// ---------------------------------------------------------------------------

/// Salary per head in `year` after periodic step-ups, `None` on overflow.
pub fn checked_current_salary(item: &WageLineItem, year: u32) -> Option<Money> {
    match (item.change_interval, item.change_percentage) {
        (Some(interval), Some(pct)) if interval > 0 && year > 0 => {
            let steps = (year - 1) / interval;
            let growth = (Decimal::ONE + percent_to_rate(pct)).checked_powu(steps as u64)?;
            item.salary_per_employee.checked_mul(growth)
        }
        _ => Some(item.salary_per_employee),
    }
}

/// One warning per position whose step-ups overflow within `operation_years`.
pub fn salary_overflows(wages: &[WageLineItem], operation_years: u32) -> Vec<String> {
    wages
        .iter()
        .filter_map(|item| {
            let year = (1..=operation_years).find(|&y| checked_wages(item, y).is_none())?;
            Some(format!(
                "Salary of '{}' overflows from operation year {year}; counted as zero",
                item.name
            ))
        })
        .collect()
}

fn checked_wages(item: &WageLineItem, year: u32) -> Option<Money> {
    checked_current_salary(item, year)?.checked_mul(item.employees)
}

/// (wages, welfare) for a position. Headcount does not follow the ramp-up.
pub fn wage_year(item: &WageLineItem, year: u32) -> (Money, Money) {
    let wages = checked_wages(item, year).unwrap_or(Decimal::ZERO);
    let welfare = wages * percent_to_rate(item.welfare_rate);
    (wages, welfare)
}

// ---------------------------------------------------------------------------
// 修理费
// ---------------------------------------------------------------------------

pub fn repair_base(config: &RepairConfig, fixed_assets_investment: Money) -> Money {
    match &config.basis {
        RepairBasis::PercentageOfFixedAssets { percentage } => {
            fixed_assets_investment * percent_to_rate(*percentage)
        }
        RepairBasis::DirectAmount { amount } => *amount,
    }
}

pub fn repair_year(config: &RepairConfig, drivers: &CostDrivers<'_>, year: u32) -> TaxSplit {
    let rate = drivers.rates.effective_rate(config.apply_production_rate, year);
    TaxSplit::tax_inclusive(
        repair_base(config, drivers.fixed_assets_investment),
        rate,
        config.tax_rate,
    )
}

// ---------------------------------------------------------------------------
// 其他费用
// ---------------------------------------------------------------------------

pub fn other_expenses_year(
    config: &OtherExpensesConfig,
    drivers: &CostDrivers<'_>,
    year: u32,
) -> TaxSplit {
    let rate = drivers.rates.effective_rate(config.apply_production_rate, year);
    match &config.basis {
        OtherExpenseBasis::PercentageOfRevenue { percentage } => {
            let revenue: Money = drivers
                .revenue_items
                .iter()
                .map(|i| i.steady_state_revenue(year))
                .sum();
            TaxSplit::tax_inclusive(revenue * percent_to_rate(*percentage), rate, config.tax_rate)
        }
        OtherExpenseBasis::DirectAmount { amount } => {
            TaxSplit::tax_inclusive(*amount, rate, config.tax_rate)
        }
        OtherExpenseBasis::LandTransfer {
            acreage,
            unit_price,
        } => TaxSplit::untaxed(acreage * unit_price, Decimal::ONE),
    }
}

// ---------------------------------------------------------------------------
// 管理费用
// ---------------------------------------------------------------------------

pub fn management_year(config: &ManagementConfig, rates: &ProductionRateSchedule, year: u32) -> Money {
    config.direct_amount * rates.effective_rate(config.apply_production_rate, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production_rate::ProductionRate;
    use crate::revenue::items::{PriceUnit, RevenueTemplate};

    fn half_first_year() -> ProductionRateSchedule {
        ProductionRateSchedule::new(vec![ProductionRate {
            year_index: 1,
            rate: dec!(0.5),
        }])
    }

    fn revenue(id: &str, amount: Money) -> RevenueItem {
        RevenueItem {
            id: id.into(),
            name: id.into(),
            template: RevenueTemplate::DirectAmount { amount },
            price_unit: PriceUnit::WanYuan,
            vat_rate: dec!(0.13),
            escalation: None,
            apply_production_rate: true,
        }
    }

    #[test]
    fn test_tax_identity() {
        let split = TaxSplit::tax_inclusive(dec!(50), Decimal::ONE, dec!(13));
        assert_eq!(split.with_tax, dec!(50));
        assert_eq!(split.input_tax.round_dp(2), dec!(5.75));
        assert_eq!(split.net_of_tax.round_dp(2), dec!(44.25));
        assert!((split.net_of_tax * dec!(1.13) - split.with_tax).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_tax_split_guards_minus_100_percent() {
        let split = TaxSplit::tax_inclusive(dec!(50), Decimal::ONE, dec!(-100));
        assert_eq!(split.input_tax, Decimal::ZERO);
    }

    #[test]
    fn test_raw_material_percentage_of_linked_revenue() {
        let items = vec![revenue("r1", dec!(200)), revenue("r2", dec!(100))];
        let rates = ProductionRateSchedule::default();
        let drivers = CostDrivers {
            revenue_items: &items,
            rates: &rates,
            fixed_assets_investment: Decimal::ZERO,
        };
        let linked = RawMaterialItem {
            name: "m".into(),
            source: MaterialSource::PercentageOfRevenue {
                linked_revenue_id: Some("r2".into()),
                percentage: dec!(10),
            },
            tax_rate: Decimal::ZERO,
        };
        assert_eq!(raw_material_year(&linked, true, &drivers, 1).with_tax, dec!(10));

        let total = RawMaterialItem {
            source: MaterialSource::PercentageOfRevenue {
                linked_revenue_id: None,
                percentage: dec!(10),
            },
            ..linked.clone()
        };
        assert_eq!(raw_material_year(&total, true, &drivers, 1).with_tax, dec!(30));

        let dangling = RawMaterialItem {
            source: MaterialSource::PercentageOfRevenue {
                linked_revenue_id: Some("deleted".into()),
                percentage: dec!(10),
            },
            ..linked
        };
        assert_eq!(raw_material_year(&dangling, true, &drivers, 1), TaxSplit::default());
    }

    #[test]
    fn test_fuel_special_commodities() {
        let gasoline = FuelPowerItem {
            name: "汽油".into(),
            unit: Some("吨".into()),
            price: dec!(9453),
            consumption: dec!(1000),
            tax_rate: dec!(13),
        };
        assert_eq!(fuel_power_amount(&gasoline), dec!(945.3));
        let water = FuelPowerItem {
            name: "水费".into(),
            ..gasoline
        };
        assert_eq!(fuel_power_amount(&water), dec!(9453000));
    }

    #[test]
    fn test_fuel_ramp_flag() {
        let power = FuelPowerItem {
            name: "电费".into(),
            unit: None,
            price: dec!(2),
            consumption: dec!(10),
            tax_rate: Decimal::ZERO,
        };
        let rates = half_first_year();
        assert_eq!(fuel_power_year(&power, true, &rates, 1).with_tax, dec!(10));
        assert_eq!(fuel_power_year(&power, false, &rates, 1).with_tax, dec!(20));
    }

    #[test]
    fn test_wage_step_up() {
        let item = WageLineItem {
            name: "生产工人".into(),
            employees: dec!(10),
            salary_per_employee: dec!(6),
            welfare_rate: dec!(14),
            change_interval: Some(3),
            change_percentage: Some(dec!(5)),
        };
        assert_eq!(wage_year(&item, 1), (dec!(60), dec!(8.4)));
        assert_eq!(wage_year(&item, 3).0, dec!(60));
        assert_eq!(wage_year(&item, 4).0, dec!(63));
    }

    #[test]
    fn test_wage_step_up_overflow_counts_as_zero() {
        let item = WageLineItem {
            name: "管理人员".into(),
            employees: dec!(10),
            salary_per_employee: dec!(10),
            welfare_rate: Decimal::ZERO,
            change_interval: Some(1),
            change_percentage: Some(dec!(900)),
        };
        // 10^28 per head fits, ten heads of it do not
        assert_eq!(checked_current_salary(&item, 28), Some(dec!(10).powu(28)));
        assert_eq!(wage_year(&item, 28), (Decimal::ZERO, Decimal::ZERO));
        assert_eq!(wage_year(&item, 2).0, dec!(1000));
        let warnings = salary_overflows(std::slice::from_ref(&item), 30);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("year 28"), "{warnings:?}");
        assert!(salary_overflows(&[item], 20).is_empty());
    }

    #[test]
    fn test_repair_percentage_of_fixed_assets() {
        let rates = half_first_year();
        let drivers = CostDrivers {
            revenue_items: &[],
            rates: &rates,
            fixed_assets_investment: dec!(2000),
        };
        let config = RepairConfig {
            basis: RepairBasis::PercentageOfFixedAssets {
                percentage: dec!(2),
            },
            tax_rate: Decimal::ZERO,
            apply_production_rate: false,
        };
        assert_eq!(repair_year(&config, &drivers, 1).with_tax, dec!(40));
    }

    #[test]
    fn test_land_transfer_ignores_ramp_and_tax() {
        let rates = half_first_year();
        let drivers = CostDrivers {
            revenue_items: &[],
            rates: &rates,
            fixed_assets_investment: Decimal::ZERO,
        };
        let config = OtherExpensesConfig {
            basis: OtherExpenseBasis::LandTransfer {
                acreage: dec!(30),
                unit_price: dec!(0.1),
            },
            tax_rate: dec!(9),
            apply_production_rate: true,
        };
        let split = other_expenses_year(&config, &drivers, 1);
        assert_eq!(split.with_tax, dec!(3));
        assert_eq!(split.input_tax, Decimal::ZERO);
    }

    #[test]
    fn test_management_ramp() {
        let config = ManagementConfig {
            direct_amount: dec!(12),
            apply_production_rate: true,
        };
        assert_eq!(management_year(&config, &half_first_year(), 1), dec!(6));
    }
}
