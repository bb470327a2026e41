use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::production_rate::ProductionRateSchedule;
use crate::types::*;

/// How a revenue item's steady-state annual amount is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RevenueTemplate {
    QuantityPrice {
        quantity: Decimal,
        unit_price: Money,
    },
    AreaYieldPrice {
        area: Decimal,
        yield_per_area: Decimal,
        unit_price: Money,
    },
    CapacityUtilization {
        capacity: Decimal,
        utilization_rate: Rate,
        unit_price: Money,
    },
    Subscription {
        subscriptions: Decimal,
        unit_price: Money,
    },
    DirectAmount {
        amount: Money,
    },
}

impl RevenueTemplate {
    /// Annual amount in the price's own unit, before escalation and ramp-up.
    pub fn base_amount(&self) -> Money {
        match self {
            RevenueTemplate::QuantityPrice {
                quantity,
                unit_price,
            } => quantity * unit_price,
            RevenueTemplate::AreaYieldPrice {
                area,
                yield_per_area,
                unit_price,
            } => area * yield_per_area * unit_price,
            RevenueTemplate::CapacityUtilization {
                capacity,
                utilization_rate,
                unit_price,
            } => capacity * utilization_rate * unit_price,
            RevenueTemplate::Subscription {
                subscriptions,
                unit_price,
            } => subscriptions * unit_price,
            RevenueTemplate::DirectAmount { amount } => *amount,
        }
    }
}

/// Unit of the configured price. Tables are always in 万元.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceUnit {
    #[default]
    WanYuan,
    Yuan,
}

impl PriceUnit {
    pub fn to_wan_yuan(self, amount: Money) -> Money {
        match self {
            PriceUnit::WanYuan => amount,
            PriceUnit::Yuan => amount / dec!(10000),
        }
    }
}

/// Step-wise price increase: `rate` percent every `interval_years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEscalation {
    pub rate: Percent,
    pub interval_years: u32,
}

impl PriceEscalation {
    /// `(1 + rate/100)^floor((year-1)/interval)`; a zero interval never escalates.
    /// `None` once the factor leaves the `Decimal` range.
    pub fn factor(&self, year: u32) -> Option<Decimal> {
        if self.interval_years == 0 || year == 0 {
            return Some(Decimal::ONE);
        }
        let steps = (year - 1) / self.interval_years;
        (Decimal::ONE + percent_to_rate(self.rate)).checked_powu(steps as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueItem {
    pub id: String,
    pub name: String,
    pub template: RevenueTemplate,
    #[serde(default)]
    pub price_unit: PriceUnit,
    /// Output VAT rate as a decimal (0.13 = 13%)
    pub vat_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<PriceEscalation>,
    #[serde(default = "default_true")]
    pub apply_production_rate: bool,
}

fn default_true() -> bool {
    true
}

impl RevenueItem {
    /// Full-output revenue for an operation year, tax-inclusive, escalated but not ramped.
    /// `None` when the escalated amount overflows.
    pub fn checked_steady_state_revenue(&self, year: u32) -> Option<Money> {
        let escalation = match &self.escalation {
            Some(e) => e.factor(year)?,
            None => Decimal::ONE,
        };
        self.price_unit
            .to_wan_yuan(self.template.base_amount())
            .checked_mul(escalation)
    }

    /// As [`Self::checked_steady_state_revenue`], counting an overflowed year as zero.
    pub fn steady_state_revenue(&self, year: u32) -> Money {
        self.checked_steady_state_revenue(year).unwrap_or(Decimal::ZERO)
    }

    /// Tax-inclusive revenue for an operation year after the ramp-up.
    pub fn tax_inclusive_revenue(&self, year: u32, rates: &ProductionRateSchedule) -> Money {
        self.steady_state_revenue(year) * rates.effective_rate(self.apply_production_rate, year)
    }
}

/// One warning per item whose escalation overflows within `operation_years`.
pub fn escalation_overflows(items: &[RevenueItem], operation_years: u32) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| {
            let year = (1..=operation_years)
                .find(|&y| item.checked_steady_state_revenue(y).is_none())?;
            Some(format!(
                "Revenue item '{}' escalation overflows from operation year {year}; counted as zero",
                item.name
            ))
        })
        .collect()
}

/// Output VAT contained in a tax-inclusive amount.
pub fn output_tax(tax_inclusive: Money, vat_rate: Rate) -> Money {
    let divisor = Decimal::ONE + vat_rate;
    if divisor.is_zero() {
        return Decimal::ZERO;
    }
    tax_inclusive - tax_inclusive / divisor
}

/// Steady-state revenue by link: `None` or `"total"` means every item.
/// Returns `None` when the link names an item that no longer exists.
pub fn linked_steady_state_revenue(
    items: &[RevenueItem],
    linked_revenue_id: Option<&str>,
    year: u32,
) -> Option<Money> {
    match linked_revenue_id {
        None | Some("total") => Some(items.iter().map(|i| i.steady_state_revenue(year)).sum()),
        Some(id) => items
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.steady_state_revenue(year)),
    }
}
