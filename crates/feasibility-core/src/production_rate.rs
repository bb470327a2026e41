//! 达产率: the ramp-up multiplier applied to steady-state revenue and cost
//! in the early operation years.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Rate for one operation year (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRate {
    pub year_index: u32,
    pub rate: Rate,
}

/// Lookup table of production rates; years without an entry run at 100%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductionRateSchedule {
    pub rates: Vec<ProductionRate>,
}

impl ProductionRateSchedule {
    pub fn new(rates: Vec<ProductionRate>) -> Self {
        ProductionRateSchedule { rates }
    }

    /// The conventional curve: 50% in year 1, 75% in year 2, full output afterwards.
    pub fn ramp_up(operation_years: u32) -> Self {
        let rates = (1..=operation_years)
            .map(|year_index| ProductionRate {
                year_index,
                rate: match year_index {
                    1 => dec!(0.5),
                    2 => dec!(0.75),
                    _ => Decimal::ONE,
                },
            })
            .collect();
        ProductionRateSchedule { rates }
    }

    /// Rate for `year` (1-based). The first matching entry wins.
    pub fn rate(&self, year: u32) -> Rate {
        self.rates
            .iter()
            .find(|r| r.year_index == year)
            .map(|r| r.rate)
            .unwrap_or(Decimal::ONE)
    }

    /// Rate for a category that may opt out of the ramp-up.
    pub fn effective_rate(&self, apply: bool, year: u32) -> Rate {
        if apply {
            self.rate(year)
        } else {
            Decimal::ONE
        }
    }

    pub fn series(&self, operation_years: u32) -> Vec<Rate> {
        (1..=operation_years).map(|y| self.rate(y)).collect()
    }
}
