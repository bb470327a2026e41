use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FeasibilityError;
use crate::FeasibilityResult;

/// Monetary amounts, in 万元 (ten-thousand yuan) unless stated otherwise.
pub type Money = Decimal;

/// Rates expressed as decimals (0.13 = 13%).
pub type Rate = Decimal;

/// Rates entered as percentage points (13 = 13%). Convert with [`percent_to_rate`].
pub type Percent = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Longest horizon (construction + operation) any calculator will build.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Per-project constants shared by every calculator in a pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    pub construction_years: u32,
    pub operation_years: u32,
    /// Total project investment (construction investment plus construction interest)
    pub total_investment: Money,
}

impl ProjectContext {
    /// Construction plus operation years.
    pub fn calculation_years(&self) -> u32 {
        self.construction_years.saturating_add(self.operation_years)
    }

    /// Reject horizons that no feasibility study could mean.
    pub fn validate(&self) -> FeasibilityResult<()> {
        if self.calculation_years() > MAX_HORIZON_YEARS {
            return Err(FeasibilityError::InvalidInput {
                field: "context".into(),
                reason: format!(
                    "Construction plus operation years must not exceed {MAX_HORIZON_YEARS}"
                ),
            });
        }
        Ok(())
    }
}

/// Tax parameters shared by the VAT, profit and cash-flow calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Corporate income tax (所得税)
    #[serde(default = "default_income_tax_rate")]
    pub income_tax_rate: Rate,
    /// 法定盈余公积金, in percentage points
    #[serde(default = "default_statutory_surplus")]
    pub statutory_surplus_rate: Percent,
    /// 城市维护建设税, levied on VAT payable
    #[serde(default = "default_urban_construction_rate")]
    pub urban_construction_rate: Rate,
    /// 教育费附加
    #[serde(default = "default_education_rate")]
    pub education_surcharge_rate: Rate,
    /// 地方教育附加
    #[serde(default = "default_local_education_rate")]
    pub local_education_surcharge_rate: Rate,
    /// Input VAT on fixed assets, deducted from VAT payable until used up
    #[serde(default)]
    pub fixed_asset_input_tax: Money,
}

fn default_income_tax_rate() -> Rate {
    dec!(0.25)
}

fn default_statutory_surplus() -> Percent {
    dec!(10)
}

fn default_urban_construction_rate() -> Rate {
    dec!(0.07)
}

fn default_education_rate() -> Rate {
    dec!(0.03)
}

fn default_local_education_rate() -> Rate {
    dec!(0.02)
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            income_tax_rate: default_income_tax_rate(),
            statutory_surplus_rate: default_statutory_surplus(),
            urban_construction_rate: default_urban_construction_rate(),
            education_surcharge_rate: default_education_rate(),
            local_education_surcharge_rate: default_local_education_rate(),
            fixed_asset_input_tax: Decimal::ZERO,
        }
    }
}

impl TaxConfig {
    /// Combined surcharge rate applied to VAT payable.
    pub fn surcharge_rate(&self) -> Rate {
        self.urban_construction_rate
            + self.education_surcharge_rate
            + self.local_education_surcharge_rate
    }
}

/// Convert percentage points into a decimal rate.
pub fn percent_to_rate(percent: Percent) -> Rate {
    percent / dec!(100)
}

/// Ratio that degrades to zero instead of dividing by zero.
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
    pub generated_at: DateTime<Utc>,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for warning in &warnings {
        tracing::warn!(methodology, "{warning}");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
            generated_at: Utc::now(),
        },
    }
}
