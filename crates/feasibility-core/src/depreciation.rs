//! Depreciation and amortization figures, supplied precomputed by the
//! investment-estimate side of the report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Asset class of a depreciation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCategory {
    /// Buildings and structures (A)
    #[serde(alias = "A")]
    Buildings,
    /// Machinery and equipment (D)
    #[serde(alias = "D")]
    Machinery,
    /// Intangible assets and land use rights (E), amortized
    #[serde(alias = "E")]
    Intangible,
    /// Anything else carried in the schedule; not depreciated through the cost table
    Other,
}

impl AssetCategory {
    pub fn is_depreciable(self) -> bool {
        matches!(self, AssetCategory::Buildings | AssetCategory::Machinery)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationRow {
    pub category: AssetCategory,
    pub original_value: Money,
    /// One value per operation year
    #[serde(default)]
    pub annual_series: Vec<Money>,
}

fn series_for(
    rows: &[DepreciationRow],
    operation_years: usize,
    pick: impl Fn(AssetCategory) -> bool,
) -> Vec<Money> {
    (0..operation_years)
        .map(|i| {
            rows.iter()
                .filter(|r| pick(r.category))
                .map(|r| r.annual_series.get(i).copied().unwrap_or(Decimal::ZERO))
                .sum()
        })
        .collect()
}

/// 折旧费: buildings plus machinery.
pub fn depreciation_series(rows: &[DepreciationRow], operation_years: usize) -> Vec<Money> {
    series_for(rows, operation_years, AssetCategory::is_depreciable)
}

/// 摊销费: intangible assets.
pub fn amortization_series(rows: &[DepreciationRow], operation_years: usize) -> Vec<Money> {
    series_for(rows, operation_years, |c| c == AssetCategory::Intangible)
}

/// Net book value left at the end of operation, recovered in the final year.
pub fn residual_value(rows: &[DepreciationRow], operation_years: usize) -> Money {
    rows.iter()
        .filter(|r| r.category != AssetCategory::Other)
        .map(|r| {
            let written_off: Money = r.annual_series.iter().take(operation_years).copied().sum();
            (r.original_value - written_off).max(Decimal::ZERO)
        })
        .sum()
}

/// Base for percentage repair costs: depreciable original value net of
/// capitalised construction interest.
pub fn fixed_assets_investment(rows: &[DepreciationRow], construction_interest: Money) -> Money {
    let original: Money = rows
        .iter()
        .filter(|r| r.category.is_depreciable())
        .map(|r| r.original_value)
        .sum();
    (original - construction_interest).max(Decimal::ZERO)
}
