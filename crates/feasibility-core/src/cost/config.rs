use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

fn default_true() -> bool {
    true
}

fn default_goods_tax_rate() -> Percent {
    dec!(13)
}

/// Where a raw material's annual amount comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialSource {
    /// Share of one revenue item, or of total revenue when `linked_revenue_id`
    /// is absent or `"total"`
    PercentageOfRevenue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        linked_revenue_id: Option<String>,
        percentage: Percent,
    },
    QuantityTimesPrice {
        quantity: Decimal,
        unit_price: Money,
    },
    DirectAmount {
        amount: Money,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialItem {
    pub name: String,
    pub source: MaterialSource,
    /// Input VAT rate in percentage points
    #[serde(default = "default_goods_tax_rate")]
    pub tax_rate: Percent,
}

/// A purchased fuel or power line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPowerItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub price: Money,
    pub consumption: Decimal,
    #[serde(default = "default_goods_tax_rate")]
    pub tax_rate: Percent,
}

/// One staffing position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WageLineItem {
    pub name: String,
    pub employees: Decimal,
    /// Annual salary per head, 万元
    pub salary_per_employee: Money,
    /// 福利费, percentage of salary
    #[serde(default)]
    pub welfare_rate: Percent,
    /// Years between salary step-ups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_interval: Option<u32>,
    /// Size of each step-up, percentage points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percentage: Option<Percent>,
}

/// A cost category made of line items sharing one ramp-up switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCategory<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default = "default_true")]
    pub apply_production_rate: bool,
}

impl<T> Default for CostCategory<T> {
    fn default() -> Self {
        CostCategory {
            items: Vec::new(),
            apply_production_rate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RepairBasis {
    /// Percentage of the fixed-assets investment
    PercentageOfFixedAssets { percentage: Percent },
    DirectAmount { amount: Money },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    pub basis: RepairBasis,
    #[serde(default)]
    pub tax_rate: Percent,
    #[serde(default)]
    pub apply_production_rate: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        RepairConfig {
            basis: RepairBasis::DirectAmount {
                amount: Decimal::ZERO,
            },
            tax_rate: Decimal::ZERO,
            apply_production_rate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OtherExpenseBasis {
    /// Percentage of total steady-state revenue
    PercentageOfRevenue { percentage: Percent },
    DirectAmount { amount: Money },
    /// Annual land-transfer fee: acreage × unit price, never ramped or taxed
    LandTransfer { acreage: Decimal, unit_price: Money },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherExpensesConfig {
    pub basis: OtherExpenseBasis,
    #[serde(default)]
    pub tax_rate: Percent,
    #[serde(default = "default_true")]
    pub apply_production_rate: bool,
}

impl Default for OtherExpensesConfig {
    fn default() -> Self {
        OtherExpensesConfig {
            basis: OtherExpenseBasis::DirectAmount {
                amount: Decimal::ZERO,
            },
            tax_rate: Decimal::ZERO,
            apply_production_rate: true,
        }
    }
}

/// 管理费用
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementConfig {
    #[serde(default)]
    pub direct_amount: Money,
    #[serde(default)]
    pub apply_production_rate: bool,
}

/// Everything the cost tables are derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default)]
    pub raw_materials: CostCategory<RawMaterialItem>,
    #[serde(default)]
    pub fuel_power: CostCategory<FuelPowerItem>,
    #[serde(default)]
    pub wages: Vec<WageLineItem>,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub other_expenses: OtherExpensesConfig,
    #[serde(default)]
    pub management: ManagementConfig,
}
