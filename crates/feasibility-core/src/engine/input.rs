use serde::{Deserialize, Serialize};

use crate::cash_flow::{BenchmarkRates, CashFlowConfig};
use crate::cost::CostConfig;
use crate::depreciation::DepreciationRow;
use crate::loan::LoanConfig;
use crate::production_rate::ProductionRateSchedule;
use crate::revenue::RevenueItem;
use crate::types::*;

/// One project's complete set of editable inputs. Every table is derived
/// from this document in a single pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeasibilityInput {
    /// Without a context every table comes back empty
    #[serde(default)]
    pub context: Option<ProjectContext>,
    #[serde(default)]
    pub revenue_items: Vec<RevenueItem>,
    #[serde(default)]
    pub production_rates: ProductionRateSchedule,
    #[serde(default)]
    pub cost_config: CostConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanConfig>,
    /// Precomputed depreciation and amortization schedule
    #[serde(default)]
    pub depreciation: Vec<DepreciationRow>,
    /// 建设期利息, from the investment estimate
    #[serde(default)]
    pub construction_interest: Money,
    #[serde(default)]
    pub tax_config: TaxConfig,
    /// 补贴收入 per operation year
    #[serde(default)]
    pub subsidy_income: Money,
    #[serde(default)]
    pub cash_flow: CashFlowConfig,
    #[serde(default)]
    pub benchmark_rates: BenchmarkRates,
}
