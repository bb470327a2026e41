pub mod categories;
pub mod config;
pub mod tables;

pub use categories::TaxSplit;
pub use config::{
    CostCategory, CostConfig, FuelPowerItem, ManagementConfig, MaterialSource,
    OtherExpenseBasis, OtherExpensesConfig, RawMaterialItem, RepairBasis, RepairConfig,
    WageLineItem,
};
pub use tables::{build_costs, CostOutput};
