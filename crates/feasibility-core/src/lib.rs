pub mod depreciation;
pub mod error;
pub mod production_rate;
pub mod table;
pub mod time_value;
pub mod types;

#[cfg(feature = "revenue")]
pub mod revenue;

#[cfg(feature = "cost")]
pub mod cost;

#[cfg(feature = "cost")]
pub mod vat;

#[cfg(feature = "loan")]
pub mod loan;

#[cfg(feature = "profit")]
pub mod profit;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

#[cfg(feature = "indicators")]
pub mod indicators;

#[cfg(feature = "engine")]
pub mod engine;

pub use error::FeasibilityError;
pub use types::*;

/// Standard result type for all feasibility operations
pub type FeasibilityResult<T> = Result<T, FeasibilityError>;
