pub mod distribution;

pub use distribution::{build_profit, ProfitOutput, ProfitSources};
