pub mod items;
pub mod table;

pub use items::{PriceEscalation, PriceUnit, RevenueItem, RevenueTemplate};
pub use table::{build_revenue, RevenueItemSeries, RevenueOutput};
