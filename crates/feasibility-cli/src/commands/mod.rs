pub mod production;
pub mod projection;
