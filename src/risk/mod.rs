pub mod manager;

pub use manager::{Breaker, RiskManager};
