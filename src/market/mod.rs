//! Market metadata: types, keys, and the process-wide registry.

pub mod registry;
pub mod types;

pub use registry::MarketRegistry;
pub use types::{market_key, Fee, Market, Side};
