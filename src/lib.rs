//! Online triangular-arbitrage finder for spot crypto markets.
//!
//! The finder ingests a stream of order-book deltas, incrementally discovers
//! the triangular cycles each newly seen market completes, and re-evaluates
//! every affected cycle on each quote change. Cycles that clear fees and
//! slippage are sized into executable three-leg plans and handed to the
//! publisher port.
//!
//! # Modules
//!
//! - [`config`]: YAML configuration and environment overrides
//! - [`error`]: unified error types
//! - [`market`]: market metadata and the process-wide registry
//! - [`graph`]: incremental market graph and triangle enumeration
//! - [`orderbook`]: top-of-book and depth-book stores
//! - [`arbitrage`]: triangle evaluation and the per-update detector
//! - [`publish`]: publisher port and the executor link
//! - [`ingest`]: wire protocol and the framed delta server
//! - [`api`]: HTTP health/status endpoints

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod publish;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
