//! Arbitrage core: triangle evaluation and the per-update detector.
//!
//! This module handles:
//! - Multiplicative edge testing against top-of-book quotes
//! - Sizing admitted cycles into executable plans
//! - Fanning one quote change out over every affected triangle

pub mod detector;
pub mod evaluator;
pub mod plan;

pub use detector::Detector;
pub use evaluator::TobSimulator;
pub use plan::{Plan, TriangleLeg, PLAN_VALID_MS};
