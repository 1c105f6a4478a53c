//! Executable plan emitted for one arbitrage attempt.

use crate::market::Side;

/// How long an emitted plan stays executable, in milliseconds.
pub const PLAN_VALID_MS: u64 = 250;

/// One leg of a triangular plan: a sized, priced limit order.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleLeg {
    /// Venue symbol to trade.
    pub market: String,
    /// Buy or sell.
    pub side: Side,
    /// Quantity in base units.
    pub qty: f64,
    /// Limit price, slippage already applied.
    pub limit_price: f64,
}

/// Sized, priced set of three orders representing one arbitrage attempt.
///
/// Never mutated after emission. `plan_id` is emitted empty; the downstream
/// executor assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Exchange all three legs execute on.
    pub exchange: String,
    /// The three legs in execution order.
    pub legs: [TriangleLeg; 3],
    /// Expected profit denominated in `quote_currency`.
    pub expected_profit_quote: f64,
    /// Currency the cycle starts and closes in.
    pub quote_currency: String,
    /// Validity window in milliseconds.
    pub valid_ms: u64,
    /// Slippage allowance baked into the limit prices, in basis points.
    pub max_slippage_bp: f64,
    /// Identifier assigned downstream; empty on emission.
    pub plan_id: String,
}
