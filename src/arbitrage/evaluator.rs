//! Top-of-book triangle evaluation: multiplicative edge test and leg sizing.

use crate::graph::Triangle;
use crate::market::{Fee, Market, Side};
use crate::orderbook::TopOfBook;

use super::plan::{Plan, TriangleLeg, PLAN_VALID_MS};

/// Evaluates triangles against current top-of-book quotes.
///
/// `min_edge` follows the factor convention: the multiplicative round-trip
/// rate must strictly exceed it, so a break-even configuration is `1.0` and a
/// typical live setting sits slightly above (e.g. `1.0002`). `slippage_bp`
/// widens every limit price against the taker.
#[derive(Debug, Clone, Copy)]
pub struct TobSimulator {
    min_edge: f64,
    slippage_bp: f64,
}

impl TobSimulator {
    /// Create a simulator with the given edge floor and slippage allowance.
    pub fn new(min_edge: f64, slippage_bp: f64) -> Self {
        Self {
            min_edge,
            slippage_bp,
        }
    }

    /// Slippage allowance in basis points.
    pub fn slippage_bp(&self) -> f64 {
        self.slippage_bp
    }

    /// Evaluate one triangle and size it into a plan worth `target_quote`
    /// of the starting quote currency.
    ///
    /// Returns `None` when any leg's quote is missing or non-positive, the
    /// round-trip rate does not clear `min_edge`, or the sized profit is not
    /// finite and strictly positive. All arithmetic is IEEE-754 double;
    /// lot/tick rounding is the executor's concern.
    pub fn evaluate_tob(
        &self,
        triangle: &Triangle,
        markets: &[Market],
        tob_by_symbol: impl Fn(&str) -> Option<TopOfBook>,
        fee_by_symbol: impl Fn(&str) -> Option<Fee>,
        target_quote: f64,
    ) -> Option<Plan> {
        let mut tobs = [TopOfBook::default(); 3];
        let mut fees = [Fee::default(); 3];
        for (i, &mid) in triangle.market_ids.iter().enumerate() {
            let market = markets.get(mid)?;
            let symbol = market.symbol.to_uppercase();
            let tob = tob_by_symbol(&symbol)?;
            if tob.bid_px <= 0.0 || tob.ask_px <= 0.0 {
                return None;
            }
            tobs[i] = tob;
            // A symbol without a configured fee trades free.
            fees[i] = fee_by_symbol(&symbol).unwrap_or_default();
        }

        let slip = self.slippage_bp / 10_000.0;
        let mut rate = 1.0_f64;
        for i in 0..3 {
            let fee_mul = 1.0 - fees[i].taker_bp / 10_000.0;
            if triangle.dirs[i] > 0 {
                let px = tobs[i].ask_px * (1.0 + slip);
                rate *= (1.0 / px) * fee_mul;
            } else {
                let px = tobs[i].bid_px * (1.0 - slip);
                rate *= px * fee_mul;
            }
        }
        // Written so a NaN rate fails the test rather than passing it.
        if !(rate > self.min_edge) {
            return None;
        }

        let mut legs = Vec::with_capacity(3);
        let mut value = target_quote;
        for i in 0..3 {
            let market = &markets[triangle.market_ids[i]];
            if triangle.dirs[i] > 0 {
                let px = tobs[i].ask_px * (1.0 + slip);
                let qty = value / px;
                legs.push(TriangleLeg {
                    market: market.symbol.clone(),
                    side: Side::Buy,
                    qty,
                    limit_price: px,
                });
                value = qty;
            } else {
                let px = tobs[i].bid_px * (1.0 - slip);
                let qty = value;
                legs.push(TriangleLeg {
                    market: market.symbol.clone(),
                    side: Side::Sell,
                    qty,
                    limit_price: px,
                });
                value = qty * px;
            }
        }

        let expected_profit = value - target_quote;
        if !expected_profit.is_finite() || expected_profit <= 0.0 {
            return None;
        }

        let first = &markets[triangle.market_ids[0]];
        let legs: [TriangleLeg; 3] = legs.try_into().ok()?;
        Some(Plan {
            exchange: first.exchange.clone(),
            legs,
            expected_profit_quote: expected_profit,
            quote_currency: first.quote.clone(),
            valid_ms: PLAN_VALID_MS,
            max_slippage_bp: self.slippage_bp,
            plan_id: String::new(),
        })
    }
}
