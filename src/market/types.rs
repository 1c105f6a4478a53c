//! Market and fee types shared across the finder.

use strum::{Display, EnumString};

/// Order side of a single plan leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Side {
    /// Acquire base with quote.
    #[strum(serialize = "BUY")]
    Buy,
    /// Sell base for quote.
    #[strum(serialize = "SELL")]
    Sell,
}

/// One spot market: an ordered `base/quote` currency pair on one exchange.
///
/// Created by the ingress on first sighting and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Market {
    /// Exchange the market trades on.
    pub exchange: String,
    /// Venue symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Base currency code.
    pub base: String,
    /// Quote currency code.
    pub quote: String,
    /// Contract multiplier; zero for plain spot.
    pub multiplier: i64,
    /// Minimum order quantity, zero when the venue did not report it.
    pub min_qty: f64,
    /// Quantity step, zero when unreported.
    pub step_size: f64,
    /// Minimum order notional, zero when unreported.
    pub min_notional: f64,
    /// Price tick, zero when unreported.
    pub price_tick: f64,
}

impl Market {
    /// Create a market with the identifying fields set and no lot metadata.
    pub fn new(exchange: &str, symbol: &str, base: &str, quote: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            ..Default::default()
        }
    }

    /// Uppercase `EXCHANGE:SYMBOL` index key.
    pub fn key(&self) -> String {
        market_key(&self.exchange, &self.symbol)
    }

    /// Uppercase `BASE/QUOTE` pair key used by the per-exchange pair map.
    pub fn pair(&self) -> String {
        format!(
            "{}/{}",
            self.base.to_uppercase(),
            self.quote.to_uppercase()
        )
    }
}

/// Build the uppercase `EXCHANGE:SYMBOL` key used by every market lookup.
///
/// Mixed-case ingress inputs must not create duplicate markets, so every
/// index normalizes through this one function.
pub fn market_key(exchange: &str, symbol: &str) -> String {
    format!("{}:{}", exchange.to_uppercase(), symbol.to_uppercase())
}

/// Per-symbol fee schedule in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fee {
    /// Taker fee in basis points.
    pub taker_bp: f64,
    /// Maker fee in basis points.
    pub maker_bp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn side_display_and_parse() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
        assert_eq!(Side::from_str("BUY").unwrap(), Side::Buy);
        assert_eq!(Side::from_str("SELL").unwrap(), Side::Sell);
    }

    #[test]
    fn market_key_uppercases() {
        assert_eq!(market_key("binance", "btcusdt"), "BINANCE:BTCUSDT");
        let m = Market::new("Binance", "EthBtc", "eth", "btc");
        assert_eq!(m.key(), "BINANCE:ETHBTC");
        assert_eq!(m.pair(), "ETH/BTC");
    }
}
