//! Finder configuration: YAML document plus environment overrides.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::market::{Fee, Market};

/// Finder configuration loaded from a YAML document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Quote currencies used to split symbols into base/quote. Sorted by
    /// descending length at load so the longest suffix matches first.
    #[serde(default)]
    pub quote_assets: Vec<String>,

    /// Fee schedule.
    #[serde(default)]
    pub fees: Fees,

    /// Strategy parameters.
    #[serde(default)]
    pub strategy: Strategy,

    /// Logging options.
    #[serde(default)]
    pub log: LogConfig,
}

/// Default fee rates plus per-exchange, per-quote overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fees {
    /// Rates applied when no override matches.
    #[serde(default)]
    pub default: FeeRates,

    /// Overrides keyed by exchange then quote currency, case-insensitive.
    #[serde(default)]
    pub exchanges: HashMap<String, HashMap<String, FeeRates>>,
}

/// Taker/maker rates in basis points.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeeRates {
    /// Taker rate in basis points.
    #[serde(default)]
    pub taker: f64,
    /// Maker rate in basis points.
    #[serde(default)]
    pub maker: f64,
}

/// Strategy parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Strategy {
    /// Multiplicative round-trip factor a cycle must strictly exceed
    /// (factor convention: break-even is `1.0`, a typical live value is
    /// slightly above, e.g. `1.0002`).
    #[serde(default = "default_min_profit_edge")]
    pub min_profit_edge: f64,

    /// Slippage allowance in basis points applied to every limit price.
    #[serde(default)]
    pub slippage_bp: f64,

    /// Default notional per evaluation, in the starting quote currency.
    #[serde(default = "default_trade_amount")]
    pub trade_amount: f64,

    /// Per-quote notional overrides, chosen by symbol suffix.
    #[serde(default)]
    pub trade_amounts: HashMap<String, f64>,

    /// Depth cap for stored books; 0 means unbounded.
    #[serde(default)]
    pub orderbook_depth: usize,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            min_profit_edge: default_min_profit_edge(),
            slippage_bp: 0.0,
            trade_amount: default_trade_amount(),
            trade_amounts: HashMap::new(),
            orderbook_depth: 0,
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log verbosity (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_min_profit_edge() -> f64 {
    1.0
}

fn default_trade_amount() -> f64 {
    100.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and normalize a configuration document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Parse a YAML string; used by tests and embedded defaults.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = serde_yaml::from_str(data)?;
        cfg.normalize();
        Ok(cfg)
    }

    fn normalize(&mut self) {
        for q in &mut self.quote_assets {
            *q = q.to_uppercase();
        }
        // Longest suffix first, so USDT wins over USD.
        self.quote_assets.sort_by(|a, b| b.len().cmp(&a.len()));

        let exchanges = std::mem::take(&mut self.fees.exchanges);
        self.fees.exchanges = exchanges
            .into_iter()
            .map(|(exchange, quotes)| {
                let quotes = quotes
                    .into_iter()
                    .map(|(quote, rates)| (quote.to_uppercase(), rates))
                    .collect();
                (exchange.to_uppercase(), quotes)
            })
            .collect();

        let amounts = std::mem::take(&mut self.strategy.trade_amounts);
        self.strategy.trade_amounts = amounts
            .into_iter()
            .map(|(quote, amount)| (quote.to_uppercase(), amount))
            .collect();
    }

    /// Build a market from an exchange and venue symbol by splitting the
    /// symbol on the longest matching quote-asset suffix.
    pub fn parse_market(&self, exchange: &str, symbol: &str) -> Result<Market, ConfigError> {
        let (base, quote) = self.parse_symbol(symbol)?;
        Ok(Market::new(exchange, symbol, &base, &quote))
    }

    fn parse_symbol(&self, symbol: &str) -> Result<(String, String), ConfigError> {
        let upper = symbol.to_uppercase();
        for quote in &self.quote_assets {
            if let Some(base) = upper.strip_suffix(quote.as_str()) {
                if base.is_empty() {
                    continue;
                }
                return Ok((base.to_string(), quote.clone()));
            }
        }
        Err(ConfigError::UnknownQuoteAsset(symbol.to_string()))
    }

    /// Fee rates for an exchange and quote currency: the override when one
    /// exists, the default otherwise. Case-insensitive on both keys.
    pub fn fee(&self, exchange: &str, quote: &str) -> Fee {
        let rates = self
            .fees
            .exchanges
            .get(&exchange.to_uppercase())
            .and_then(|quotes| quotes.get(&quote.to_uppercase()))
            .copied()
            .unwrap_or(self.fees.default);
        Fee {
            taker_bp: rates.taker,
            maker_bp: rates.maker,
        }
    }

    /// Evaluation notional for a symbol: the per-quote override whose quote
    /// suffix matches (longest suffix first, deterministically), else the
    /// default trade amount.
    pub fn trade_amount_for(&self, symbol: &str) -> f64 {
        let upper = symbol.to_uppercase();
        let mut overrides: Vec<(&String, &f64)> = self.strategy.trade_amounts.iter().collect();
        overrides.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        for (quote, amount) in overrides {
            if upper.ends_with(quote.as_str()) {
                return *amount;
            }
        }
        self.strategy.trade_amount
    }
}

/// Environment overrides, deserialized from process environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Ingress listen endpoint; a bare `:port` binds all interfaces.
    #[serde(default = "default_ingress_addr")]
    pub ingress_addr: String,

    /// Executor endpoint; enables the RPC publisher when set.
    #[serde(default)]
    pub executor_addr: Option<String>,
}

fn default_ingress_addr() -> String {
    ":50051".to_string()
}

impl EnvConfig {
    /// Read `INGRESS_ADDR` and `EXECUTOR_ADDR` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env::<EnvConfig>()?)
    }

    /// Normalized listen address for the ingress socket.
    pub fn listen_addr(&self) -> Result<String, ConfigError> {
        let addr = if self.ingress_addr.starts_with(':') {
            format!("0.0.0.0{}", self.ingress_addr)
        } else {
            self.ingress_addr.clone()
        };
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(addr),
            _ => Err(ConfigError::InvalidListenAddr(self.ingress_addr.clone())),
        }
    }

    /// Validated executor address, `None` when unset or empty.
    pub fn executor_addr(&self) -> Result<Option<String>, ConfigError> {
        let Some(addr) = self.executor_addr.as_deref().filter(|a| !a.is_empty()) else {
            return Ok(None);
        };
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Some(addr.to_string()))
            }
            _ => Err(ConfigError::InvalidExecutorAddr(addr.to_string())),
        }
    }
}
