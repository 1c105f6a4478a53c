//! Unified error types for the arbitrage finder.

use thiserror::Error;

/// Unified error type for the finder.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wire protocol error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Plan publishing error.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and environment errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed to load.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse the config document.
    #[error("failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Symbol could not be split into base/quote.
    #[error("could not determine base/quote for symbol {0:?}")]
    UnknownQuoteAsset(String),

    /// Ingress listen address is malformed.
    #[error("invalid listen address {0:?}")]
    InvalidListenAddr(String),

    /// Executor address is not host:port.
    #[error("invalid executor address {0:?}: must be host:port")]
    InvalidExecutorAddr(String),

    /// Environment variable deserialization failed.
    #[error("environment error: {0}")]
    Env(#[from] envy::Error),
}

/// Framed wire protocol errors.
#[derive(Error, Debug)]
pub enum WireError {
    /// Frame length prefix exceeds the allowed maximum.
    #[error("frame length {0} exceeds maximum {1}")]
    FrameTooLarge(usize, usize),

    /// Protobuf body failed to decode.
    #[error("failed to decode frame: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Transport error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plan publishing errors.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Executor did not answer within the publish deadline.
    #[error("executor deadline exceeded")]
    DeadlineExceeded,

    /// Executor answered but declined the plan.
    #[error("executor rejected plan: {0}")]
    Rejected(String),

    /// Framing or decoding failed on the executor connection.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Transport error on the executor connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
