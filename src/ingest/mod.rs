//! Ingress: wire protocol and the framed TCP delta server.

pub mod server;
pub mod wire;

pub use server::IngressServer;
pub use wire::{Ack, MarketRef, OrderBookDelta, PlanMsg, ProposeReply, WireLevel};
