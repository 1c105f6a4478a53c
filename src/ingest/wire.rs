//! Wire messages and framing for the ingress and executor links.
//!
//! Messages are hand-written prost structs. Every frame on the socket is a
//! big-endian `u32` length prefix followed by the encoded protobuf body.

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::arbitrage::Plan;
use crate::error::WireError;
use crate::orderbook::Level;

/// Upper bound on a single frame body, in bytes.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Market identity carried on every delta.
#[derive(Clone, PartialEq, Message)]
pub struct MarketRef {
    /// Exchange name.
    #[prost(string, tag = "1")]
    pub exchange: String,
    /// Venue symbol.
    #[prost(string, tag = "2")]
    pub symbol: String,
}

/// One price level on the wire.
#[derive(Clone, PartialEq, Message)]
pub struct WireLevel {
    #[prost(double, tag = "1")]
    pub price: f64,
    #[prost(double, tag = "2")]
    pub qty: f64,
}

impl From<&WireLevel> for Level {
    fn from(l: &WireLevel) -> Self {
        Level::new(l.price, l.qty)
    }
}

/// Order-book update pushed by a feed. Each delta carries full sides and is
/// treated as the current authoritative snapshot.
#[derive(Clone, PartialEq, Message)]
pub struct OrderBookDelta {
    /// Market the update belongs to.
    #[prost(message, optional, tag = "1")]
    pub market: Option<MarketRef>,
    /// Bid levels, best first by convention but unordered input is accepted.
    #[prost(message, repeated, tag = "2")]
    pub bids: Vec<WireLevel>,
    /// Ask levels.
    #[prost(message, repeated, tag = "3")]
    pub asks: Vec<WireLevel>,
    /// Venue sequence number.
    #[prost(uint64, tag = "4")]
    pub sequence: u64,
    /// Venue timestamp in nanoseconds.
    #[prost(uint64, tag = "5")]
    pub ts_ns: u64,
}

/// Terminal acknowledgement for one ingress stream.
#[derive(Clone, PartialEq, Message)]
pub struct Ack {
    #[prost(bool, tag = "1")]
    pub ok: bool,
}

/// One plan leg on the executor link.
#[derive(Clone, PartialEq, Message)]
pub struct LegMsg {
    #[prost(string, tag = "1")]
    pub market: String,
    /// `BUY` or `SELL`.
    #[prost(string, tag = "2")]
    pub side: String,
    #[prost(double, tag = "3")]
    pub qty: f64,
    #[prost(double, tag = "4")]
    pub limit_price: f64,
}

/// Plan proposal sent to the executor.
#[derive(Clone, PartialEq, Message)]
pub struct PlanMsg {
    #[prost(string, tag = "1")]
    pub exchange: String,
    #[prost(message, repeated, tag = "2")]
    pub legs: Vec<LegMsg>,
    #[prost(double, tag = "3")]
    pub expected_profit_quote: f64,
    #[prost(string, tag = "4")]
    pub quote_ccy: String,
    #[prost(uint64, tag = "5")]
    pub valid_ms: u64,
    #[prost(double, tag = "6")]
    pub max_slippage_bp: f64,
    #[prost(string, tag = "7")]
    pub plan_id: String,
}

impl From<&Plan> for PlanMsg {
    fn from(plan: &Plan) -> Self {
        PlanMsg {
            exchange: plan.exchange.clone(),
            legs: plan
                .legs
                .iter()
                .map(|l| LegMsg {
                    market: l.market.clone(),
                    side: l.side.to_string(),
                    qty: l.qty,
                    limit_price: l.limit_price,
                })
                .collect(),
            expected_profit_quote: plan.expected_profit_quote,
            quote_ccy: plan.quote_currency.clone(),
            valid_ms: plan.valid_ms,
            max_slippage_bp: plan.max_slippage_bp,
            plan_id: plan.plan_id.clone(),
        }
    }
}

/// Executor's answer to a proposal.
#[derive(Clone, PartialEq, Message)]
pub struct ProposeReply {
    #[prost(bool, tag = "1")]
    pub accepted: bool,
    /// Human-readable reason when declined.
    #[prost(string, tag = "2")]
    pub reason: String,
}

/// Write one length-prefixed frame.
pub async fn write_frame<W, M>(writer: &mut W, msg: &M) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let body = msg.encode_to_vec();
    if body.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(body.len(), MAX_FRAME_LEN));
    }
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// Returns `Ok(None)` on a clean EOF at a frame boundary; EOF inside a frame
/// is an error.
pub async fn read_frame<R, M>(reader: &mut R) -> Result<Option<M>, WireError>
where
    R: AsyncRead + Unpin,
    M: Message + Default,
{
    let mut len_buf = [0u8; 4];
    let n = reader.read(&mut len_buf[..1]).await?;
    if n == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut len_buf[1..]).await?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len, MAX_FRAME_LEN));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(M::decode(body.as_slice())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> OrderBookDelta {
        OrderBookDelta {
            market: Some(MarketRef {
                exchange: "BINANCE".to_string(),
                symbol: "BTCUSDT".to_string(),
            }),
            bids: vec![WireLevel {
                price: 49_800.0,
                qty: 1.5,
            }],
            asks: vec![WireLevel {
                price: 49_900.0,
                qty: 2.0,
            }],
            sequence: 7,
            ts_ns: 1_700_000_000_000_000_000,
        }
    }

    #[tokio::test]
    async fn frame_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &delta()).await.unwrap();

        let mut reader = buf.as_slice();
        let decoded: OrderBookDelta = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded, delta());

        // The stream is exhausted: next read is a clean EOF.
        let next: Option<Ack> = read_frame(&mut reader).await.unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn multiple_frames_in_sequence() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &delta()).await.unwrap();
        write_frame(&mut buf, &Ack { ok: true }).await.unwrap();

        let mut reader = buf.as_slice();
        let first: OrderBookDelta = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.sequence, 7);
        let second: Ack = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(second.ok);
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &delta()).await.unwrap();
        buf.truncate(buf.len() - 3);

        let mut reader = buf.as_slice();
        let result: Result<Option<OrderBookDelta>, _> = read_frame(&mut reader).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_LEN as u32 + 1).to_be_bytes());
        buf.extend_from_slice(&[0u8; 16]);

        let mut reader = buf.as_slice();
        let result: Result<Option<OrderBookDelta>, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(WireError::FrameTooLarge(_, _))));
    }

    #[test]
    fn plan_msg_from_plan() {
        use crate::arbitrage::{Plan, TriangleLeg, PLAN_VALID_MS};
        use crate::market::Side;

        let plan = Plan {
            exchange: "BINANCE".to_string(),
            legs: [
                TriangleLeg {
                    market: "ETHUSDT".to_string(),
                    side: Side::Buy,
                    qty: 0.33,
                    limit_price: 2_990.0,
                },
                TriangleLeg {
                    market: "ETHBTC".to_string(),
                    side: Side::Sell,
                    qty: 0.33,
                    limit_price: 0.0602,
                },
                TriangleLeg {
                    market: "BTCUSDT".to_string(),
                    side: Side::Sell,
                    qty: 0.02,
                    limit_price: 49_800.0,
                },
            ],
            expected_profit_quote: 2.3,
            quote_currency: "USDT".to_string(),
            valid_ms: PLAN_VALID_MS,
            max_slippage_bp: 0.0,
            plan_id: String::new(),
        };

        let msg = PlanMsg::from(&plan);
        assert_eq!(msg.exchange, "BINANCE");
        assert_eq!(msg.legs.len(), 3);
        assert_eq!(msg.legs[0].side, "BUY");
        assert_eq!(msg.legs[1].side, "SELL");
        assert_eq!(msg.quote_ccy, "USDT");
        assert_eq!(msg.valid_ms, 250);
    }
}
