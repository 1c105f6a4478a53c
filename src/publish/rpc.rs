//! Framed-RPC publisher: proposes plans to the executor over TCP.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::arbitrage::Plan;
use crate::error::PublishError;
use crate::ingest::wire::{read_frame, write_frame, PlanMsg, ProposeReply};

use super::Publisher;

/// Per-call deadline covering connect, send, and reply.
pub const PUBLISH_DEADLINE: Duration = Duration::from_millis(500);

/// Publishes plans to the executor over a framed TCP link.
///
/// The connection is established lazily and cached; any error or deadline
/// miss drops it so the next publish reconnects.
pub struct RpcPublisher {
    addr: String,
    conn: Mutex<Option<TcpStream>>,
}

impl RpcPublisher {
    /// Create a publisher targeting `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: Mutex::new(None),
        }
    }

    async fn exchange(stream: &mut TcpStream, msg: &PlanMsg) -> Result<ProposeReply, PublishError> {
        write_frame(stream, msg).await?;
        let reply: Option<ProposeReply> = read_frame(stream).await?;
        reply.ok_or_else(|| {
            PublishError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "executor closed the connection before replying",
            ))
        })
    }

    async fn call(&self, msg: &PlanMsg) -> Result<ProposeReply, PublishError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            debug!(addr = %self.addr, "connecting to executor");
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(PublishError::Io)?;
            *guard = Some(stream);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(PublishError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "executor connection unavailable",
            )));
        };

        let result = Self::exchange(stream, msg).await;
        if result.is_err() {
            *guard = None;
        }
        result
    }
}

#[async_trait]
impl Publisher for RpcPublisher {
    async fn publish(&self, plan: &Plan) -> Result<(), PublishError> {
        let msg = PlanMsg::from(plan);
        match timeout(PUBLISH_DEADLINE, self.call(&msg)).await {
            Err(_) => {
                // The in-flight exchange was cancelled mid-frame; the cached
                // connection is no longer usable.
                *self.conn.lock().await = None;
                Err(PublishError::DeadlineExceeded)
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(reply)) if !reply.accepted => Err(PublishError::Rejected(reply.reason)),
            Ok(Ok(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::{TriangleLeg, PLAN_VALID_MS};
    use crate::market::Side;
    use tokio::net::TcpListener;

    fn plan() -> Plan {
        Plan {
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
        }
    }

    async fn spawn_executor(accepted: bool, reason: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let reason = reason.to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let proposal: PlanMsg = read_frame(&mut stream).await.unwrap().unwrap();
            assert_eq!(proposal.legs.len(), 3);
            write_frame(&mut stream, &ProposeReply { accepted, reason })
                .await
                .unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn publish_roundtrip_accepted() {
        let addr = spawn_executor(true, "").await;
        let publisher = RpcPublisher::new(addr);
        publisher.publish(&plan()).await.unwrap();
    }

    #[tokio::test]
    async fn rejection_surfaces_reason() {
        let addr = spawn_executor(false, "risk limit").await;
        let publisher = RpcPublisher::new(addr);
        let err = publisher.publish(&plan()).await.unwrap_err();
        match err {
            PublishError::Rejected(reason) => assert_eq!(reason, "risk limit"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn connect_failure_is_an_error() {
        // Reserve a port and close the listener so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let publisher = RpcPublisher::new(addr);
        assert!(publisher.publish(&plan()).await.is_err());
    }
}
