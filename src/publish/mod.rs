//! Publisher port: hands admitted plans to the downstream executor.

pub mod rpc;

use async_trait::async_trait;
use tracing::info;

use crate::arbitrage::{Plan, TriangleLeg};
use crate::error::PublishError;

pub use rpc::RpcPublisher;

/// Capability contract for emitting plans. Implementations must be cheap to
/// share across ingress handlers.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Hand one plan to the downstream executor.
    async fn publish(&self, plan: &Plan) -> Result<(), PublishError>;
}

/// Logs plans instead of sending them anywhere. Used when no executor is
/// configured.
#[derive(Debug, Default)]
pub struct LogPublisher;

fn format_leg(leg: &TriangleLeg) -> String {
    format!("{} {}", leg.side, leg.market)
}

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, plan: &Plan) -> Result<(), PublishError> {
        info!(
            exchange = %plan.exchange,
            profit_quote = plan.expected_profit_quote,
            quote_currency = %plan.quote_currency,
            leg1 = %format_leg(&plan.legs[0]),
            leg2 = %format_leg(&plan.legs[1]),
            leg3 = %format_leg(&plan.legs[2]),
            "publishing plan"
        );
        Ok(())
    }
}

/// Test support: an in-memory publisher that records every plan.
pub mod testing {
    use parking_lot::Mutex;

    use super::*;

    type FailFn = Box<dyn Fn() -> PublishError + Send + Sync>;

    /// Records published plans; optionally fails each call while still
    /// recording the attempt.
    #[derive(Default)]
    pub struct MockPublisher {
        plans: Mutex<Vec<Plan>>,
        fail: Mutex<Option<FailFn>>,
    }

    impl MockPublisher {
        /// Create an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Copy of every plan published so far.
        pub fn published(&self) -> Vec<Plan> {
            self.plans.lock().clone()
        }

        /// Make every subsequent publish fail with the given error.
        pub fn fail_with(&self, f: impl Fn() -> PublishError + Send + Sync + 'static) {
            *self.fail.lock() = Some(Box::new(f));
        }
    }

    #[async_trait]
    impl Publisher for MockPublisher {
        async fn publish(&self, plan: &Plan) -> Result<(), PublishError> {
            self.plans.lock().push(plan.clone());
            if let Some(f) = self.fail.lock().as_ref() {
                return Err(f());
            }
            Ok(())
        }
    }
}
