//! Notifier seam — outbound messages to buyers and CEOs.
//!
//! Delivery is an external collaborator and strictly fire-and-forget:
//! callers log a failed dispatch and move on, because by the time a
//! notification goes out the decision it announces is already durably
//! committed.

use async_trait::async_trait;
use rust_decimal::Decimal;

use paygate_types::{Decision, EscalationId, OrderId, Result};

/// Outbound notification dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the buyer what happened to their order.
    async fn send_buyer_notification(&self, buyer_contact: &str, message: &str) -> Result<()>;

    /// Tell the CEO their decision was recorded.
    async fn send_resolution_notification(
        &self,
        ceo_contact: &str,
        escalation_id: EscalationId,
        order_id: OrderId,
        decision: Decision,
        amount: Decimal,
    ) -> Result<()>;
}

/// Discards every notification. Useful when no dispatcher is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_buyer_notification(&self, _buyer_contact: &str, _message: &str) -> Result<()> {
        Ok(())
    }

    async fn send_resolution_notification(
        &self,
        _ceo_contact: &str,
        _escalation_id: EscalationId,
        _order_id: OrderId,
        _decision: Decision,
        _amount: Decimal,
    ) -> Result<()> {
        Ok(())
    }
}

/// Test doubles.
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::{Decision, EscalationId, Notifier, OrderId, Result, async_trait};
    use paygate_types::PaygateError;
    use rust_decimal::Decimal;

    /// A dispatched buyer message, captured for assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentBuyerMessage {
        pub buyer_contact: String,
        pub message: String,
    }

    /// A dispatched resolution message, captured for assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentResolution {
        pub ceo_contact: String,
        pub escalation_id: EscalationId,
        pub order_id: OrderId,
        pub decision: Decision,
    }

    /// Records every dispatched notification.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub buyer_messages: Mutex<Vec<SentBuyerMessage>>,
        pub resolutions: Mutex<Vec<SentResolution>>,
    }

    impl RecordingNotifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn buyer_message_count(&self) -> usize {
            self.buyer_messages.lock().unwrap().len()
        }

        pub fn resolution_count(&self) -> usize {
            self.resolutions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_buyer_notification(&self, buyer_contact: &str, message: &str) -> Result<()> {
            self.buyer_messages.lock().unwrap().push(SentBuyerMessage {
                buyer_contact: buyer_contact.to_string(),
                message: message.to_string(),
            });
            Ok(())
        }

        async fn send_resolution_notification(
            &self,
            ceo_contact: &str,
            escalation_id: EscalationId,
            order_id: OrderId,
            decision: Decision,
            _amount: Decimal,
        ) -> Result<()> {
            self.resolutions.lock().unwrap().push(SentResolution {
                ceo_contact: ceo_contact.to_string(),
                escalation_id,
                order_id,
                decision,
            });
            Ok(())
        }
    }

    /// Fails every dispatch. Exercises the swallow-on-failure contract.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_buyer_notification(&self, _: &str, _: &str) -> Result<()> {
            Err(PaygateError::Io("delivery service unreachable".into()))
        }

        async fn send_resolution_notification(
            &self,
            _: &str,
            _: EscalationId,
            _: OrderId,
            _: Decision,
            _: Decimal,
        ) -> Result<()> {
            Err(PaygateError::Io("delivery service unreachable".into()))
        }
    }
}
