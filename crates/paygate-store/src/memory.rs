//! In-memory record store, used by tests and development.
//!
//! One `tokio::sync::RwLock` per record family. Locks guard only the
//! non-awaiting critical section of each operation — nothing is held
//! across an await point — so unrelated record families never contend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use paygate_types::{
    ActorId, ActorRole, Escalation, EscalationId, EscalationStatus, Order, OrderId, OrderStatus,
    OtpRecord, PaygateError, Receipt, ReceiptId, ReceiptStatus, Result, TenantId,
};

use crate::{RecordStore, constant_time_eq};

/// Thread-safe in-memory implementation of [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    receipts: RwLock<HashMap<ReceiptId, Receipt>>,
    escalations: RwLock<HashMap<EscalationId, Escalation>>,
    otps: RwLock<HashMap<(ActorId, ActorRole), OtpRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders stored (test observability).
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Number of escalations stored (test observability).
    pub async fn escalation_count(&self) -> usize {
        self.escalations.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    // ==================== Orders ====================

    async fn put_order(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(PaygateError::DuplicateOrder(order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_order(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id)
            .ok_or(PaygateError::OrderNotFound(order.id))?;
        if current.tenant_id != order.tenant_id {
            return Err(PaygateError::Internal(format!(
                "tenant id of order {} is immutable",
                order.id
            )));
        }
        if current.status != expected {
            return Err(PaygateError::OrderMoved {
                order: order.id,
                expected,
                actual: current.status,
            });
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    // ==================== Receipts ====================

    async fn put_receipt(&self, receipt: &Receipt) -> Result<()> {
        let mut receipts = self.receipts.write().await;
        if receipts.contains_key(&receipt.id) {
            return Err(PaygateError::Internal(format!(
                "receipt id collision: {}",
                receipt.id
            )));
        }
        receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn get_receipt(&self, id: ReceiptId) -> Result<Option<Receipt>> {
        Ok(self.receipts.read().await.get(&id).cloned())
    }

    async fn update_receipt(&self, receipt: &Receipt, expected: ReceiptStatus) -> Result<()> {
        let mut receipts = self.receipts.write().await;
        let current = receipts
            .get(&receipt.id)
            .ok_or(PaygateError::ReceiptNotFound(receipt.id))?;
        if current.tenant_id != receipt.tenant_id {
            return Err(PaygateError::Internal(format!(
                "tenant id of receipt {} is immutable",
                receipt.id
            )));
        }
        if current.status != expected {
            return Err(PaygateError::ReceiptAlreadyResolved {
                receipt: receipt.id,
                status: current.status,
            });
        }
        receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    // ==================== Escalations ====================

    async fn put_escalation(&self, escalation: &Escalation) -> Result<()> {
        let mut escalations = self.escalations.write().await;
        if escalations.contains_key(&escalation.id) {
            return Err(PaygateError::DuplicateEscalation(escalation.id));
        }
        escalations.insert(escalation.id, escalation.clone());
        Ok(())
    }

    async fn get_escalation(&self, id: EscalationId) -> Result<Option<Escalation>> {
        Ok(self.escalations.read().await.get(&id).cloned())
    }

    async fn update_escalation(
        &self,
        escalation: &Escalation,
        expected: EscalationStatus,
    ) -> Result<()> {
        let mut escalations = self.escalations.write().await;
        let current = escalations
            .get(&escalation.id)
            .ok_or(PaygateError::EscalationNotFound(escalation.id))?;
        if current.tenant_id != escalation.tenant_id {
            return Err(PaygateError::Internal(format!(
                "tenant id of escalation {} is immutable",
                escalation.id
            )));
        }
        if current.status != expected {
            return Err(PaygateError::EscalationAlreadyDecided {
                escalation: escalation.id,
                status: current.status,
            });
        }
        escalations.insert(escalation.id, escalation.clone());
        Ok(())
    }

    async fn list_escalations(&self, tenant: TenantId) -> Result<Vec<Escalation>> {
        let escalations = self.escalations.read().await;
        let mut matching: Vec<Escalation> = escalations
            .values()
            .filter(|e| e.tenant_id == tenant)
            .cloned()
            .collect();
        // UUIDv7 ids are time-ordered, so this is creation order.
        matching.sort_by_key(|e| e.id);
        Ok(matching)
    }

    // ==================== OTP records ====================

    async fn put_otp(&self, record: &OtpRecord) -> Result<()> {
        let mut otps = self.otps.write().await;
        otps.insert((record.subject, record.role), record.clone());
        Ok(())
    }

    async fn get_otp(&self, subject: ActorId, role: ActorRole) -> Result<Option<OtpRecord>> {
        Ok(self.otps.read().await.get(&(subject, role)).cloned())
    }

    async fn update_otp(&self, record: &OtpRecord, expected_hash: &[u8; 32]) -> Result<bool> {
        let mut otps = self.otps.write().await;
        match otps.get(&(record.subject, record.role)) {
            Some(current) if constant_time_eq(&current.code_hash, expected_hash) => {
                otps.insert((record.subject, record.role), record.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_otp(&self, subject: ActorId, role: ActorRole) -> Result<()> {
        self.otps.write().await.remove(&(subject, role));
        Ok(())
    }

    async fn delete_otp_if(
        &self,
        subject: ActorId,
        role: ActorRole,
        expected_hash: &[u8; 32],
    ) -> Result<bool> {
        let mut otps = self.otps.write().await;
        match otps.get(&(subject, role)) {
            Some(current) if constant_time_eq(&current.code_hash, expected_hash) => {
                otps.remove(&(subject, role));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
