//! Acting parties and the authenticated context they operate under.
//!
//! Authentication itself happens at the transport layer (out of scope).
//! The core receives an already-authenticated [`ActorContext`] and makes
//! every authorization decision against it.

use serde::{Deserialize, Serialize};

use crate::{ActorId, TenantId};

/// The role an actor plays within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ActorRole {
    /// Sells goods, reviews payment receipts.
    Vendor,
    /// Pays for orders, uploads receipts.
    Buyer,
    /// The business owner; decides escalations.
    Ceo,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vendor => write!(f, "VENDOR"),
            Self::Buyer => write!(f, "BUYER"),
            Self::Ceo => write!(f, "CEO"),
        }
    }
}

/// An authenticated actor: who they are, which tenant they belong to, and
/// the role the transport layer authenticated them as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor: ActorId,
    pub tenant: TenantId,
    pub role: ActorRole,
}

impl ActorContext {
    #[must_use]
    pub fn new(actor: ActorId, tenant: TenantId, role: ActorRole) -> Self {
        Self {
            actor,
            tenant,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display() {
        assert_eq!(format!("{}", ActorRole::Vendor), "VENDOR");
        assert_eq!(format!("{}", ActorRole::Ceo), "CEO");
    }

    #[test]
    fn context_serde_roundtrip() {
        let ctx = ActorContext::new(ActorId::new(), TenantId::new(), ActorRole::Ceo);
        let json = serde_json::to_string(&ctx).unwrap();
        let back: ActorContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }
}
