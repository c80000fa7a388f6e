//! Tenancy guard — the cross-tenant isolation chokepoint.
//!
//! Every read and write in every other component calls [`authorize`]
//! before touching the resource. Fail-closed: anything not an exact
//! tenant match is rejected.

use paygate_types::{ActorContext, ActorRole, PaygateError, Result, TenantId};

/// Decide whether an actor of `actor_tenant` may act on a resource owned
/// by `resource_tenant`. Pure, no side effects.
///
/// # Errors
/// Returns [`PaygateError::CrossTenant`] on any mismatch.
pub fn authorize(actor_tenant: TenantId, resource_tenant: TenantId) -> Result<()> {
    if actor_tenant == resource_tenant {
        Ok(())
    } else {
        Err(PaygateError::CrossTenant {
            actor_tenant,
            resource_tenant,
        })
    }
}

/// Require the context to carry a specific role.
///
/// # Errors
/// Returns [`PaygateError::RoleNotPermitted`] when the roles differ.
pub fn require_role(ctx: &ActorContext, required: ActorRole) -> Result<()> {
    if ctx.role == required {
        Ok(())
    } else {
        Err(PaygateError::RoleNotPermitted {
            required,
            actual: ctx.role,
        })
    }
}
