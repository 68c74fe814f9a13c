//! Authorization engine – the read path of the permission model.
//!
//! Before any lifecycle transition is executed, call [`check`] to verify
//! the acting party holds the required [`Capability`].  If the check fails
//! a [`VeritagError::Unauthorized`] is returned and the transition must
//! not be executed.
//!
//! The engine is a pure, stateless function of the actor snapshot it is
//! handed: the effective set is recomputed on every call and never cached,
//! so a grant or revoke recorded on the ledger is reflected on the next
//! read with no invalidation step.
//!
//! # Example
//!
//! ```
//! use veritag_authz::engine::can_perform;
//! use veritag_types::{Actor, Capability, Role};
//!
//! let maker = Actor::identified("0xfab").with_role(Role::Manufacturer);
//! assert!(can_perform(&maker, Capability::Mint));
//! assert!(!can_perform(&maker, Capability::Resolve));
//!
//! // Any connected party may claim or flag, even with no role and no grants.
//! let visitor = Actor::identified("0xanon");
//! assert!(can_perform(&visitor, Capability::Claim));
//! assert!(!can_perform(&visitor, Capability::Bind));
//! ```

use tracing::{debug, warn};
use veritag_types::{Actor, Capability, CapabilitySet, VeritagError};

use crate::catalog::default_capabilities_for;

/// Capabilities any *identified* actor may exercise without holding them:
/// any connected party may claim or flag an item.  This is a deliberate
/// carve-out distinct from role-gated capabilities.
pub const PUBLIC_CAPABILITIES: [Capability; 2] = [Capability::Claim, Capability::Flag];

/// Compute the actor's effective capability set: role defaults ∪ explicit
/// grants.
///
/// Never fails; an actor with no role and no grants yields the empty set.
/// The union is intentionally additive – revoking a capability that the
/// actor's role also confers by default does not remove it (see DESIGN.md).
pub fn effective_capabilities(actor: &Actor) -> CapabilitySet {
    let mut caps = actor
        .role
        .map(default_capabilities_for)
        .unwrap_or_default();
    caps.extend(actor.grants.iter().copied());
    caps
}

/// Whether `actor` may perform `capability`.
///
/// True when `capability` is in the actor's effective set, or when it is
/// one of the [`PUBLIC_CAPABILITIES`] and the actor is identified.
/// Side-effect-free and safe to call repeatedly; the answer changes
/// between calls only if the underlying role/grant snapshot changes.
pub fn can_perform(actor: &Actor, capability: Capability) -> bool {
    if PUBLIC_CAPABILITIES.contains(&capability) && actor.is_identified() {
        return true;
    }
    effective_capabilities(actor).contains(&capability)
}

/// Return `Ok(())` when `actor` may perform `capability`, or
/// [`VeritagError::Unauthorized`] otherwise.
pub fn check(actor: &Actor, capability: Capability) -> Result<(), VeritagError> {
    if can_perform(actor, capability) {
        debug!(
            actor = actor.address.as_ref().map(|a| a.as_str()).unwrap_or("<anonymous>"),
            capability = capability.name(),
            "authorization granted"
        );
        Ok(())
    } else {
        warn!(
            actor = actor.address.as_ref().map(|a| a.as_str()).unwrap_or("<anonymous>"),
            capability = capability.name(),
            "authorization denied"
        );
        Err(VeritagError::Unauthorized(capability))
    }
}
