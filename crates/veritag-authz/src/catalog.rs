//! Static capability and role catalogs.
//!
//! Pure data, no side effects.  Lookups fail only with
//! [`VeritagError::NotFound`] for unknown names; listings are finite,
//! ordered, and restartable.

use veritag_types::{Capability, CapabilitySet, Role, VeritagError};

/// Every capability, in catalog order.
pub const CAPABILITIES: [Capability; 7] = [
    Capability::Mint,
    Capability::Bind,
    Capability::Activate,
    Capability::Claim,
    Capability::Flag,
    Capability::Resolve,
    Capability::Recycle,
];

/// Every role badge, in catalog order.
pub const ROLES: [Role; 7] = [
    Role::IdentityTier1,
    Role::IdentityTier2,
    Role::IdentityTier3,
    Role::Manufacturer,
    Role::Retailer,
    Role::Government,
    Role::LawEnforcement,
];

/// Ordered listing of the capability catalog.
pub fn list_capabilities() -> &'static [Capability] {
    &CAPABILITIES
}

/// Ordered listing of the role catalog.
pub fn list_roles() -> &'static [Role] {
    &ROLES
}

/// Look up a capability by display name (case-insensitive).
///
/// # Errors
///
/// [`VeritagError::NotFound`] when no capability matches.
pub fn capability_by_name(name: &str) -> Result<Capability, VeritagError> {
    CAPABILITIES
        .iter()
        .copied()
        .find(|c| c.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| VeritagError::NotFound(format!("capability '{name}'")))
}

/// Look up a role by name (case-insensitive).
///
/// # Errors
///
/// [`VeritagError::NotFound`] when no role matches.
pub fn role_by_name(name: &str) -> Result<Role, VeritagError> {
    ROLES
        .iter()
        .copied()
        .find(|r| r.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| VeritagError::NotFound(format!("role '{name}'")))
}

/// The default capability bundle a role badge confers.
///
/// | Role | Default capabilities |
/// |------|----------------------|
/// | identity tiers 1–3 | CLAIM, FLAG |
/// | manufacturer | MINT, BIND |
/// | retailer | ACTIVATE |
/// | government | MINT, BIND, ACTIVATE, CLAIM, FLAG, RESOLVE, RECYCLE |
/// | law enforcement | FLAG, RESOLVE |
pub fn default_capabilities_for(role: Role) -> CapabilitySet {
    let caps: &[Capability] = match role {
        Role::IdentityTier1 | Role::IdentityTier2 | Role::IdentityTier3 => {
            &[Capability::Claim, Capability::Flag]
        }
        Role::Manufacturer => &[Capability::Mint, Capability::Bind],
        Role::Retailer => &[Capability::Activate],
        Role::Government => &[
            Capability::Mint,
            Capability::Bind,
            Capability::Activate,
            Capability::Claim,
            Capability::Flag,
            Capability::Resolve,
            Capability::Recycle,
        ],
        Role::LawEnforcement => &[Capability::Flag, Capability::Resolve],
    };
    caps.iter().copied().collect()
}
