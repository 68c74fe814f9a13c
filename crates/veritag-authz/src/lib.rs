//! `veritag-authz` – Capability & Role catalogs, authorization engine.
//!
//! Decides, for a given actor snapshot, which lifecycle transitions that
//! actor may trigger.  It does not think; it merges role-derived defaults
//! with individually granted capabilities and answers membership queries.
//!
//! # Modules
//!
//! - [`catalog`] – static registries: the ordered capability catalog, the
//!   role catalog, case-insensitive name lookup, and the role →
//!   default-capability mapping.
//! - [`engine`] – the read path: [`effective_capabilities`][engine::effective_capabilities]
//!   (role defaults ∪ explicit grants, recomputed per call),
//!   [`can_perform`][engine::can_perform] with the public CLAIM/FLAG
//!   carve-out, and [`check`][engine::check] which returns
//!   [`VeritagError::Unauthorized`][veritag_types::VeritagError::Unauthorized]
//!   on denial.
//!
//! Grant and revoke are ledger mutations and live with the ledger
//! collaborator; this crate only ever reads the snapshot it is handed, so
//! nothing here can go stale across a grant/revoke.

pub mod catalog;
pub mod engine;

pub use catalog::{
    capability_by_name, default_capabilities_for, list_capabilities, list_roles, role_by_name,
};
pub use engine::{can_perform, check, effective_capabilities};
