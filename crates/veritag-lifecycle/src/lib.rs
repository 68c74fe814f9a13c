//! `veritag-lifecycle` – the asset lifecycle state machine.
//!
//! Defines the universe of legal transitions and the single interception
//! point every transition request must pass through before the caller
//! commits anything to the ledger.
//!
//! # Modules
//!
//! - [`transitions`] – the legality table: which [`TransitionAction`][veritag_types::TransitionAction]
//!   is legal from which [`AssetState`][veritag_types::AssetState], and the
//!   [`Gate`][transitions::Gate] (required capability or public carve-out)
//!   for each action.
//! - [`gate`] – [`LifecycleGate`][gate::LifecycleGate]: enforces legality,
//!   authorization, and input validation in order, then computes the next
//!   state and the [`LedgerEvent`][veritag_types::LedgerEvent]s to record.
//!
//! The gate is pure: it performs no I/O and mutates nothing.  Callers must
//! apply its outcome atomically per asset id (optimistic version check or
//! a per-key mutex at the persistence boundary) – see
//! [`LifecycleGate::transition`][gate::LifecycleGate::transition].

pub mod gate;
pub mod transitions;

pub use gate::{LifecycleGate, TransitionOutcome};
pub use transitions::{Gate, is_legal, required_gate};
