//! [`LifecycleGate`] – single interception point for lifecycle transitions.
//!
//! Every transition request must pass through [`LifecycleGate::transition`]
//! (or [`LifecycleGate::mint`] for record creation) before the caller
//! commits anything.  The gate enforces three independent checks in order:
//!
//! 1. **Legality** ([`transitions::is_legal`]): the action must be legal
//!    from the asset's current state, otherwise
//!    [`VeritagError::IllegalTransition`].
//! 2. **Authorization** (`veritag-authz`): the actor must hold the
//!    capability behind the action's [`Gate`], or be identified for the
//!    public CLAIM/FLAG carve-outs, otherwise
//!    [`VeritagError::Unauthorized`].
//! 3. **Validation**: resolution notes must meet the minimum length and a
//!    DECOMMISSION must carry the irreversibility acknowledgement,
//!    otherwise [`VeritagError::Validation`].
//!
//! Only when all three pass does the gate compute the next state and the
//! [`LedgerEvent`]s to record.  The gate itself is pure – it performs no
//! I/O and mutates nothing.
//!
//! # Caller obligation
//!
//! Legality is checked against the snapshot the caller passed in, so the
//! check and the commit of the returned asset must be applied atomically
//! per asset id (an optimistic version check or a per-key mutex at the
//! persistence boundary).  Two racing FLAG calls that both commit would
//! lose track of which pre-flag state a later CLEAR should restore.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use veritag_lifecycle::LifecycleGate;
//! use veritag_types::{Actor, Role, TransitionAction};
//!
//! let gate = LifecycleGate::new();
//! let maker = Actor::identified("0xfab").with_role(Role::Manufacturer);
//!
//! let minted = gate.mint(&maker, "ipfs://sku-4711", Utc::now()).unwrap();
//! let bound = gate
//!     .transition(
//!         &minted.asset,
//!         &TransitionAction::Bind { tag_id: "nfc-0001".into() },
//!         &maker,
//!         Utc::now(),
//!     )
//!     .unwrap();
//! assert_eq!(bound.asset.tag_binding.as_deref(), Some("nfc-0001"));
//! ```

use chrono::{DateTime, Utc};
use tracing::info;
use veritag_authz::engine;
use veritag_types::{
    Actor, Address, Asset, AssetId, AssetState, Capability, FlagRecord, LedgerEvent, Resolution,
    ResolutionKind, TransitionAction, VeritagError,
};

use crate::transitions::{Gate, is_legal, required_gate};

/// Minimum resolution-note length accepted by a freshly built gate.
pub const DEFAULT_MIN_RESOLUTION_NOTES: usize = 20;

/// Result of a successful mint or transition: the updated asset record and
/// the event records the caller must persist alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub asset: Asset,
    pub events: Vec<LedgerEvent>,
}

/// The transition gate.  Stateless apart from validation settings; any
/// number of callers may use one gate concurrently.
#[derive(Debug, Clone)]
pub struct LifecycleGate {
    min_resolution_notes: usize,
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self {
            min_resolution_notes: DEFAULT_MIN_RESOLUTION_NOTES,
        }
    }
}

impl LifecycleGate {
    /// Gate with the default validation settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the minimum resolution-note length.
    pub fn with_min_resolution_notes(mut self, min: usize) -> Self {
        self.min_resolution_notes = min;
        self
    }

    /// Create a new asset record in [`AssetState::Minted`], owned by the
    /// minting actor.
    ///
    /// # Errors
    ///
    /// [`VeritagError::Unauthorized`] when the actor lacks the MINT
    /// capability or is not identified.
    pub fn mint(
        &self,
        actor: &Actor,
        metadata_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, VeritagError> {
        let minter = self.authorize(actor, &TransitionAction::Mint)?;
        let asset = Asset {
            id: AssetId::new(),
            owner: minter.clone(),
            state: AssetState::Minted,
            pre_flag_state: None,
            tag_binding: None,
            metadata_ref: metadata_ref.into(),
            created_at: now,
            updated_at: now,
        };
        info!(asset = %asset.id, actor = %minter, "asset minted");
        let events = vec![LedgerEvent::StateChanged {
            asset_id: asset.id,
            previous_state: None,
            new_state: AssetState::Minted,
            actor: minter,
            timestamp: now,
        }];
        Ok(TransitionOutcome { asset, events })
    }

    /// Apply `action` to `asset` on behalf of `actor`.
    ///
    /// Pure given its inputs: the passed-in asset is never mutated, and on
    /// error the caller's record is untouched by construction.  See the
    /// module docs for the per-asset-id commit obligation.
    ///
    /// # Errors
    ///
    /// - [`VeritagError::IllegalTransition`] – action not legal from the
    ///   current state (including MINT against an existing record).
    /// - [`VeritagError::Unauthorized`] – actor fails the action's gate.
    /// - [`VeritagError::Validation`] – resolution notes shorter than the
    ///   configured minimum, missing irreversibility acknowledgement, or a
    ///   flagged record with no recorded pre-flag state.
    pub fn transition(
        &self,
        asset: &Asset,
        action: &TransitionAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, VeritagError> {
        if !is_legal(Some(asset.state), action) {
            return Err(VeritagError::IllegalTransition {
                from: Some(asset.state),
                action: action.name().to_string(),
            });
        }
        let address = self.authorize(actor, action)?;
        if let TransitionAction::Resolve(resolution) = action {
            self.validate_resolution(resolution)?;
        }

        let mut next = asset.clone();
        next.updated_at = now;
        let mut events = Vec::new();

        match action {
            // Rejected by the legality check above.
            TransitionAction::Mint => unreachable!("MINT is illegal against an existing record"),
            TransitionAction::Bind { tag_id } => {
                next.state = AssetState::Bound;
                next.tag_binding = Some(tag_id.clone());
            }
            TransitionAction::Activate => {
                next.state = AssetState::Activated;
            }
            TransitionAction::Claim => {
                next.state = AssetState::Claimed;
                next.owner = address.clone();
            }
            TransitionAction::Flag { reason } => {
                next.pre_flag_state = Some(asset.state);
                next.state = AssetState::Flagged;
                events.push(LedgerEvent::AssetFlagged(FlagRecord {
                    asset_id: asset.id,
                    flagged_by: address.clone(),
                    flagged_at: now,
                    reason: reason.clone(),
                }));
            }
            TransitionAction::Resolve(resolution) => {
                match resolution.kind {
                    ResolutionKind::Clear => {
                        let restored = asset.pre_flag_state.ok_or_else(|| {
                            VeritagError::Validation(
                                "flagged asset has no recorded pre-flag state".to_string(),
                            )
                        })?;
                        next.state = restored;
                        next.pre_flag_state = None;
                    }
                    // The asset stays flagged and held; the open flag (and
                    // its pre-flag state) survives for a later CLEAR.
                    ResolutionKind::Quarantine => {}
                    ResolutionKind::Decommission => {
                        next.state = AssetState::Decommissioned;
                        next.pre_flag_state = None;
                    }
                }
                events.push(LedgerEvent::FlagResolved {
                    asset_id: asset.id,
                    resolver: address.clone(),
                    kind: resolution.kind,
                    notes: resolution.notes.clone(),
                    timestamp: now,
                });
            }
            TransitionAction::Recycle => {
                next.state = AssetState::Recycled;
            }
        }

        if next.state != asset.state {
            events.insert(
                0,
                LedgerEvent::StateChanged {
                    asset_id: asset.id,
                    previous_state: Some(asset.state),
                    new_state: next.state,
                    actor: address.clone(),
                    timestamp: now,
                },
            );
        }

        info!(
            asset = %asset.id,
            action = action.name(),
            from = %asset.state,
            to = %next.state,
            actor = %address,
            "transition accepted"
        );
        Ok(TransitionOutcome {
            asset: next,
            events,
        })
    }

    /// Enforce the action's gate and return the acting address.
    ///
    /// Every accepted transition is attributed to an address on the ledger,
    /// so an unidentified actor is denied even for capability-gated actions.
    fn authorize(
        &self,
        actor: &Actor,
        action: &TransitionAction,
    ) -> Result<Address, VeritagError> {
        let nominal = Self::nominal_capability(action);
        match required_gate(action) {
            Gate::Public => {}
            Gate::Capability(cap) => engine::check(actor, cap)?,
        }
        actor
            .address
            .clone()
            .ok_or(VeritagError::Unauthorized(nominal))
    }

    /// The capability named in denial errors for each action.  For the
    /// public carve-outs this is the capability an unidentified party is
    /// told it lacks.
    fn nominal_capability(action: &TransitionAction) -> Capability {
        match action {
            TransitionAction::Mint => Capability::Mint,
            TransitionAction::Bind { .. } => Capability::Bind,
            TransitionAction::Activate => Capability::Activate,
            TransitionAction::Claim => Capability::Claim,
            TransitionAction::Flag { .. } => Capability::Flag,
            TransitionAction::Resolve(_) => Capability::Resolve,
            TransitionAction::Recycle => Capability::Recycle,
        }
    }

    fn validate_resolution(&self, resolution: &Resolution) -> Result<(), VeritagError> {
        let len = resolution.notes.chars().count();
        if len < self.min_resolution_notes {
            return Err(VeritagError::Validation(format!(
                "resolution notes must be at least {} characters (got {len})",
                self.min_resolution_notes
            )));
        }
        if resolution.kind == ResolutionKind::Decommission && !resolution.ack_irreversible {
            return Err(VeritagError::Validation(
                "decommission requires the irreversibility acknowledgement".to_string(),
            ));
        }
        Ok(())
    }
}
