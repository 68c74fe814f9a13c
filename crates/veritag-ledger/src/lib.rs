//! `veritag-ledger` – in-memory reference ledger collaborator.
//!
//! The core (`veritag-authz`, `veritag-lifecycle`) is pure and operates on
//! snapshots; something has to hold the snapshots, serialize writes per
//! asset id, and apply the emitted [`LedgerEvent`]s.  In production that
//! something is the external blockchain ledger.  This crate is the
//! in-process stand-in used by tests and the CLI demo; it is deliberately
//! not durable.
//!
//! # Concurrency contract
//!
//! Every stored asset carries a monotonically increasing version.  A
//! caller takes a snapshot with [`MemoryLedger::snapshot_asset`], runs the
//! transition gate against it, and commits the outcome with
//! [`MemoryLedger::commit_asset`] passing the version it read.  If another
//! writer got there first the commit fails with
//! [`LedgerError::VersionConflict`] and the caller must re-read and
//! re-run the gate – this is what keeps two racing FLAG calls from both
//! succeeding and losing the pre-flag state.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use veritag_ledger::MemoryLedger;
//! use veritag_types::{Capability, Role};
//!
//! let ledger = MemoryLedger::new();
//! ledger.register_actor("0xfab".into(), Some(Role::Manufacturer));
//! ledger.grant(&"0xfab".into(), Capability::Recycle, Utc::now());
//!
//! let actor = ledger.snapshot_actor(&"0xfab".into());
//! assert_eq!(actor.role, Some(Role::Manufacturer));
//! assert!(actor.grants.contains(&Capability::Recycle));
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use veritag_types::{
    Actor, Address, Asset, AssetId, Capability, CapabilitySet, FlagRecord, LedgerEvent,
    ResolutionKind, Role, VeritagError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from ledger operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Version conflict on {asset_id}: expected {expected}, ledger at {actual}")]
    VersionConflict {
        asset_id: AssetId,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Core(#[from] VeritagError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct ActorRecord {
    role: Option<Role>,
    grants: CapabilitySet,
}

#[derive(Debug, Clone)]
struct VersionedAsset {
    asset: Asset,
    version: u64,
}

#[derive(Default)]
struct Inner {
    actors: HashMap<Address, ActorRecord>,
    assets: HashMap<AssetId, VersionedAsset>,
    open_flags: Vec<FlagRecord>,
    events: Vec<LedgerEvent>,
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryLedger
// ─────────────────────────────────────────────────────────────────────────────

/// In-process store of actors, versioned assets, open flags, and the event
/// log.  Cheap to share behind an `Arc`; a single mutex is plenty for a
/// test/demo collaborator.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    /// An empty ledger with no actors and no assets.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Actors ───────────────────────────────────────────────────────────

    /// Register (or re-badge) an actor.  Existing explicit grants survive a
    /// role change.
    pub fn register_actor(&self, address: Address, role: Option<Role>) {
        let mut inner = self.lock();
        inner.actors.entry(address).or_default().role = role;
    }

    /// Grant `capability` directly to `address`.  Unknown addresses get a
    /// fresh record; duplicate grants are silently ignored.
    pub fn grant(&self, address: &Address, capability: Capability, now: DateTime<Utc>) {
        let mut inner = self.lock();
        let added = inner
            .actors
            .entry(address.clone())
            .or_default()
            .grants
            .insert(capability);
        if added {
            info!(address = %address, capability = %capability, "capability granted");
            inner.events.push(LedgerEvent::CapabilityGranted {
                address: address.clone(),
                capability,
                timestamp: now,
            });
        }
    }

    /// Remove `capability` from the explicit grant set of `address`.
    ///
    /// Role-derived defaults are untouched: the engine merges defaults back
    /// in on every read, so revoking a role-covered capability does not
    /// remove the actor's ability to use it (see DESIGN.md).  No-ops when
    /// the grant is not present.
    pub fn revoke(&self, address: &Address, capability: Capability, now: DateTime<Utc>) {
        let mut inner = self.lock();
        let removed = inner
            .actors
            .get_mut(address)
            .map(|r| r.grants.remove(&capability))
            .unwrap_or(false);
        if removed {
            info!(address = %address, capability = %capability, "capability revoked");
            inner.events.push(LedgerEvent::CapabilityRevoked {
                address: address.clone(),
                capability,
                timestamp: now,
            });
        }
    }

    /// Current actor snapshot for `address`.
    ///
    /// Always succeeds: an address the ledger has never seen is still an
    /// identified party (it can claim and flag), just with no role and no
    /// grants.  The snapshot reflects every grant/revoke recorded before
    /// this call – the ledger performs no caching that could go stale.
    pub fn snapshot_actor(&self, address: &Address) -> Actor {
        let inner = self.lock();
        let record = inner.actors.get(address).cloned().unwrap_or_default();
        Actor {
            address: Some(address.clone()),
            role: record.role,
            grants: record.grants,
        }
    }

    // ── Assets ───────────────────────────────────────────────────────────

    /// Record a freshly minted asset at version 0 together with its mint
    /// event(s).
    pub fn insert_asset(&self, asset: Asset, events: Vec<LedgerEvent>) -> u64 {
        let mut inner = self.lock();
        debug!(asset = %asset.id, "asset recorded");
        inner.assets.insert(
            asset.id,
            VersionedAsset {
                asset,
                version: 0,
            },
        );
        for event in events {
            Self::apply_event(&mut inner, event);
        }
        0
    }

    /// Current asset snapshot and its version.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AssetNotFound`] for unknown ids.
    pub fn snapshot_asset(&self, id: AssetId) -> Result<(Asset, u64), LedgerError> {
        let inner = self.lock();
        inner
            .assets
            .get(&id)
            .map(|v| (v.asset.clone(), v.version))
            .ok_or(LedgerError::AssetNotFound(id))
    }

    /// Commit an updated asset produced by the transition gate.
    ///
    /// `expected_version` must match the version returned by the
    /// [`snapshot_asset`](Self::snapshot_asset) call the gate ran against;
    /// otherwise the commit is rejected with
    /// [`LedgerError::VersionConflict`] and nothing is applied.  Returns
    /// the new version.
    pub fn commit_asset(
        &self,
        asset: Asset,
        expected_version: u64,
        events: Vec<LedgerEvent>,
    ) -> Result<u64, LedgerError> {
        let mut inner = self.lock();
        let stored = inner
            .assets
            .get_mut(&asset.id)
            .ok_or(LedgerError::AssetNotFound(asset.id))?;
        if stored.version != expected_version {
            return Err(LedgerError::VersionConflict {
                asset_id: asset.id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        stored.version += 1;
        let new_version = stored.version;
        info!(asset = %asset.id, version = new_version, state = %asset.state, "asset committed");
        stored.asset = asset;
        for event in events {
            Self::apply_event(&mut inner, event);
        }
        Ok(new_version)
    }

    fn apply_event(inner: &mut Inner, event: LedgerEvent) {
        match &event {
            LedgerEvent::AssetFlagged(record) => {
                inner.open_flags.push(record.clone());
            }
            LedgerEvent::FlagResolved { asset_id, kind, .. } => {
                // Quarantine extends the investigation: the flag stays open
                // and keeps its place in the triage queue.
                if *kind != ResolutionKind::Quarantine {
                    inner.open_flags.retain(|f| f.asset_id != *asset_id);
                }
            }
            _ => {}
        }
        inner.events.push(event);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// All currently open flags, oldest first.  Feeds the triage queue.
    pub fn open_flags(&self) -> Vec<FlagRecord> {
        let mut flags = self.lock().open_flags.clone();
        flags.sort_by_key(|f| f.flagged_at);
        flags
    }

    /// The full event log in commit order.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.lock().events.clone()
    }

    /// All asset snapshots, in no particular order.
    pub fn assets(&self) -> Vec<Asset> {
        self.lock().assets.values().map(|v| v.asset.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritag_authz::engine;
    use veritag_lifecycle::LifecycleGate;
    use veritag_types::{Capability, Resolution, ResolutionKind, TransitionAction};

    fn maker(ledger: &MemoryLedger) -> Actor {
        let addr = Address::from("0xfab");
        ledger.register_actor(addr.clone(), Some(Role::Manufacturer));
        ledger.snapshot_actor(&addr)
    }

    #[test]
    fn unknown_address_is_an_identified_blank_actor() {
        let ledger = MemoryLedger::new();
        let actor = ledger.snapshot_actor(&Address::from("0xnobody"));
        assert!(actor.is_identified());
        assert!(actor.role.is_none());
        assert!(actor.grants.is_empty());
    }

    #[test]
    fn grant_is_visible_on_the_next_snapshot() {
        let ledger = MemoryLedger::new();
        let addr = Address::from("0xshop");
        ledger.register_actor(addr.clone(), Some(Role::Retailer));
        assert!(!engine::can_perform(&ledger.snapshot_actor(&addr), Capability::Resolve));

        ledger.grant(&addr, Capability::Resolve, Utc::now());
        assert!(engine::can_perform(&ledger.snapshot_actor(&addr), Capability::Resolve));
    }

    #[test]
    fn revoke_only_shrinks_the_explicit_set() {
        let ledger = MemoryLedger::new();
        let addr = Address::from("0xcop");
        ledger.register_actor(addr.clone(), Some(Role::LawEnforcement));
        ledger.grant(&addr, Capability::Flag, Utc::now());

        // Revoking FLAG empties the explicit set, but the role default
        // still confers it on the next read – the union-only merge.
        ledger.revoke(&addr, Capability::Flag, Utc::now());
        let actor = ledger.snapshot_actor(&addr);
        assert!(actor.grants.is_empty());
        assert!(engine::can_perform(&actor, Capability::Flag));
    }

    #[test]
    fn revoke_of_absent_grant_is_a_silent_noop() {
        let ledger = MemoryLedger::new();
        let addr = Address::from("0xghost");
        ledger.revoke(&addr, Capability::Mint, Utc::now());
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn duplicate_grant_emits_one_event() {
        let ledger = MemoryLedger::new();
        let addr = Address::from("0xshop");
        ledger.grant(&addr, Capability::Resolve, Utc::now());
        ledger.grant(&addr, Capability::Resolve, Utc::now());
        let grants: Vec<_> = ledger
            .events()
            .into_iter()
            .filter(|e| matches!(e, LedgerEvent::CapabilityGranted { .. }))
            .collect();
        assert_eq!(grants.len(), 1);
    }

    #[test]
    fn snapshot_of_unknown_asset_is_not_found() {
        let ledger = MemoryLedger::new();
        let err = ledger.snapshot_asset(AssetId::new()).unwrap_err();
        assert!(matches!(err, LedgerError::AssetNotFound(_)));
    }

    #[test]
    fn mint_insert_snapshot_roundtrip() {
        let ledger = MemoryLedger::new();
        let gate = LifecycleGate::new();
        let outcome = gate.mint(&maker(&ledger), "ipfs://sku-9", Utc::now()).unwrap();
        let id = outcome.asset.id;
        ledger.insert_asset(outcome.asset.clone(), outcome.events);

        let (stored, version) = ledger.snapshot_asset(id).unwrap();
        assert_eq!(stored, outcome.asset);
        assert_eq!(version, 0);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn stale_commit_is_rejected_with_version_conflict() {
        let ledger = MemoryLedger::new();
        let gate = LifecycleGate::new();
        let actor = maker(&ledger);
        let minted = gate.mint(&actor, "ipfs://sku-9", Utc::now()).unwrap();
        ledger.insert_asset(minted.asset.clone(), minted.events);

        // Two writers read the same snapshot …
        let (snap_a, v_a) = ledger.snapshot_asset(minted.asset.id).unwrap();
        let (snap_b, v_b) = ledger.snapshot_asset(minted.asset.id).unwrap();

        let flag = TransitionAction::Flag {
            reason: "duplicate serial spotted".to_string(),
        };
        let reporter = ledger.snapshot_actor(&Address::from("0xwitness"));
        let out_a = gate.transition(&snap_a, &flag, &reporter, Utc::now()).unwrap();
        let out_b = gate.transition(&snap_b, &flag, &reporter, Utc::now()).unwrap();

        // … only the first commit lands.
        ledger.commit_asset(out_a.asset, v_a, out_a.events).unwrap();
        let err = ledger.commit_asset(out_b.asset, v_b, out_b.events).unwrap_err();
        assert!(matches!(err, LedgerError::VersionConflict { .. }));

        // The losing flag was not applied: one open flag, not two.
        assert_eq!(ledger.open_flags().len(), 1);
    }

    #[test]
    fn resolving_closes_the_open_flag_except_quarantine() {
        let ledger = MemoryLedger::new();
        let gate = LifecycleGate::new();
        let actor = maker(&ledger);
        let minted = gate.mint(&actor, "ipfs://sku-9", Utc::now()).unwrap();
        let id = minted.asset.id;
        ledger.insert_asset(minted.asset, minted.events);

        let reporter = ledger.snapshot_actor(&Address::from("0xwitness"));
        let (snap, v) = ledger.snapshot_asset(id).unwrap();
        let out = gate
            .transition(
                &snap,
                &TransitionAction::Flag {
                    reason: "tag failed NFC challenge".to_string(),
                },
                &reporter,
                Utc::now(),
            )
            .unwrap();
        let v = ledger.commit_asset(out.asset, v, out.events).unwrap();
        assert_eq!(ledger.open_flags().len(), 1);

        ledger.register_actor(Address::from("0xcop"), Some(Role::LawEnforcement));
        let resolver = ledger.snapshot_actor(&Address::from("0xcop"));
        let (snap, _) = ledger.snapshot_asset(id).unwrap();

        // Quarantine keeps the flag open.
        let quarantine = gate
            .transition(
                &snap,
                &TransitionAction::Resolve(Resolution {
                    kind: ResolutionKind::Quarantine,
                    notes: "awaiting lab verification of the tag".to_string(),
                    ack_irreversible: false,
                }),
                &resolver,
                Utc::now(),
            )
            .unwrap();
        let v = ledger.commit_asset(quarantine.asset, v, quarantine.events).unwrap();
        assert_eq!(ledger.open_flags().len(), 1);

        // Clear closes it.
        let (snap, _) = ledger.snapshot_asset(id).unwrap();
        let clear = gate
            .transition(
                &snap,
                &TransitionAction::Resolve(Resolution {
                    kind: ResolutionKind::Clear,
                    notes: "lab confirmed the tag is genuine".to_string(),
                    ack_irreversible: false,
                }),
                &resolver,
                Utc::now(),
            )
            .unwrap();
        ledger.commit_asset(clear.asset, v, clear.events).unwrap();
        assert!(ledger.open_flags().is_empty());
    }

    #[test]
    fn open_flags_are_ordered_oldest_first() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let old = FlagRecord {
            asset_id: AssetId::new(),
            flagged_by: Address::from("0xa"),
            flagged_at: now - chrono::Duration::hours(10),
            reason: "older".to_string(),
        };
        let new = FlagRecord {
            asset_id: AssetId::new(),
            flagged_by: Address::from("0xb"),
            flagged_at: now,
            reason: "newer".to_string(),
        };
        {
            let mut inner = ledger.lock();
            MemoryLedger::apply_event(&mut inner, LedgerEvent::AssetFlagged(new.clone()));
            MemoryLedger::apply_event(&mut inner, LedgerEvent::AssetFlagged(old.clone()));
        }
        let flags = ledger.open_flags();
        assert_eq!(flags[0].reason, "older");
        assert_eq!(flags[1].reason, "newer");
    }
}
