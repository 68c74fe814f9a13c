//! `veritag-types` – shared domain types for the veritag core.
//!
//! Everything that crosses a crate boundary lives here: the permission
//! atoms ([`Capability`]) and role badges ([`Role`]) consumed by
//! `veritag-authz`, the asset record and lifecycle states consumed by
//! `veritag-lifecycle`, the flag/resolution records consumed by
//! `veritag-triage`, the [`LedgerEvent`] union emitted toward the ledger
//! collaborator, and the [`VeritagError`] taxonomy shared by all of them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities and roles
// ─────────────────────────────────────────────────────────────────────────────

/// An atomic permission an actor may hold.
///
/// Each capability gates exactly one lifecycle transition (see
/// `veritag-lifecycle`).  Capabilities are defined at compile time and
/// never created at runtime; their [`id`](Capability::id) is the stable
/// registry token used on the external ledger and must be treated as
/// opaque by callers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Capability {
    /// Create a new asset record.
    Mint,
    /// Bind a physical tag to a minted asset.
    Bind,
    /// Put a bound asset up for circulation.
    Activate,
    /// Take ownership of an activated asset.
    Claim,
    /// Report an asset as suspicious.
    Flag,
    /// Adjudicate a flagged asset.
    Resolve,
    /// Retire an asset at end of life.
    Recycle,
}

impl Capability {
    /// Stable opaque identifier as registered on the ledger.
    pub fn id(&self) -> &'static str {
        match self {
            Capability::Mint => "cap.mint",
            Capability::Bind => "cap.bind",
            Capability::Activate => "cap.activate",
            Capability::Claim => "cap.claim",
            Capability::Flag => "cap.flag",
            Capability::Resolve => "cap.resolve",
            Capability::Recycle => "cap.recycle",
        }
    }

    /// Display label.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Mint => "MINT",
            Capability::Bind => "BIND",
            Capability::Activate => "ACTIVATE",
            Capability::Claim => "CLAIM",
            Capability::Flag => "FLAG",
            Capability::Resolve => "RESOLVE",
            Capability::Recycle => "RECYCLE",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A set of capabilities.  `BTreeSet` keeps iteration order stable for
/// display and serialization.
pub type CapabilitySet = BTreeSet<Capability>;

/// A role badge an actor can hold.
///
/// Roles confer a default capability bundle (see
/// `veritag_authz::catalog::default_capabilities_for`).  At most one badge
/// is expected per actor in the current design.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Identity-verified consumer, verification tier 1.
    IdentityTier1,
    /// Identity-verified consumer, verification tier 2.
    IdentityTier2,
    /// Identity-verified consumer, verification tier 3.
    IdentityTier3,
    /// Produces and registers new assets.
    Manufacturer,
    /// Puts assets into circulation.
    Retailer,
    /// Government / military operator with the full bundle.
    Government,
    /// Law-enforcement investigator.
    LawEnforcement,
}

impl Role {
    /// Stable opaque identifier as registered on the ledger.
    pub fn id(&self) -> &'static str {
        match self {
            Role::IdentityTier1 => "role.identity_tier_1",
            Role::IdentityTier2 => "role.identity_tier_2",
            Role::IdentityTier3 => "role.identity_tier_3",
            Role::Manufacturer => "role.manufacturer",
            Role::Retailer => "role.retailer",
            Role::Government => "role.government",
            Role::LawEnforcement => "role.law_enforcement",
        }
    }

    /// Display label.
    pub fn name(&self) -> &'static str {
        match self {
            Role::IdentityTier1 => "identity_tier_1",
            Role::IdentityTier2 => "identity_tier_2",
            Role::IdentityTier3 => "identity_tier_3",
            Role::Manufacturer => "manufacturer",
            Role::Retailer => "retailer",
            Role::Government => "government",
            Role::LawEnforcement => "law_enforcement",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actors
// ─────────────────────────────────────────────────────────────────────────────

/// Stable external address identifying an actor (e.g. a wallet address).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Snapshot of an acting party: who they are, which badge they hold, and
/// which capabilities were granted to them directly.
///
/// The explicit grant set is whatever the ledger currently records for the
/// address; revocation removes entries from it directly, so there is no
/// separate revoke list.  Effective capabilities are computed per call by
/// `veritag_authz::engine` and never cached here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    /// External address; `None` for an unidentified (not connected) party.
    pub address: Option<Address>,
    /// Role badge, at most one.
    pub role: Option<Role>,
    /// Capabilities granted directly, independent of role.
    pub grants: CapabilitySet,
}

impl Actor {
    /// An unidentified party with no role and no grants.
    pub fn anonymous() -> Self {
        Self {
            address: None,
            role: None,
            grants: CapabilitySet::new(),
        }
    }

    /// An identified party with no role and no grants.
    pub fn identified(address: impl Into<Address>) -> Self {
        Self {
            address: Some(address.into()),
            role: None,
            grants: CapabilitySet::new(),
        }
    }

    /// Attach a role badge.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Attach an explicit grant.
    pub fn with_grant(mut self, capability: Capability) -> Self {
        self.grants.insert(capability);
        self
    }

    /// Whether the party is identified (connected with a non-null address).
    pub fn is_identified(&self) -> bool {
        self.address.is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assets and lifecycle states
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier of an asset record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an asset record.
///
/// Ordered by typical flow, not strictly linear: `Flagged` is reachable
/// from most states, and resolution can send the asset back to the state
/// it held before flagging.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    /// Record created by a manufacturer; no physical tag yet.
    Minted,
    /// A physical tag is bound to the record.
    Bound,
    /// In circulation, claimable by consumers.
    Activated,
    /// Owned by a consumer.
    Claimed,
    /// Reported suspicious; held pending adjudication.
    Flagged,
    /// Decommissioned by a resolver; awaiting recycling.
    Decommissioned,
    /// Terminal: retired from circulation.
    Recycled,
}

impl AssetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetState::Minted => "minted",
            AssetState::Bound => "bound",
            AssetState::Activated => "activated",
            AssetState::Claimed => "claimed",
            AssetState::Flagged => "flagged",
            AssetState::Decommissioned => "decommissioned",
            AssetState::Recycled => "recycled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "minted" => Some(AssetState::Minted),
            "bound" => Some(AssetState::Bound),
            "activated" => Some(AssetState::Activated),
            "claimed" => Some(AssetState::Claimed),
            "flagged" => Some(AssetState::Flagged),
            "decommissioned" => Some(AssetState::Decommissioned),
            "recycled" => Some(AssetState::Recycled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The tracked physical-item record.
///
/// Created by a MINT transition, mutated only through legal state
/// transitions, never deleted.  `pre_flag_state` remembers the single
/// state held immediately before entering [`AssetState::Flagged`] so a
/// CLEAR resolution can restore it; there is no history stack, which is
/// why flagging an already-flagged asset is illegal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Asset {
    pub id: AssetId,
    /// Current owner's address.
    pub owner: Address,
    /// Current lifecycle state.
    pub state: AssetState,
    /// State held immediately before flagging; `Some` only while flagged.
    pub pre_flag_state: Option<AssetState>,
    /// Opaque identifier of the bound physical tag, once bound.
    pub tag_binding: Option<String>,
    /// Reference to off-ledger metadata (content hash or URI).
    pub metadata_ref: String,
    pub created_at: DateTime<Utc>,
    /// Bumped on every transition; display proxy for "time entered
    /// current state" where no event-log timestamp is available.
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Flags and resolutions
// ─────────────────────────────────────────────────────────────────────────────

/// Record created when an asset transitions into [`AssetState::Flagged`].
///
/// Consumed by the triage engine (queue ordering) and by the resolution
/// flow; conceptually closed when a resolution is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlagRecord {
    pub asset_id: AssetId,
    pub flagged_by: Address,
    pub flagged_at: DateTime<Utc>,
    pub reason: String,
}

/// Outcome kind when adjudicating a flagged asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    /// Return the asset to the state it held before flagging.
    Clear,
    /// Keep the asset held; extend the investigation.
    Quarantine,
    /// Irreversible: move the asset toward recycling.
    Decommission,
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionKind::Clear => write!(f, "clear"),
            ResolutionKind::Quarantine => write!(f, "quarantine"),
            ResolutionKind::Decommission => write!(f, "decommission"),
        }
    }
}

/// A resolver's adjudication of a flagged asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub kind: ResolutionKind,
    /// Free-text justification; minimum length enforced by the gate.
    pub notes: String,
    /// Explicit irreversibility acknowledgement, required for
    /// [`ResolutionKind::Decommission`].
    #[serde(default)]
    pub ack_irreversible: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transition actions
// ─────────────────────────────────────────────────────────────────────────────

/// A requested lifecycle transition, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", content = "payload", rename_all = "UPPERCASE")]
pub enum TransitionAction {
    /// Create a new asset record (no source state).
    Mint,
    /// Bind a physical tag to the record.
    Bind { tag_id: String },
    /// Put the asset into circulation.
    Activate,
    /// Take ownership.
    Claim,
    /// Report the asset; opens a [`FlagRecord`].
    Flag { reason: String },
    /// Adjudicate a flagged asset.
    Resolve(Resolution),
    /// Retire the asset.
    Recycle,
}

impl TransitionAction {
    /// Action label used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TransitionAction::Mint => "MINT",
            TransitionAction::Bind { .. } => "BIND",
            TransitionAction::Activate => "ACTIVATE",
            TransitionAction::Claim => "CLAIM",
            TransitionAction::Flag { .. } => "FLAG",
            TransitionAction::Resolve(_) => "RESOLVE",
            TransitionAction::Recycle => "RECYCLE",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger events
// ─────────────────────────────────────────────────────────────────────────────

/// Closed union of the records the core emits toward the ledger and the
/// presentation layer.  Each kind carries its own payload shape; there is
/// deliberately no generic record with optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// An asset moved between lifecycle states.
    StateChanged {
        asset_id: AssetId,
        /// `None` for the mint transition.
        previous_state: Option<AssetState>,
        new_state: AssetState,
        actor: Address,
        timestamp: DateTime<Utc>,
    },
    /// An asset was flagged; the triage queue gains an entry.
    AssetFlagged(FlagRecord),
    /// A flagged asset was adjudicated.
    FlagResolved {
        asset_id: AssetId,
        resolver: Address,
        kind: ResolutionKind,
        notes: String,
        timestamp: DateTime<Utc>,
    },
    /// A capability was granted directly to an address.
    CapabilityGranted {
        address: Address,
        capability: Capability,
        timestamp: DateTime<Utc>,
    },
    /// A capability was removed from an address's explicit grant set.
    CapabilityRevoked {
        address: Address,
        capability: Capability,
        timestamp: DateTime<Utc>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Error taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// Core error type spanning catalog lookups, authorization rejections, and
/// lifecycle violations.
///
/// All variants are deterministic and locally detectable; they are
/// returned to the immediate caller and never retried internally, since
/// retrying cannot succeed without a change in inputs.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VeritagError {
    /// Unknown capability or role name requested from a catalog.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// The requested action is not legal from the asset's current state.
    #[error("Illegal Transition: {action} from {from:?}")]
    IllegalTransition {
        /// `None` when the action was MINT against an existing record.
        from: Option<AssetState>,
        action: String,
    },

    /// The actor's effective capability set does not include the required
    /// capability, and the action is not a public carve-out.
    #[error("Capability Denied: {0:?}")]
    Unauthorized(Capability),

    /// Malformed transition input (notes too short, missing
    /// irreversibility acknowledgement, …).
    #[error("Validation Failed: {0}")]
    Validation(String),
}
