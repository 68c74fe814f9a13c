//! The legal-transition table and per-action capability gates.
//!
//! | From | Action | To | Gate |
//! |------|--------|----|------|
//! | — | MINT | minted | MINT |
//! | minted | BIND | bound | BIND |
//! | bound | ACTIVATE | activated | ACTIVATE |
//! | activated, bound | CLAIM | claimed | public |
//! | minted, bound, activated, claimed | FLAG | flagged | public |
//! | flagged | RESOLVE(clear) | pre-flag state | RESOLVE |
//! | flagged | RESOLVE(quarantine) | flagged (held) | RESOLVE |
//! | flagged | RESOLVE(decommission) | decommissioned | RESOLVE |
//! | claimed, decommissioned | RECYCLE | recycled | RECYCLE |
//!
//! Flagging an already-flagged asset is illegal: only one pre-flag state
//! is remembered, so the open flag must be resolved first.

use veritag_types::{AssetState, Capability, TransitionAction};

/// What a transition demands of the acting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The actor's effective capability set must contain this capability.
    Capability(Capability),
    /// Any identified (connected) actor may invoke the transition.
    Public,
}

/// The gate guarding each action.
///
/// CLAIM and FLAG are the two public carve-outs; everything else requires
/// the matching capability.
pub fn required_gate(action: &TransitionAction) -> Gate {
    match action {
        TransitionAction::Mint => Gate::Capability(Capability::Mint),
        TransitionAction::Bind { .. } => Gate::Capability(Capability::Bind),
        TransitionAction::Activate => Gate::Capability(Capability::Activate),
        TransitionAction::Claim => Gate::Public,
        TransitionAction::Flag { .. } => Gate::Public,
        TransitionAction::Resolve(_) => Gate::Capability(Capability::Resolve),
        TransitionAction::Recycle => Gate::Capability(Capability::Recycle),
    }
}

/// Whether `action` is legal from `from` per the table above.
///
/// `from` is `None` only for MINT, which creates the record; every other
/// action requires an existing state.
pub fn is_legal(from: Option<AssetState>, action: &TransitionAction) -> bool {
    match (from, action) {
        (None, TransitionAction::Mint) => true,
        (None, _) | (Some(_), TransitionAction::Mint) => false,
        (Some(state), action) => {
            let sources: &[AssetState] = match action {
                TransitionAction::Mint => unreachable!("handled above"),
                TransitionAction::Bind { .. } => &[AssetState::Minted],
                TransitionAction::Activate => &[AssetState::Bound],
                TransitionAction::Claim => &[AssetState::Activated, AssetState::Bound],
                TransitionAction::Flag { .. } => &[
                    AssetState::Minted,
                    AssetState::Bound,
                    AssetState::Activated,
                    AssetState::Claimed,
                ],
                TransitionAction::Resolve(_) => &[AssetState::Flagged],
                TransitionAction::Recycle => {
                    &[AssetState::Claimed, AssetState::Decommissioned]
                }
            };
            sources.contains(&state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritag_types::{Resolution, ResolutionKind};

    const ALL_STATES: [AssetState; 7] = [
        AssetState::Minted,
        AssetState::Bound,
        AssetState::Activated,
        AssetState::Claimed,
        AssetState::Flagged,
        AssetState::Decommissioned,
        AssetState::Recycled,
    ];

    fn resolve(kind: ResolutionKind) -> TransitionAction {
        TransitionAction::Resolve(Resolution {
            kind,
            notes: "notes long enough to pass validation".to_string(),
            ack_irreversible: true,
        })
    }

    fn sample_actions() -> Vec<TransitionAction> {
        vec![
            TransitionAction::Mint,
            TransitionAction::Bind {
                tag_id: "nfc-0001".to_string(),
            },
            TransitionAction::Activate,
            TransitionAction::Claim,
            TransitionAction::Flag {
                reason: "serial mismatch".to_string(),
            },
            resolve(ResolutionKind::Clear),
            TransitionAction::Recycle,
        ]
    }

    #[test]
    fn mint_is_only_legal_without_a_source_state() {
        assert!(is_legal(None, &TransitionAction::Mint));
        for state in ALL_STATES {
            assert!(!is_legal(Some(state), &TransitionAction::Mint));
        }
    }

    #[test]
    fn nothing_but_mint_is_legal_without_a_source_state() {
        for action in sample_actions() {
            if !matches!(action, TransitionAction::Mint) {
                assert!(!is_legal(None, &action), "{} must need a state", action.name());
            }
        }
    }

    #[test]
    fn legality_matches_the_table_exactly() {
        for state in ALL_STATES {
            for action in sample_actions() {
                let expected = match (&action, state) {
                    (TransitionAction::Bind { .. }, AssetState::Minted) => true,
                    (TransitionAction::Activate, AssetState::Bound) => true,
                    (TransitionAction::Claim, AssetState::Activated | AssetState::Bound) => true,
                    (
                        TransitionAction::Flag { .. },
                        AssetState::Minted
                        | AssetState::Bound
                        | AssetState::Activated
                        | AssetState::Claimed,
                    ) => true,
                    (TransitionAction::Resolve(_), AssetState::Flagged) => true,
                    (
                        TransitionAction::Recycle,
                        AssetState::Claimed | AssetState::Decommissioned,
                    ) => true,
                    _ => false,
                };
                assert_eq!(
                    is_legal(Some(state), &action),
                    expected,
                    "{} from {state}",
                    action.name()
                );
            }
        }
    }

    #[test]
    fn flagging_a_flagged_asset_is_illegal() {
        let flag = TransitionAction::Flag {
            reason: "second report".to_string(),
        };
        assert!(!is_legal(Some(AssetState::Flagged), &flag));
    }

    #[test]
    fn recycled_is_terminal() {
        for action in sample_actions() {
            assert!(!is_legal(Some(AssetState::Recycled), &action));
        }
    }

    #[test]
    fn all_resolution_kinds_share_the_same_source_state() {
        for kind in [
            ResolutionKind::Clear,
            ResolutionKind::Quarantine,
            ResolutionKind::Decommission,
        ] {
            assert!(is_legal(Some(AssetState::Flagged), &resolve(kind)));
            assert!(!is_legal(Some(AssetState::Claimed), &resolve(kind)));
        }
    }

    #[test]
    fn claim_and_flag_are_public_gates() {
        assert_eq!(required_gate(&TransitionAction::Claim), Gate::Public);
        assert_eq!(
            required_gate(&TransitionAction::Flag {
                reason: "x".to_string()
            }),
            Gate::Public
        );
    }

    #[test]
    fn capability_gates_match_their_actions() {
        assert_eq!(
            required_gate(&TransitionAction::Mint),
            Gate::Capability(Capability::Mint)
        );
        assert_eq!(
            required_gate(&TransitionAction::Bind {
                tag_id: "t".to_string()
            }),
            Gate::Capability(Capability::Bind)
        );
        assert_eq!(
            required_gate(&TransitionAction::Activate),
            Gate::Capability(Capability::Activate)
        );
        assert_eq!(
            required_gate(&resolve(ResolutionKind::Clear)),
            Gate::Capability(Capability::Resolve)
        );
        assert_eq!(
            required_gate(&TransitionAction::Recycle),
            Gate::Capability(Capability::Recycle)
        );
    }
}
