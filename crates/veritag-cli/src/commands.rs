//! Operator command implementations.
//!
//! Each command returns `Err(String)` with a human-readable message on
//! failure; `main` prints it in red and exits non-zero.

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use tracing::info;
use veritag_authz::{catalog, engine};
use veritag_ledger::MemoryLedger;
use veritag_lifecycle::LifecycleGate;
use veritag_triage::{Priority, TriagedFlag, triage};
use veritag_types::{
    Actor, Address, FlagRecord, Resolution, ResolutionKind, Role, TransitionAction,
};

use crate::config::Config;

/// `veritag init` – write a default config file if none exists.
pub fn init() -> Result<(), String> {
    let path = crate::config::config_path();
    if path.exists() {
        println!("  Config already present at {}", path.display().to_string().bold());
        return Ok(());
    }
    crate::config::save(&Config::default())?;
    println!("  Default config written to {}", path.display().to_string().bold());
    Ok(())
}

/// `veritag capabilities` – list the capability catalog.
pub fn capabilities() -> Result<(), String> {
    println!("{}", "Capability catalog".bold());
    for cap in catalog::list_capabilities() {
        println!("  {:<10} {}", cap.name().bold(), cap.id().dimmed());
    }
    Ok(())
}

/// `veritag roles` – list the role catalog with default capability sets.
pub fn roles() -> Result<(), String> {
    println!("{}", "Role catalog".bold());
    for role in catalog::list_roles() {
        let caps: Vec<&str> = catalog::default_capabilities_for(*role)
            .into_iter()
            .map(|c| c.name())
            .collect();
        println!(
            "  {:<18} {}",
            role.name().bold(),
            caps.join(", ").dimmed()
        );
    }
    println!();
    println!(
        "  {} any identified actor may additionally CLAIM and FLAG.",
        "note:".yellow()
    );
    Ok(())
}

/// `veritag check <role|none> <capability>` – evaluate the authorization
/// engine for a hypothetical actor holding only the given badge.
pub fn check(args: &[String]) -> Result<(), String> {
    let [role_name, cap_name] = args else {
        return Err("usage: veritag check <role|none> <capability>".to_string());
    };
    let actor = actor_for_role_name(role_name)?;
    let capability = catalog::capability_by_name(cap_name).map_err(|e| e.to_string())?;

    let effective: Vec<&str> = engine::effective_capabilities(&actor)
        .into_iter()
        .map(|c| c.name())
        .collect();
    println!("  effective set: [{}]", effective.join(", ").dimmed());

    if engine::can_perform(&actor, capability) {
        println!("  {} {} may {}", "allowed".green().bold(), role_name, capability);
    } else {
        println!("  {} {} may not {}", "denied".red().bold(), role_name, capability);
    }
    Ok(())
}

/// `veritag triage <snapshot.json>` – print the ordered remediation queue
/// for a JSON array of flag records.
pub fn triage_queue(path: &str, cfg: &Config) -> Result<(), String> {
    let records = load_flags(Path::new(path))?;
    let thresholds = cfg.thresholds()?;
    let queue = triage(&records, Utc::now(), &thresholds);

    if queue.is_empty() {
        println!("  Remediation queue is empty.");
        return Ok(());
    }
    println!("{}", "Remediation queue".bold());
    for entry in &queue {
        print_queue_entry(entry);
    }
    Ok(())
}

fn print_queue_entry(entry: &TriagedFlag) {
    let tier = match entry.priority {
        Priority::High => "HIGH  ".red().bold(),
        Priority::Medium => "MEDIUM".yellow().bold(),
        Priority::Low => "LOW   ".green(),
    };
    println!(
        "  {} {:>7}  {}  {}",
        tier,
        entry.age,
        entry.record.asset_id,
        entry.record.reason.dimmed()
    );
}

/// Parse a JSON array of [`FlagRecord`]s from `path`.
pub(crate) fn load_flags(path: &Path) -> Result<Vec<FlagRecord>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn actor_for_role_name(name: &str) -> Result<Actor, String> {
    let actor = Actor::identified("0xoperator");
    if name.eq_ignore_ascii_case("none") {
        return Ok(actor);
    }
    let role = catalog::role_by_name(name).map_err(|e| e.to_string())?;
    Ok(actor.with_role(role))
}

/// `veritag demo` – scripted lifecycle run against the in-memory ledger:
/// mint → bind → activate → claim → flag → triage → clear.
pub fn demo(cfg: &Config) -> Result<(), String> {
    let ledger = MemoryLedger::new();
    let gate = LifecycleGate::new().with_min_resolution_notes(cfg.min_resolution_notes);
    let now = Utc::now();

    ledger.register_actor(Address::from("0xfab"), Some(Role::Manufacturer));
    ledger.register_actor(Address::from("0xshop"), Some(Role::Retailer));
    ledger.register_actor(Address::from("0xbuyer"), Some(Role::IdentityTier1));
    ledger.register_actor(Address::from("0xcop"), Some(Role::LawEnforcement));

    // Mint.
    let maker = ledger.snapshot_actor(&Address::from("0xfab"));
    let minted = gate
        .mint(&maker, "ipfs://demo-sku-0001", now)
        .map_err(|e| e.to_string())?;
    let id = minted.asset.id;
    ledger.insert_asset(minted.asset, minted.events);
    step(&format!("minted asset {id}"));

    // Bind, activate, claim, flag – each through snapshot + commit.
    let steps: [(&str, TransitionAction); 4] = [
        (
            "0xfab",
            TransitionAction::Bind {
                tag_id: "nfc-demo-0001".to_string(),
            },
        ),
        ("0xshop", TransitionAction::Activate),
        ("0xbuyer", TransitionAction::Claim),
        (
            "0xbuyer",
            TransitionAction::Flag {
                reason: "hologram does not match the registry".to_string(),
            },
        ),
    ];
    for (address, action) in steps {
        let actor = ledger.snapshot_actor(&Address::from(address));
        apply(&ledger, &gate, id, &action, &actor)?;
        step(&format!("{} by {address}", action.name()));
    }

    // The flag is now in the triage queue.
    let thresholds = cfg.thresholds()?;
    let queue = triage(&ledger.open_flags(), Utc::now(), &thresholds);
    println!("{}", "Remediation queue".bold());
    for entry in &queue {
        print_queue_entry(entry);
    }

    // An investigator clears the flag; the asset returns to claimed.
    let resolver = ledger.snapshot_actor(&Address::from("0xcop"));
    let clear = TransitionAction::Resolve(Resolution {
        kind: ResolutionKind::Clear,
        notes: "physical inspection confirmed the item is genuine".to_string(),
        ack_irreversible: false,
    });
    apply(&ledger, &gate, id, &clear, &resolver)?;
    step("flag cleared by 0xcop");

    let (asset, version) = ledger.snapshot_asset(id).map_err(|e| e.to_string())?;
    println!();
    println!(
        "  final state: {} (version {version}, owner {})",
        asset.state.to_string().bold(),
        asset.owner
    );
    println!("  {} events recorded.", ledger.events().len());
    Ok(())
}

/// Snapshot, run the gate, commit.  One transition at a time, so the
/// version read is always the version committed against.
fn apply(
    ledger: &MemoryLedger,
    gate: &LifecycleGate,
    id: veritag_types::AssetId,
    action: &TransitionAction,
    actor: &Actor,
) -> Result<(), String> {
    let (snapshot, version) = ledger.snapshot_asset(id).map_err(|e| e.to_string())?;
    let outcome = gate
        .transition(&snapshot, action, actor, Utc::now())
        .map_err(|e| e.to_string())?;
    ledger
        .commit_asset(outcome.asset, version, outcome.events)
        .map_err(|e| e.to_string())?;
    info!(asset = %id, action = action.name(), "demo transition committed");
    Ok(())
}

fn step(message: &str) {
    println!("  {} {message}", "✓".green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;
    use veritag_types::AssetId;

    #[test]
    fn load_flags_parses_a_json_snapshot() {
        let records = vec![FlagRecord {
            asset_id: AssetId::new(),
            flagged_by: Address::from("0xreporter"),
            flagged_at: Utc::now() - Duration::hours(30),
            reason: "serial number reused".to_string(),
        }];
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        file.write_all(serde_json::to_string(&records).unwrap().as_bytes())
            .expect("write");

        let loaded = load_flags(file.path()).expect("parse");
        assert_eq!(loaded, records);
    }

    #[test]
    fn load_flags_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        file.write_all(b"{ not json ]").expect("write");
        let err = load_flags(file.path()).unwrap_err();
        assert!(err.contains("Failed to parse"));
    }

    #[test]
    fn load_flags_reports_missing_file() {
        let err = load_flags(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }

    #[test]
    fn actor_for_role_name_accepts_none() {
        let actor = actor_for_role_name("none").expect("ok");
        assert!(actor.is_identified());
        assert!(actor.role.is_none());
    }

    #[test]
    fn actor_for_role_name_rejects_unknown_roles() {
        assert!(actor_for_role_name("sommelier").is_err());
    }

    #[test]
    fn demo_runs_end_to_end() {
        demo(&Config::default()).expect("demo must succeed");
    }
}
