//! `veritag-triage` – prioritization of flagged assets.
//!
//! Classifies assets stuck in the flagged state by how long they have been
//! open, driving remediation-queue ordering and escalation.  This feeds a
//! display queue that must never crash on bad data, so nothing here
//! returns an error: malformed timestamps clamp to zero age and the lowest
//! tier instead.
//!
//! # Modules
//!
//! - [`priority`] – the three-tier [`Priority`][priority::Priority]
//!   classification, operator-configurable
//!   [`TriageThresholds`][priority::TriageThresholds], and the
//!   `"Nh"` / `"Nd Mh"` age formatting.
//! - [`queue`] – the remediation-queue sort contract: priority first,
//!   oldest first within a tier.

pub mod priority;
pub mod queue;

pub use priority::{Priority, TriageThresholds, format_age, priority, time_open};
pub use queue::{TriagedFlag, sort_queue, triage};
