//! C11 Policy Monitor: the periodic scanner driving the Payout Engine
//! (spec §4.8).

pub mod policy_monitor;
pub mod predicates;

pub use policy_monitor::{PolicyMonitor, ScanReport, TriggeredPolicy};
pub use predicates::{evaluate, TriggerOutcome};
