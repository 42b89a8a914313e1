//! C10 Payout Engine: an idempotent per-policy payout state machine driving
//! escrow release and ledger writes (spec §4.9).

pub mod engine;
pub mod eligibility;

pub use engine::{PayoutEngine, PayoutSummary, PerPolicyResult};
pub use eligibility::{check_eligibility, EligibilityError};
