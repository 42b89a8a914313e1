//! C1 Canonical Data Model: shared record shapes for flights, weather
//! observations, policies, escrows, payouts, and their provenance metadata.

pub mod error;
pub mod escrow;
pub mod flight;
pub mod payout;
pub mod policy;
pub mod provenance;
pub mod wallet;
pub mod weather;

pub use error::{CoreError, Result};
pub use escrow::{ChainProvider, Escrow, EscrowStatus};
pub use flight::{CanonicalFlight, FlightStatus};
pub use payout::{PayoutRecord, PayoutStatus};
pub use policy::{CoverageType, Policy, PolicyOwner, PolicyStatus, PolicyTerms};
pub use provenance::{freshness_decay, Conflict, ConflictingValue, SourceContribution};
pub use wallet::{UserWallet, WalletType};
pub use weather::{CanonicalWeatherObservation, Coordinates, WeatherCondition};
