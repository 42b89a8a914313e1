//! C3/C4: the Source Client Contract and the Source Router that selects
//! among its implementors.

pub mod contract;
pub mod fixtures;
pub mod router;

pub use contract::{FetchOutcome, SourceClient};
pub use fixtures::{FixtureFlightSource, FixtureWeatherSource};
pub use router::{CooldownPolicy, SourceRouter};
