//! C6/C7: the Flight and Weather Aggregators. Both implement the same
//! cache-check -> fan-out fetch -> resolve -> cache-write pipeline (spec
//! §4.5/§4.6) over their respective source and canonical-record types.

pub mod flight_aggregator;
pub mod weather_aggregator;

pub use flight_aggregator::FlightAggregator;
pub use weather_aggregator::WeatherAggregator;

use crate::domain::Conflict;

/// The outcome of one aggregator invocation for one key (spec §4.5 step 7).
#[derive(Debug, Clone)]
pub struct AggregationResult<T> {
    pub data: T,
    pub from_cache: bool,
    pub sources_used: Vec<String>,
    pub conflicts: Vec<Conflict>,
    pub quality_score: f64,
    pub processing_time_ms: u64,
}
