//! CanonicalFlight: the source-agnostic, merged flight status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CoreError, Result};
use super::provenance::SourceContribution;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    OnTime,
    Delayed,
    Cancelled,
    Diverted,
    Landed,
    Unknown,
}

impl FlightStatus {
    /// Whether delay fields must be zero/absent for this status (spec
    /// invariant (b)).
    pub fn forbids_delay(&self) -> bool {
        matches!(self, FlightStatus::OnTime | FlightStatus::Landed)
    }
}

impl Default for FlightStatus {
    fn default() -> Self {
        FlightStatus::Unknown
    }
}

/// The merged, canonical representation of one flight's status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFlight {
    pub flight_number: String,
    pub scheduled_departure_utc: DateTime<Utc>,
    pub origin_iata: String,
    pub destination_iata: String,

    pub flight_status: FlightStatus,
    pub departure_delay_minutes: Option<u32>,
    pub arrival_delay_minutes: Option<u32>,
    pub actual_departure_utc: Option<DateTime<Utc>>,
    pub actual_arrival_utc: Option<DateTime<Utc>>,

    pub source_contributions: Vec<SourceContribution>,
    pub data_quality_score: f64,
    pub last_updated_utc: DateTime<Utc>,
}

impl CanonicalFlight {
    /// Construct a single-source record (what a Source Client returns from
    /// `fetch`, before resolution). Quality and provenance are filled in by
    /// the caller or the Conflict Resolver.
    #[allow(clippy::too_many_arguments)]
    pub fn single_source(
        flight_number: impl Into<String>,
        scheduled_departure_utc: DateTime<Utc>,
        origin_iata: impl Into<String>,
        destination_iata: impl Into<String>,
        flight_status: FlightStatus,
        departure_delay_minutes: Option<u32>,
        arrival_delay_minutes: Option<u32>,
        contribution: SourceContribution,
    ) -> Self {
        let now = contribution.observed_at_utc;
        Self {
            flight_number: flight_number.into(),
            scheduled_departure_utc,
            origin_iata: origin_iata.into(),
            destination_iata: destination_iata.into(),
            flight_status,
            departure_delay_minutes,
            arrival_delay_minutes,
            actual_departure_utc: None,
            actual_arrival_utc: None,
            data_quality_score: contribution.confidence,
            source_contributions: vec![contribution],
            last_updated_utc: now,
        }
    }

    /// Validate the identity and delay-field invariants from spec §3.
    pub fn validate(&self) -> Result<()> {
        if self.flight_number.trim().is_empty() {
            return Err(CoreError::invalid_record("flightNumber must not be empty"));
        }
        if self.origin_iata.trim().is_empty() || self.destination_iata.trim().is_empty() {
            return Err(CoreError::invalid_record(
                "originIATA and destinationIATA must not be empty",
            ));
        }
        if self.flight_status.forbids_delay() {
            let bad = self.departure_delay_minutes.unwrap_or(0) > 0
                || self.arrival_delay_minutes.unwrap_or(0) > 0;
            if bad {
                return Err(CoreError::invalid_record(format!(
                    "status {:?} cannot carry a nonzero delay",
                    self.flight_status
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.data_quality_score) {
            return Err(CoreError::invalid_record(
                "dataQualityScore must be within [0, 1]",
            ));
        }
        Ok(())
    }

    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}",
            self.flight_number,
            self.scheduled_departure_utc.date_naive()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contrib() -> SourceContribution {
        SourceContribution::new("test-source", 0.9, vec!["flightStatus".into()], Utc::now())
    }

    #[test]
    fn validate_rejects_empty_flight_number() {
        let f = CanonicalFlight::single_source(
            "",
            Utc.with_ymd_and_hms(2025, 12, 15, 10, 0, 0).unwrap(),
            "JFK",
            "LAX",
            FlightStatus::OnTime,
            None,
            None,
            contrib(),
        );
        assert!(f.validate().is_err());
    }

    #[test]
    fn validate_rejects_delay_on_on_time_status() {
        let f = CanonicalFlight::single_source(
            "UA456",
            Utc.with_ymd_and_hms(2025, 12, 15, 10, 0, 0).unwrap(),
            "JFK",
            "LAX",
            FlightStatus::OnTime,
            Some(15),
            None,
            contrib(),
        );
        assert!(f.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_delayed_record() {
        let f = CanonicalFlight::single_source(
            "UA456",
            Utc.with_ymd_and_hms(2025, 12, 15, 10, 0, 0).unwrap(),
            "JFK",
            "LAX",
            FlightStatus::Delayed,
            Some(45),
            Some(40),
            contrib(),
        );
        assert!(f.validate().is_ok());
    }
}
