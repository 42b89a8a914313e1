//! Coverage-specific trigger predicates (spec §4.8). Each predicate is a
//! pure function over already-fetched canonical data; none of them touch
//! the network or the database.

use crate::domain::{CanonicalFlight, CanonicalWeatherObservation, CoverageType, FlightStatus, Policy};

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub reason: String,
    pub confidence: f64,
}

const DEFAULT_DELAY_THRESHOLD_MINUTES: u32 = 15;
const WEATHER_DELAY_FLOOR_MINUTES: u32 = 30;
const SEVERE_WIND_THRESHOLD_KMH: f64 = 50.0;

/// Evaluate `policy`'s coverage-specific predicate against the freshly
/// aggregated flight and weather data. Returns `None` when the predicate
/// does not fire.
pub fn evaluate(
    policy: &Policy,
    flight: &CanonicalFlight,
    weather: &[CanonicalWeatherObservation],
) -> Option<TriggerOutcome> {
    match policy.coverage_type {
        CoverageType::FlightDelay => flight_delay(policy, flight),
        CoverageType::FlightCancellation => flight_cancellation(flight),
        CoverageType::WeatherDisruption => weather_disruption(flight, weather),
    }
}

fn flight_delay(policy: &Policy, flight: &CanonicalFlight) -> Option<TriggerOutcome> {
    if flight.flight_status != FlightStatus::Delayed {
        return None;
    }
    let threshold = policy.delay_threshold_minutes(DEFAULT_DELAY_THRESHOLD_MINUTES);
    let actual = flight.departure_delay_minutes?;
    if actual < threshold {
        return None;
    }
    Some(TriggerOutcome {
        reason: format!(
            "Flight delayed by {actual} minutes, exceeding threshold of {threshold} minutes"
        ),
        confidence: 0.95,
    })
}

fn flight_cancellation(flight: &CanonicalFlight) -> Option<TriggerOutcome> {
    if flight.flight_status != FlightStatus::Cancelled {
        return None;
    }
    Some(TriggerOutcome {
        reason: format!("Flight {} was cancelled", flight.flight_number),
        confidence: 0.99,
    })
}

fn weather_disruption(
    flight: &CanonicalFlight,
    weather: &[CanonicalWeatherObservation],
) -> Option<TriggerOutcome> {
    if let Some(obs) = weather.iter().find(|o| o.is_severe()) {
        return Some(TriggerOutcome {
            reason: format!(
                "Severe weather condition {:?} observed near the flight route",
                obs.weather_condition
            ),
            confidence: 0.85,
        });
    }

    let delayed_enough = flight.flight_status == FlightStatus::Delayed
        && flight.departure_delay_minutes.unwrap_or(0) >= WEATHER_DELAY_FLOOR_MINUTES;
    if !delayed_enough {
        return None;
    }

    let secondary = weather
        .iter()
        .find(|o| o.wind_speed_kmh > SEVERE_WIND_THRESHOLD_KMH || o.is_severe());
    secondary.map(|obs| TriggerOutcome {
        reason: format!(
            "Flight delayed {} minutes with adverse weather ({:?}, wind {:.0} km/h) near the route",
            flight.departure_delay_minutes.unwrap_or(0),
            obs.weather_condition,
            obs.wind_speed_kmh
        ),
        confidence: 0.75,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, PolicyOwner, PolicyStatus, PolicyTerms, SourceContribution, WeatherCondition};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn contrib() -> SourceContribution {
        SourceContribution::new("test", 0.9, vec!["flightStatus".into()], Utc::now())
    }

    fn policy(coverage: CoverageType, threshold: Option<u32>) -> Policy {
        Policy {
            policy_id: Uuid::new_v4(),
            policy_number: "POL-1".into(),
            owner: PolicyOwner::User("u1".into()),
            coverage_type: coverage,
            coverage_amount: Decimal::new(100000, 2),
            premium: Decimal::new(1000, 2),
            payout_amount: Decimal::new(100000, 2),
            status: PolicyStatus::Active,
            expires_at: Utc::now() + Duration::days(1),
            flight_id: "UA456".into(),
            terms: PolicyTerms { delay_threshold_minutes: threshold },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn flight(status: FlightStatus, departure_delay: Option<u32>) -> CanonicalFlight {
        CanonicalFlight::single_source(
            "UA456",
            Utc.with_ymd_and_hms(2025, 12, 15, 10, 0, 0).unwrap(),
            "JFK",
            "LAX",
            status,
            departure_delay,
            departure_delay,
            contrib(),
        )
    }

    fn weather_obs(condition: WeatherCondition, wind_kmh: f64) -> CanonicalWeatherObservation {
        CanonicalWeatherObservation::single_source(
            Coordinates::new(40.64, -73.78),
            Some("JFK".into()),
            Utc::now(),
            10.0,
            wind_kmh,
            0.5,
            condition,
            contrib(),
        )
    }

    #[test]
    fn scenario_s5_delay_trigger_matches_exact_reason_string() {
        let p = policy(CoverageType::FlightDelay, Some(15));
        let f = flight(FlightStatus::Delayed, Some(45));

        let outcome = flight_delay(&p, &f).unwrap();
        assert_eq!(
            outcome.reason,
            "Flight delayed by 45 minutes, exceeding threshold of 15 minutes"
        );
        assert_eq!(outcome.confidence, 0.95);
    }

    #[test]
    fn delay_below_threshold_does_not_fire() {
        let p = policy(CoverageType::FlightDelay, Some(15));
        let f = flight(FlightStatus::Delayed, Some(10));
        assert!(flight_delay(&p, &f).is_none());
    }

    #[test]
    fn missing_threshold_defaults_to_15_minutes() {
        let p = policy(CoverageType::FlightDelay, None);
        let f = flight(FlightStatus::Delayed, Some(15));
        assert!(flight_delay(&p, &f).is_some());
    }

    #[test]
    fn cancellation_fires_with_high_confidence() {
        let f = flight(FlightStatus::Cancelled, None);
        let outcome = flight_cancellation(&f).unwrap();
        assert_eq!(outcome.confidence, 0.99);
    }

    #[test]
    fn severe_weather_condition_alone_fires_at_85_percent() {
        let f = flight(FlightStatus::OnTime, None);
        let w = vec![weather_obs(WeatherCondition::Thunderstorm, 10.0)];
        let outcome = weather_disruption(&f, &w).unwrap();
        assert_eq!(outcome.confidence, 0.85);
    }

    #[test]
    fn long_delay_plus_high_wind_fires_at_75_percent() {
        let f = flight(FlightStatus::Delayed, Some(35));
        let w = vec![weather_obs(WeatherCondition::Clear, 60.0)];
        let outcome = weather_disruption(&f, &w).unwrap();
        assert_eq!(outcome.confidence, 0.75);
    }

    #[test]
    fn short_delay_with_high_wind_does_not_fire() {
        let f = flight(FlightStatus::Delayed, Some(10));
        let w = vec![weather_obs(WeatherCondition::Clear, 60.0)];
        assert!(weather_disruption(&f, &w).is_none());
    }

    #[test]
    fn evaluate_dispatches_on_coverage_type() {
        let p = policy(CoverageType::FlightCancellation, None);
        let f = flight(FlightStatus::Cancelled, None);
        assert!(evaluate(&p, &f, &[]).is_some());
    }
}
