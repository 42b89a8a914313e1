//! C5 Conflict Resolver: field-level merge of N provider responses into one
//! canonical record with a quality score.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    CanonicalFlight, CanonicalWeatherObservation, CoreError, Coordinates, Result,
    SourceContribution, WeatherCondition,
};
use crate::domain::provenance::{freshness_decay, Conflict, ConflictingValue};

/// Tunable merge parameters. Spec §4.4/§9 leaves the exact outlier threshold
/// and saturation point as implementation choices; both are surfaced here so
/// callers and tests can override them instead of hardcoding magic numbers.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// `N_target` in the quality-score formula: the source count at which
    /// `sum(reliability_i) / N_target` saturates to 1.0.
    pub quality_saturation_point: f64,
    /// Linear decay applied to `agreement_factor` per recorded conflict.
    pub agreement_decay_per_conflict: f64,
    /// Window over which a contribution's freshness decays to zero.
    pub freshness_window: Duration,
    /// Standard-deviation multiple beyond which a numeric outlier is
    /// dropped, only applied when at least three sources are present.
    pub outlier_std_dev_threshold: f64,
    /// Tolerance for identity timestamp agreement (spec: "±60s").
    pub identity_timestamp_tolerance: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            quality_saturation_point: 2.0,
            agreement_decay_per_conflict: 0.1,
            freshness_window: Duration::minutes(30),
            outlier_std_dev_threshold: 2.0,
            identity_timestamp_tolerance: Duration::seconds(60),
        }
    }
}

/// A weighted vote for one candidate value, carrying enough detail to
/// reconstruct conflicts and final source-contribution provenance.
struct Vote<'a> {
    source_name: &'a str,
    weight: f64,
    confidence: f64,
    priority: i32,
}

fn weight_for(
    contribution: &SourceContribution,
    priorities: &HashMap<String, i32>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vote<'_> {
    Vote {
        source_name: &contribution.source_name,
        weight: contribution.confidence * freshness_decay(contribution.observed_at_utc, now, window),
        confidence: contribution.confidence,
        priority: priorities.get(&contribution.source_name).copied().unwrap_or(0),
    }
}

fn quality_score(reliabilities: &[f64], conflict_count: usize, config: &ResolverConfig) -> f64 {
    let sum: f64 = reliabilities.iter().sum();
    let base = (sum / config.quality_saturation_point).min(1.0);
    let agreement_factor =
        (1.0 - config.agreement_decay_per_conflict * conflict_count as f64).max(0.05);
    (base * agreement_factor).clamp(0.0, 1.0)
}

/// Weighted mean and population standard deviation of `values` under
/// `weights` (equal length, non-empty).
fn weighted_mean_and_std(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        return (mean, var.sqrt());
    }
    let mean = values
        .iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum::<f64>()
        / total_weight;
    let var = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum::<f64>()
        / total_weight;
    (mean, var.sqrt())
}

/// The value below/above which half of `values` fall. Unlike the mean, the
/// median barely moves when one input is a severe outlier.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Drop values beyond `threshold` scaled median-absolute-deviation multiples
/// from the median, but only when at least three inputs are present (spec
/// §4.4). MAD is computed from the median rather than the mean/std of the
/// same sample, so a single severe outlier cannot inflate the dispersion
/// measure used to judge it.
fn drop_outliers(values: Vec<f64>, weights: Vec<f64>, threshold: f64) -> (Vec<f64>, Vec<f64>) {
    if values.len() < 3 {
        return (values, weights);
    }
    let center = median(&values);
    let abs_deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = median(&abs_deviations);
    if mad <= f64::EPSILON {
        return (values, weights);
    }
    // Scales MAD so it is comparable to a standard deviation under a normal
    // distribution, so the same `threshold` reads in "sigma" units.
    let scaled_mad = mad * 1.4826;
    let mut kept_values = Vec::with_capacity(values.len());
    let mut kept_weights = Vec::with_capacity(weights.len());
    for (v, w) in values.iter().zip(&weights) {
        if ((v - center) / scaled_mad).abs() <= threshold {
            kept_values.push(*v);
            kept_weights.push(*w);
        }
    }
    if kept_values.is_empty() {
        // Never drop everything: fall back to the full set.
        return (values, weights);
    }
    (kept_values, kept_weights)
}

/// Resolve N per-source flight records for the same key into one canonical
/// record plus its detected conflicts.
pub fn resolve_flights(
    records: &[CanonicalFlight],
    source_priorities: &HashMap<String, i32>,
    config: &ResolverConfig,
) -> Result<(CanonicalFlight, Vec<Conflict>)> {
    if records.is_empty() {
        return Err(CoreError::invalid_record("resolver requires at least one record"));
    }
    let now = Utc::now();
    let mut conflicts = Vec::new();

    // Identity fields: exact match expected; highest-confidence wins on
    // disagreement.
    let highest_confidence_idx = records
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            let ca = a.source_contributions.first().map(|c| c.confidence).unwrap_or(0.0);
            let cb = b.source_contributions.first().map(|c| c.confidence).unwrap_or(0.0);
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    let anchor = &records[highest_confidence_idx];

    check_identity_conflict(records, anchor, |r| r.flight_number.clone(), "flightNumber", &mut conflicts);
    check_identity_conflict(records, anchor, |r| r.origin_iata.clone(), "originIATA", &mut conflicts);
    check_identity_conflict(records, anchor, |r| r.destination_iata.clone(), "destinationIATA", &mut conflicts);
    for r in records {
        if (r.scheduled_departure_utc - anchor.scheduled_departure_utc).abs()
            > config.identity_timestamp_tolerance
        {
            conflicts.push(Conflict {
                field: "scheduledDepartureUTC".into(),
                chosen_source: contributor_name(anchor),
                values: records
                    .iter()
                    .map(|x| ConflictingValue {
                        source_name: contributor_name(x),
                        value: x.scheduled_departure_utc.to_rfc3339(),
                    })
                    .collect(),
            });
            break;
        }
    }

    // Status: weighted vote, ties by priority then lexicographic name.
    let mut votes: HashMap<crate::domain::FlightStatus, f64> = HashMap::new();
    let mut best_vote_source: HashMap<crate::domain::FlightStatus, (f64, i32, String)> = HashMap::new();
    for r in records {
        if let Some(c) = r.source_contributions.first() {
            let vote = weight_for(c, source_priorities, now, config.freshness_window);
            *votes.entry(r.flight_status).or_insert(0.0) += vote.weight;
            let entry = best_vote_source
                .entry(r.flight_status)
                .or_insert((f64::MIN, i32::MIN, String::new()));
            if (vote.priority, vote.source_name.to_string()) > (entry.1, entry.2.clone()) {
                *entry = (vote.weight, vote.priority, vote.source_name.to_string());
            }
        }
    }
    let flight_status = pick_winner(&votes, &best_vote_source);
    if votes.len() > 1 {
        conflicts.push(Conflict {
            field: "flightStatus".into(),
            chosen_source: best_vote_source
                .get(&flight_status)
                .map(|(_, _, n)| n.clone())
                .unwrap_or_default(),
            values: records
                .iter()
                .map(|x| ConflictingValue {
                    source_name: contributor_name(x),
                    value: format!("{:?}", x.flight_status),
                })
                .collect(),
        });
    }

    // Numeric measurements: weighted mean with outlier dropping.
    let departure_delay = weighted_optional_u32(
        records,
        |r| r.departure_delay_minutes,
        source_priorities,
        now,
        config,
    );
    let arrival_delay = weighted_optional_u32(
        records,
        |r| r.arrival_delay_minutes,
        source_priorities,
        now,
        config,
    );

    let source_contributions: Vec<SourceContribution> = records
        .iter()
        .flat_map(|r| r.source_contributions.clone())
        .collect();
    let reliabilities: Vec<f64> = source_contributions.iter().map(|c| c.confidence).collect();
    let quality = quality_score(&reliabilities, conflicts.len(), config);
    let last_updated = source_contributions
        .iter()
        .map(|c| c.observed_at_utc)
        .max()
        .unwrap_or(now);

    let mut resolved = CanonicalFlight {
        flight_number: anchor.flight_number.clone(),
        scheduled_departure_utc: anchor.scheduled_departure_utc,
        origin_iata: anchor.origin_iata.clone(),
        destination_iata: anchor.destination_iata.clone(),
        flight_status,
        departure_delay_minutes: departure_delay,
        arrival_delay_minutes: arrival_delay,
        actual_departure_utc: records.iter().find_map(|r| r.actual_departure_utc),
        actual_arrival_utc: records.iter().find_map(|r| r.actual_arrival_utc),
        source_contributions,
        data_quality_score: quality,
        last_updated_utc: last_updated,
    };
    if resolved.flight_status.forbids_delay() {
        resolved.departure_delay_minutes = None;
        resolved.arrival_delay_minutes = None;
    }

    Ok((resolved, conflicts))
}

/// Resolve N per-source weather records for the same location into one
/// canonical observation plus its detected conflicts.
pub fn resolve_weather(
    records: &[CanonicalWeatherObservation],
    source_priorities: &HashMap<String, i32>,
    config: &ResolverConfig,
) -> Result<(CanonicalWeatherObservation, Vec<Conflict>)> {
    if records.is_empty() {
        return Err(CoreError::invalid_record("resolver requires at least one record"));
    }
    let now = Utc::now();
    let mut conflicts = Vec::new();

    let highest_confidence_idx = records
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            let ca = a.source_contributions.first().map(|c| c.confidence).unwrap_or(0.0);
            let cb = b.source_contributions.first().map(|c| c.confidence).unwrap_or(0.0);
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    let anchor = &records[highest_confidence_idx];

    for r in records {
        let d_lat = (r.coordinates.lat - anchor.coordinates.lat).abs();
        let d_lon = (r.coordinates.lon - anchor.coordinates.lon).abs();
        if d_lat > 0.01 || d_lon > 0.01 {
            conflicts.push(Conflict {
                field: "coordinates".into(),
                chosen_source: contributor_name_w(anchor),
                values: records
                    .iter()
                    .map(|x| ConflictingValue {
                        source_name: contributor_name_w(x),
                        value: format!("{:.4},{:.4}", x.coordinates.lat, x.coordinates.lon),
                    })
                    .collect(),
            });
            break;
        }
    }

    let mut votes: HashMap<WeatherCondition, f64> = HashMap::new();
    let mut best_vote_source: HashMap<WeatherCondition, (f64, i32, String)> = HashMap::new();
    for r in records {
        if let Some(c) = r.source_contributions.first() {
            let vote = weight_for(c, source_priorities, now, config.freshness_window);
            *votes.entry(r.weather_condition).or_insert(0.0) += vote.weight;
            let entry = best_vote_source
                .entry(r.weather_condition)
                .or_insert((f64::MIN, i32::MIN, String::new()));
            if (vote.priority, vote.source_name.to_string()) > (entry.1, entry.2.clone()) {
                *entry = (vote.weight, vote.priority, vote.source_name.to_string());
            }
        }
    }
    let weather_condition = pick_winner(&votes, &best_vote_source);
    if votes.len() > 1 {
        conflicts.push(Conflict {
            field: "weatherCondition".into(),
            chosen_source: best_vote_source
                .get(&weather_condition)
                .map(|(_, _, n)| n.clone())
                .unwrap_or_default(),
            values: records
                .iter()
                .map(|x| ConflictingValue {
                    source_name: contributor_name_w(x),
                    value: format!("{:?}", x.weather_condition),
                })
                .collect(),
        });
    }

    let weights: Vec<f64> = records
        .iter()
        .filter_map(|r| r.source_contributions.first())
        .map(|c| weight_for(c, source_priorities, now, config.freshness_window).weight)
        .collect();

    let temperature = weighted_f64(records.iter().map(|r| r.temperature_celsius).collect(), weights.clone(), config);
    let wind_speed = weighted_f64(records.iter().map(|r| r.wind_speed_kmh).collect(), weights.clone(), config);
    let precipitation = weighted_f64(
        records.iter().map(|r| r.precipitation_probability).collect(),
        weights,
        config,
    );

    let source_contributions: Vec<SourceContribution> = records
        .iter()
        .flat_map(|r| r.source_contributions.clone())
        .collect();
    let reliabilities: Vec<f64> = source_contributions.iter().map(|c| c.confidence).collect();
    let quality = quality_score(&reliabilities, conflicts.len(), config);
    let last_updated = source_contributions
        .iter()
        .map(|c| c.observed_at_utc)
        .max()
        .unwrap_or(now);

    let resolved = CanonicalWeatherObservation {
        coordinates: anchor.coordinates,
        airport_iata: records.iter().find_map(|r| r.airport_iata.clone()),
        observation_timestamp_utc: anchor.observation_timestamp_utc,
        temperature_celsius: temperature,
        wind_speed_kmh: wind_speed,
        precipitation_probability: precipitation.clamp(0.0, 1.0),
        weather_condition,
        source_contributions,
        data_quality_score: quality,
        last_updated_utc: last_updated,
    };

    Ok((resolved, conflicts))
}

fn pick_winner<K: Copy + Eq + std::hash::Hash>(
    votes: &HashMap<K, f64>,
    tie_breakers: &HashMap<K, (f64, i32, String)>,
) -> K {
    votes
        .iter()
        .max_by(|(ka, wa), (kb, wb)| {
            wa.partial_cmp(wb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let ta = tie_breakers.get(ka).cloned().unwrap_or_default();
                    let tb = tie_breakers.get(kb).cloned().unwrap_or_default();
                    (ta.1, ta.2).cmp(&(tb.1, tb.2))
                })
        })
        .map(|(k, _)| *k)
        .expect("votes must be non-empty")
}

fn weighted_optional_u32(
    records: &[CanonicalFlight],
    extract: impl Fn(&CanonicalFlight) -> Option<u32>,
    source_priorities: &HashMap<String, i32>,
    now: DateTime<Utc>,
    config: &ResolverConfig,
) -> Option<u32> {
    let mut values = Vec::new();
    let mut weights = Vec::new();
    for r in records {
        if let (Some(v), Some(c)) = (extract(r), r.source_contributions.first()) {
            values.push(v as f64);
            weights.push(weight_for(c, source_priorities, now, config.freshness_window).weight);
        }
    }
    if values.is_empty() {
        return None;
    }
    let (values, weights) = drop_outliers(values, weights, config.outlier_std_dev_threshold);
    if values.is_empty() {
        return None;
    }
    let (mean, _) = weighted_mean_and_std(&values, &weights);
    Some(mean.round().max(0.0) as u32)
}

fn weighted_f64(values: Vec<f64>, weights: Vec<f64>, config: &ResolverConfig) -> f64 {
    let (values, weights) = drop_outliers(values, weights, config.outlier_std_dev_threshold);
    if values.is_empty() {
        return 0.0;
    }
    weighted_mean_and_std(&values, &weights).0
}

fn contributor_name(r: &CanonicalFlight) -> String {
    r.source_contributions
        .first()
        .map(|c| c.source_name.clone())
        .unwrap_or_default()
}

fn contributor_name_w(r: &CanonicalWeatherObservation) -> String {
    r.source_contributions
        .first()
        .map(|c| c.source_name.clone())
        .unwrap_or_default()
}

fn check_identity_conflict(
    records: &[CanonicalFlight],
    anchor: &CanonicalFlight,
    extract: impl Fn(&CanonicalFlight) -> String,
    field: &str,
    conflicts: &mut Vec<Conflict>,
) {
    let anchor_value = extract(anchor);
    if records.iter().any(|r| extract(r) != anchor_value) {
        conflicts.push(Conflict {
            field: field.to_string(),
            chosen_source: contributor_name(anchor),
            values: records
                .iter()
                .map(|x| ConflictingValue {
                    source_name: contributor_name(x),
                    value: extract(x),
                })
                .collect(),
        });
    }
}
