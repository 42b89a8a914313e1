//! Source-attribution metadata shared by flight and weather canonical records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One provider's contribution to a resolved canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceContribution {
    pub source_name: String,
    /// Prior confidence in this source, in `[0, 1]`.
    pub confidence: f64,
    /// Which canonical fields this source's value fed into the merge.
    pub fields_contributed: Vec<String>,
    pub observed_at_utc: DateTime<Utc>,
}

impl SourceContribution {
    pub fn new(
        source_name: impl Into<String>,
        confidence: f64,
        fields_contributed: Vec<String>,
        observed_at_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            fields_contributed,
            observed_at_utc,
        }
    }
}

/// A detected disagreement between sources for one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub field: String,
    pub chosen_source: String,
    /// Human-readable values, already stringified since the disagreeing
    /// sides may be of different concrete types (status vs. numeric).
    pub values: Vec<ConflictingValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingValue {
    pub source_name: String,
    pub value: String,
}

/// Decay an initial source reliability by the age of its observation.
///
/// Linear decay to zero at `ttl`; observations older than `ttl` contribute
/// no weight. This is the "freshness_decay" referenced by spec §4.4.
pub fn freshness_decay(observed_at: DateTime<Utc>, now: DateTime<Utc>, ttl: chrono::Duration) -> f64 {
    if ttl.num_milliseconds() <= 0 {
        return 0.0;
    }
    let age_ms = (now - observed_at).num_milliseconds().max(0) as f64;
    let ttl_ms = ttl.num_milliseconds() as f64;
    (1.0 - age_ms / ttl_ms).clamp(0.0, 1.0)
}
