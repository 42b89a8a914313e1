//! Wire types for the two internal API surfaces (spec.md §6):
//! `InternalPayoutsProcessTriggered` and `GetPolicyDataForQuote`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CanonicalFlight, CanonicalWeatherObservation};

/// Request body for `InternalPayoutsProcessTriggered`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTriggeredRequest {
    pub policy_ids: Vec<Uuid>,
    pub reason: String,
    pub requested_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PolicyOutcomeDto {
    Completed {
        payout_id: Uuid,
        tx_hash: String,
        amount: rust_decimal::Decimal,
    },
    Ineligible {
        reason: String,
    },
    ChainFailure {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerPolicyResultDto {
    pub policy_id: Uuid,
    #[serde(flatten)]
    pub outcome: PolicyOutcomeDto,
}

/// Response body for `InternalPayoutsProcessTriggered`, mirroring
/// `PayoutSummary` across the wire.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessTriggeredSummary {
    pub processed_count: usize,
    pub failed_count: usize,
    pub total_amount: rust_decimal::Decimal,
    pub per_policy_results: Vec<PerPolicyResultDto>,
}

/// Request body for `GetPolicyDataForQuote`, called by the pricing layer
/// before a policy is underwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDataQuoteRequest {
    pub flight_number: String,
    pub date: chrono::NaiveDate,
    pub airports: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDataQuoteResponse {
    pub flight: CanonicalFlight,
    pub weather_observations: Vec<CanonicalWeatherObservation>,
    pub flight_quality_score: f64,
    pub weather_quality_scores: Vec<f64>,
}

/// Response body for the internal health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
