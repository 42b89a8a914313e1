/// Wire-level integration tests for `AegisSdkClient` against a mock HTTP
/// server, covering both internal API surfaces (spec §6) and their
/// authentication and error-mapping behavior.
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aegis_aggregator::sdk::types::{PolicyDataQuoteRequest, ProcessTriggeredRequest};
use aegis_aggregator::{AegisSdkClient, SdkError};

async fn client_for(server: &MockServer) -> AegisSdkClient {
    AegisSdkClient::builder()
        .base_url(server.uri())
        .unwrap()
        .shared_secret("test-shared-secret")
        .build()
        .expect("client builds")
}

#[tokio::test]
async fn process_triggered_payouts_sends_the_shared_secret_header_and_parses_the_summary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/payouts/process-triggered"))
        .and(header("X-Internal-Secret", "test-shared-secret"))
        .and(body_json(json!({
            "policy_ids": ["00000000-0000-0000-0000-000000000001"],
            "reason": "flight delayed",
            "requested_by": "policy-monitor",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed_count": 1,
            "failed_count": 0,
            "total_amount": "500.00",
            "per_policy_results": [{
                "policy_id": "00000000-0000-0000-0000-000000000001",
                "outcome": "completed",
                "payout_id": "00000000-0000-0000-0000-000000000002",
                "tx_hash": "0xabc",
                "amount": "500.00",
            }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = ProcessTriggeredRequest {
        policy_ids: vec!["00000000-0000-0000-0000-000000000001".parse().unwrap()],
        reason: "flight delayed".to_string(),
        requested_by: "policy-monitor".to_string(),
    };

    let summary = client.process_triggered_payouts(request).await.expect("summary");
    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.failed_count, 0);
    assert_eq!(summary.per_policy_results.len(), 1);
}

#[tokio::test]
async fn get_policy_data_for_quote_round_trips_the_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/policy-data/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flight": {
                "flightNumber": "UA456",
                "scheduledDepartureUtc": "2026-07-27T10:00:00Z",
                "originIata": "SFO",
                "destinationIata": "JFK",
                "flightStatus": "ON_TIME",
                "departureDelayMinutes": null,
                "arrivalDelayMinutes": null,
                "actualDepartureUtc": null,
                "actualArrivalUtc": null,
                "sourceContributions": [{
                    "sourceName": "primary-flight-api",
                    "confidence": 0.9,
                    "fieldsContributed": ["flightStatus"],
                    "observedAtUtc": "2026-07-27T09:00:00Z",
                }],
                "dataQualityScore": 0.9,
                "lastUpdatedUtc": "2026-07-27T09:00:00Z",
            },
            "weather_observations": [],
            "flight_quality_score": 0.9,
            "weather_quality_scores": [],
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = PolicyDataQuoteRequest {
        flight_number: "UA456".to_string(),
        date: "2026-07-27".parse().unwrap(),
        airports: None,
    };

    let response = client.get_policy_data_for_quote(request).await.expect("response");
    assert_eq!(response.flight.flight_number, "UA456");
    assert_eq!(response.flight_quality_score, 0.9);
    assert!(response.weather_observations.is_empty());
}

#[tokio::test]
async fn non_retryable_client_error_is_mapped_to_an_api_error_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/payouts/process-triggered"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "unknown policy",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = ProcessTriggeredRequest {
        policy_ids: vec![],
        reason: "flight delayed".to_string(),
        requested_by: "policy-monitor".to_string(),
    };

    let err = client.process_triggered_payouts(request).await.expect_err("should fail");
    match err {
        SdkError::Api { status, message, .. } => {
            assert_eq!(status, 404);
            assert_eq!(message, "unknown policy");
        }
        other => panic!("expected SdkError::Api, got {other:?}"),
    }
}

#[tokio::test]
async fn health_check_parses_status_and_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "version": "1.0.0",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let health = client.health().await.expect("health");
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, "1.0.0");
}
