//! Internal SDK client implementation with builder pattern and async/await
//! support (spec.md §6: `InternalPayoutsProcessTriggered`,
//! `GetPolicyDataForQuote`).

use crate::sdk::config::{ClientConfig, RetryConfig};
use crate::sdk::error::{SdkError, SdkResult};
use crate::sdk::retry::RetryPolicy;
use crate::sdk::telemetry::TelemetryCollector;
use crate::sdk::types::*;
use reqwest::{Client as HttpClient, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Typed client for the two internal API surfaces the core exposes to the
/// Policy Monitor, external schedulers, and the pricing layer.
#[derive(Clone)]
pub struct AegisSdkClient {
    http_client: HttpClient,
    config: Arc<ClientConfig>,
    retry_policy: RetryPolicy,
    telemetry: TelemetryCollector,
    rate_limiter: Option<Arc<Semaphore>>,
}

impl AegisSdkClient {
    /// Create a new client from configuration
    pub fn new(config: ClientConfig) -> SdkResult<Self> {
        config.validate()?;

        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_config.max_idle)
            .pool_idle_timeout(config.pool_config.idle_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SdkError::config(format!("Failed to build HTTP client: {}", e)))?;

        let retry_policy = RetryPolicy::new(config.retry_config.clone());

        let telemetry = TelemetryCollector::new("aegis_sdk", config.telemetry_config.metrics_enabled);

        let rate_limiter = if config.rate_limit_config.enabled {
            config
                .rate_limit_config
                .requests_per_second
                .map(|rps| Arc::new(Semaphore::new(rps)))
        } else {
            None
        };

        info!("internal SDK client initialized");

        Ok(Self {
            http_client,
            config: Arc::new(config),
            retry_policy,
            telemetry,
            rate_limiter,
        })
    }

    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// `InternalPayoutsProcessTriggered({policyIds, reason, requestedBy}) -> Summary`.
    /// Invoked by the Policy Monitor and by external triggers (e.g. a
    /// scheduled job); authenticated by the shared secret.
    #[instrument(skip(self, request), fields(policy_count = request.policy_ids.len()))]
    pub async fn process_triggered_payouts(
        &self,
        request: ProcessTriggeredRequest,
    ) -> SdkResult<ProcessTriggeredSummary> {
        debug!("submitting triggered payout batch");
        self.post("/internal/payouts/process-triggered", &request).await
    }

    /// `GetPolicyDataForQuote(request)`, called by the pricing layer before
    /// a policy is underwritten.
    #[instrument(skip(self, request), fields(flight_number = %request.flight_number))]
    pub async fn get_policy_data_for_quote(
        &self,
        request: PolicyDataQuoteRequest,
    ) -> SdkResult<PolicyDataQuoteResponse> {
        debug!("fetching policy data for quote");
        self.post("/internal/policy-data/quote", &request).await
    }

    /// Get health status
    #[instrument(skip(self))]
    pub async fn health(&self) -> SdkResult<HealthResponse> {
        debug!("checking health");
        self.get("/health").await
    }

    /// Generic GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> SdkResult<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    /// Generic POST request
    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> SdkResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Generic HTTP request with retry logic
    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> SdkResult<T> {
        let timer = self.telemetry.start_timer();

        if let Some(limiter) = &self.rate_limiter {
            match limiter.try_acquire() {
                Ok(_permit) => {}
                Err(_) => {
                    self.telemetry.record_rate_limit_hit();
                    warn!("rate limit exceeded, waiting for permit");
                    let _permit = limiter.acquire().await.map_err(|e| {
                        SdkError::internal(format!("Failed to acquire rate limit permit: {}", e))
                    })?;
                }
            }
        }

        let result = self
            .retry_policy
            .execute(|| async { self.execute_request(method.clone(), path, body).await })
            .await;

        match result {
            Ok(response) => {
                timer.success();
                Ok(response)
            }
            Err(e) => {
                timer.failure();
                Err(e)
            }
        }
    }

    /// Execute a single HTTP request
    async fn execute_request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> SdkResult<T> {
        let url = self.build_url(path)?;

        let mut request_builder = self.http_client.request(method.clone(), url.clone());

        request_builder = request_builder.header("X-Internal-Secret", &self.config.shared_secret);

        for (key, value) in &self.config.default_headers {
            request_builder = request_builder.header(key, value);
        }

        if let Some(body) = body {
            request_builder = request_builder.json(body);
        }

        debug!("executing {} request to {}", method, url);

        let response = request_builder.send().await.map_err(|e| {
            error!("request failed: {}", e);
            SdkError::Network(e.to_string())
        })?;

        self.handle_response(response).await
    }

    /// Handle HTTP response
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> SdkResult<T> {
        let status = response.status();

        debug!("received response with status: {}", status);

        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                error!("failed to deserialize response: {}", e);
                SdkError::Network(e.to_string())
            })
        } else {
            let status_code = status.as_u16();
            let error_body = response.json::<serde_json::Value>().await.ok();

            let message = error_body
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error")
                .to_string();

            error!("API error: {} - {}", status_code, message);

            Err(SdkError::api(status_code, message, error_body))
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> SdkResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SdkError::config(format!("Invalid URL path: {}", e)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}

/// Builder for `AegisSdkClient`
#[derive(Default)]
pub struct ClientBuilder {
    config_builder: Option<crate::sdk::config::ClientConfigBuilder>,
}

impl ClientBuilder {
    pub fn base_url(mut self, url: impl AsRef<str>) -> SdkResult<Self> {
        let builder = self.config_builder.take().unwrap_or_default().base_url(url)?;
        self.config_builder = Some(builder);
        Ok(self)
    }

    pub fn shared_secret(mut self, secret: impl Into<String>) -> Self {
        let builder = self.config_builder.take().unwrap_or_default().shared_secret(secret);
        self.config_builder = Some(builder);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        let builder = self.config_builder.take().unwrap_or_default().timeout(timeout);
        self.config_builder = Some(builder);
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        let builder = self.config_builder.take().unwrap_or_default().retry_config(config);
        self.config_builder = Some(builder);
        self
    }

    pub fn add_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let builder = self.config_builder.take().unwrap_or_default().add_header(key, value);
        self.config_builder = Some(builder);
        self
    }

    pub fn build(self) -> SdkResult<AegisSdkClient> {
        let config = self.config_builder.unwrap_or_default().build()?;
        AegisSdkClient::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_builder_constructs_a_working_client() {
        let result = AegisSdkClient::builder()
            .base_url("https://internal.example.com")
            .unwrap()
            .shared_secret("test-secret")
            .timeout(Duration::from_secs(60))
            .build();

        assert!(result.is_ok());
        let client = result.unwrap();
        assert_eq!(client.config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn builder_rejects_missing_shared_secret() {
        let result = AegisSdkClient::builder()
            .base_url("https://internal.example.com")
            .unwrap()
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn url_building_joins_base_and_path() {
        let config = ClientConfig::builder()
            .base_url("https://internal.example.com")
            .unwrap()
            .shared_secret("test")
            .build()
            .unwrap();

        let client = AegisSdkClient::new(config).unwrap();
        let url = client.build_url("/internal/payouts/process-triggered").unwrap();
        assert_eq!(
            url.as_str(),
            "https://internal.example.com/internal/payouts/process-triggered"
        );
    }
}
