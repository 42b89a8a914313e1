//! C11 Policy Monitor: the long-running periodic scanner (spec §4.8).
//!
//! `IDLE -> SCANNING -> TRIGGERING -> IDLE`, driven by a `tokio::time::interval`
//! tick. A single `AtomicBool` tracks whether a tick is in flight so two
//! ticks never overlap; `start`/`stop` manage the background task via a
//! `CancellationToken`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AggregatorConfig;
use crate::payout::PayoutEngine;
use crate::router::{DataRouter, PolicyDataRequest};
use crate::storage::PolicyRepository;

use super::predicates;

#[derive(Debug, Clone)]
pub struct TriggeredPolicy {
    pub policy_id: Uuid,
    pub reason: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub scanned: usize,
    pub triggered: Vec<TriggeredPolicy>,
    pub evaluation_errors: usize,
}

pub struct PolicyMonitor {
    policies: Arc<dyn PolicyRepository>,
    data_router: Arc<DataRouter>,
    payout_engine: Arc<PayoutEngine>,
    max_policies_per_check: usize,
    interval: std::time::Duration,
    is_monitoring: Arc<AtomicBool>,
    task: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl PolicyMonitor {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        data_router: Arc<DataRouter>,
        payout_engine: Arc<PayoutEngine>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            policies,
            data_router,
            payout_engine,
            max_policies_per_check: config.max_policies_per_check,
            interval: config.monitor_interval(),
            is_monitoring: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.is_monitoring.load(Ordering::SeqCst)
    }

    /// Start the periodic scan loop. A second `start()` while already
    /// running is a no-op (spec §5: `isMonitoring` guards re-entry).
    pub async fn start(self: &Arc<Self>) {
        let mut guard = self.task.lock().await;
        if guard.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let child_token = token.clone();
        let this = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            loop {
                tokio::select! {
                    _ = child_token.cancelled() => break,
                    _ = ticker.tick() => {
                        this.run_one_cycle().await;
                    }
                }
            }
        });

        *guard = Some((handle, token));
        info!("policy monitor started");
    }

    pub async fn stop(&self) {
        if let Some((handle, token)) = self.task.lock().await.take() {
            token.cancel();
            let _ = handle.await;
            info!("policy monitor stopped");
        }
    }

    /// One IDLE -> SCANNING -> TRIGGERING -> IDLE cycle, callable directly
    /// for on-demand / manual checks outside the timer loop.
    pub async fn run_one_cycle(&self) -> ScanReport {
        if self
            .is_monitoring
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("skipping monitor tick: previous cycle still in flight");
            return ScanReport::default();
        }

        let report = self.scan().await;

        if !report.triggered.is_empty() {
            let policy_ids: Vec<Uuid> = report.triggered.iter().map(|t| t.policy_id).collect();
            let reason = report
                .triggered
                .first()
                .map(|t| t.reason.clone())
                .unwrap_or_default();
            let summary = self.payout_engine.process_triggered_payouts(&policy_ids, &reason).await;
            info!(
                processed = summary.processed_count,
                failed = summary.failed_count,
                "payout engine completed triggering batch"
            );
        }

        self.is_monitoring.store(false, Ordering::SeqCst);
        report
    }

    async fn scan(&self) -> ScanReport {
        let now = Utc::now();
        let policies = match self.policies.list_active_unexpired(now, self.max_policies_per_check).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to load active policies for monitor scan");
                return ScanReport::default();
            }
        };

        let mut report = ScanReport {
            scanned: policies.len(),
            ..Default::default()
        };

        for policy in &policies {
            match self.evaluate_policy(policy).await {
                Ok(Some(outcome)) => report.triggered.push(TriggeredPolicy {
                    policy_id: policy.policy_id,
                    reason: outcome.reason,
                    confidence: outcome.confidence,
                }),
                Ok(None) => {}
                Err(e) => {
                    warn!(policy_id = %policy.policy_id, error = %e, "policy evaluation failed, skipping");
                    report.evaluation_errors += 1;
                }
            }
        }

        report
    }

    async fn evaluate_policy(
        &self,
        policy: &crate::domain::Policy,
    ) -> crate::domain::Result<Option<predicates::TriggerOutcome>> {
        let date = policy.expires_at.date_naive();
        let request = PolicyDataRequest::new(policy.flight_id.clone(), date);
        let response = self.data_router.get_data_for_policy(request).await?;

        Ok(predicates::evaluate(policy, &response.flight, &response.weather_observations))
    }
}
