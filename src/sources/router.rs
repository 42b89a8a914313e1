//! C4 Source Router: per-aggregator health tracking and priority-ordered
//! candidate selection. Health state is per-process and non-persistent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::contract::SourceClient;

#[derive(Debug, Clone)]
struct HealthEntry {
    healthy: bool,
    consecutive_failures: u32,
    cooldown_until: Option<DateTime<Utc>>,
}

impl Default for HealthEntry {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            cooldown_until: None,
        }
    }
}

/// Cooldown scaling policy: base duration doubled per consecutive failure,
/// capped at `max`. Spec §4.3 only requires the cooldown to "scale with
/// consecutive failures"; the exact curve is left to the implementation
/// (spec §9 Design Notes) and is kept configurable here.
#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
            max: Duration::from_secs(30 * 60),
        }
    }
}

impl CooldownPolicy {
    fn cooldown_for(&self, consecutive_failures: u32) -> Duration {
        let shift = consecutive_failures.saturating_sub(1).min(16);
        let scaled = self.base.as_millis().saturating_mul(1u128 << shift);
        Duration::from_millis(scaled.min(self.max.as_millis()) as u64)
    }
}

/// Holds the candidate source clients for one domain (flight or weather)
/// plus their shared health table.
pub struct SourceRouter<T: Send> {
    clients: Vec<Arc<dyn SourceClient<Output = T>>>,
    health: RwLock<HashMap<String, HealthEntry>>,
    cooldown_policy: CooldownPolicy,
}

impl<T: Send> SourceRouter<T> {
    pub fn new(clients: Vec<Arc<dyn SourceClient<Output = T>>>) -> Self {
        Self::with_cooldown_policy(clients, CooldownPolicy::default())
    }

    pub fn with_cooldown_policy(
        clients: Vec<Arc<dyn SourceClient<Output = T>>>,
        cooldown_policy: CooldownPolicy,
    ) -> Self {
        Self {
            clients,
            health: RwLock::new(HashMap::new()),
            cooldown_policy,
        }
    }

    /// Return the subset of clients deemed currently healthy for `key`,
    /// sorted by descending priority, capped at `max_sources`.
    ///
    /// `key` is accepted (not merely ignored) so a future heuristic may
    /// reorder candidates by key-specific observed latency, as spec §4.3
    /// allows; the baseline policy here is priority-only.
    pub async fn get_sources(&self, _key: &str, max_sources: usize) -> Vec<Arc<dyn SourceClient<Output = T>>> {
        let now = Utc::now();
        let health = self.health.read().await;

        let mut candidates: Vec<_> = self
            .clients
            .iter()
            .filter(|c| {
                match health.get(c.name()) {
                    Some(entry) => {
                        entry.healthy
                            || entry
                                .cooldown_until
                                .map(|until| now >= until)
                                .unwrap_or(true)
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| b.priority().cmp(&a.priority()));
        candidates.truncate(max_sources);
        candidates
    }

    /// Record a failed fetch attempt, excluding the source for a scaled
    /// cooldown window.
    pub async fn mark_unhealthy(&self, name: &str) {
        let mut health = self.health.write().await;
        let entry = health.entry(name.to_string()).or_default();
        entry.consecutive_failures += 1;
        entry.healthy = false;
        entry.cooldown_until =
            Some(Utc::now() + chrono::Duration::from_std(self.cooldown_policy.cooldown_for(entry.consecutive_failures)).unwrap_or_default());
    }

    /// Reset a source's health entry after a successful `is_available`/fetch.
    pub async fn mark_healthy(&self, name: &str) {
        let mut health = self.health.write().await;
        health.insert(name.to_string(), HealthEntry::default());
    }

    pub async fn is_currently_healthy(&self, name: &str) -> bool {
        let now = Utc::now();
        let health = self.health.read().await;
        match health.get(name) {
            Some(entry) => entry.healthy || entry.cooldown_until.map(|u| now >= u).unwrap_or(true),
            None => true,
        }
    }

    pub fn total_clients(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedClient {
        name: &'static str,
        priority: i32,
    }

    #[async_trait]
    impl SourceClient for FixedClient {
        type Output = u32;

        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn reliability(&self) -> f64 {
            0.9
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn fetch(&self, _key: &str, _date_hint: Option<NaiveDate>) -> Result<Option<u32>> {
            Ok(Some(1))
        }
    }

    fn router() -> SourceRouter<u32> {
        SourceRouter::new(vec![
            Arc::new(FixedClient { name: "low", priority: 1 }),
            Arc::new(FixedClient { name: "high", priority: 10 }),
            Arc::new(FixedClient { name: "mid", priority: 5 }),
        ])
    }

    #[tokio::test]
    async fn get_sources_orders_by_descending_priority() {
        let r = router();
        let sources = r.get_sources("key", 3).await;
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn get_sources_respects_max_sources() {
        let r = router();
        let sources = r.get_sources("key", 2).await;
        assert_eq!(sources.len(), 2);
    }

    #[tokio::test]
    async fn unhealthy_source_is_excluded_until_cooldown_elapses() {
        let r = router();
        r.mark_unhealthy("high").await;
        let sources = r.get_sources("key", 3).await;
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert!(!names.contains(&"high"));
    }

    #[tokio::test]
    async fn mark_healthy_resets_entry() {
        let r = router();
        r.mark_unhealthy("high").await;
        r.mark_healthy("high").await;
        assert!(r.is_currently_healthy("high").await);
    }

    #[test]
    fn cooldown_scales_with_consecutive_failures() {
        let policy = CooldownPolicy::default();
        let c1 = policy.cooldown_for(1);
        let c2 = policy.cooldown_for(2);
        let c3 = policy.cooldown_for(3);
        assert!(c2 > c1);
        assert!(c3 > c2);
        assert!(c3 <= policy.max);
    }
}
