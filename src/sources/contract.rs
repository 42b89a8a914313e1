//! C3 Source Client Contract: the abstract provider interface shared by
//! every flight and weather adapter.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::Result;

/// A provider adapter for one canonical record type `Output`.
///
/// Implementors translate provider-specific payloads into the canonical
/// model; unknown values must map to the domain's `Unknown` variant rather
/// than be dropped (spec §6).
#[async_trait]
pub trait SourceClient: Send + Sync {
    type Output: Send;

    /// Stable name used for health tracking, caching diagnostics, and
    /// provenance attribution.
    fn name(&self) -> &str;

    /// Higher is preferred for selection (spec §4.3 `getSources`).
    fn priority(&self) -> i32;

    /// Prior confidence in this source's data, used by the resolver as the
    /// starting weight for its votes (spec §4.4).
    fn reliability(&self) -> f64;

    /// Cheap liveness probe, independent of `fetch`.
    async fn is_available(&self) -> bool;

    /// Fetch this source's view of `key` (e.g. a flight number, or a
    /// rounded coordinate pair), optionally scoped by `date_hint`.
    ///
    /// `Ok(None)` means the source has no data for this key (not a
    /// failure); `Err` means the fetch itself failed.
    async fn fetch(&self, key: &str, date_hint: Option<NaiveDate>) -> Result<Option<Self::Output>>;
}

/// The outcome of one source's fetch attempt, as seen by the aggregator
/// (spec §4.5 step 3: "success with value, success with absence, or
/// failure").
pub enum FetchOutcome<T> {
    Success(T),
    Absent,
    Failed(crate::domain::CoreError),
}
