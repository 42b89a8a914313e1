//! C10 Payout Engine: `processTriggeredPayouts(policyIds) -> Summary` (spec
//! §4.9). Never throws; every outcome, including per-policy failures, is
//! folded into the returned summary.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dlq::{DlqItem, DlqStore, FailureReason};
use crate::domain::{
    ChainProvider, CoverageType, Escrow, EscrowStatus, Policy, PolicyOwner, PolicyStatus,
    PayoutRecord, PayoutStatus, Result, UserWallet,
};
use crate::escrow::BlockchainServiceRegistry;
use crate::storage::{EscrowRepository, PayoutRepository, PolicyRepository, UserWalletRepository};

use super::eligibility::{check_eligibility, EligibilityError};

/// Outcome of one policy's payout attempt within a batch.
#[derive(Debug, Clone)]
pub struct PerPolicyResult {
    pub policy_id: Uuid,
    pub outcome: PolicyOutcome,
}

#[derive(Debug, Clone)]
pub enum PolicyOutcome {
    Completed { payout_id: Uuid, tx_hash: String, amount: Decimal },
    Ineligible { reason: EligibilityError },
    ChainFailure { error: String },
}

#[derive(Debug, Clone, Default)]
pub struct PayoutSummary {
    pub processed_count: usize,
    pub failed_count: usize,
    pub total_amount: Decimal,
    pub per_policy_results: Vec<PerPolicyResult>,
}

pub struct PayoutEngine {
    policies: Arc<dyn PolicyRepository>,
    escrows: Arc<dyn EscrowRepository>,
    payouts: Arc<dyn PayoutRepository>,
    wallets: Arc<dyn UserWalletRepository>,
    chain_registry: Arc<BlockchainServiceRegistry>,
    dlq: Arc<dyn DlqStore>,
}

impl PayoutEngine {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        escrows: Arc<dyn EscrowRepository>,
        payouts: Arc<dyn PayoutRepository>,
        wallets: Arc<dyn UserWalletRepository>,
        chain_registry: Arc<BlockchainServiceRegistry>,
        dlq: Arc<dyn DlqStore>,
    ) -> Self {
        Self {
            policies,
            escrows,
            payouts,
            wallets,
            chain_registry,
            dlq,
        }
    }

    pub async fn process_triggered_payouts(
        &self,
        policy_ids: &[Uuid],
        reason: &str,
    ) -> PayoutSummary {
        let mut summary = PayoutSummary::default();

        for &policy_id in policy_ids {
            let result = self.process_one(policy_id, reason).await;
            match &result.outcome {
                PolicyOutcome::Completed { amount, .. } => {
                    summary.processed_count += 1;
                    summary.total_amount += amount;
                }
                PolicyOutcome::Ineligible { .. } | PolicyOutcome::ChainFailure { .. } => {
                    summary.failed_count += 1;
                }
            }
            summary.per_policy_results.push(result);
        }

        info!(
            processed = summary.processed_count,
            failed = summary.failed_count,
            "processed triggered payouts batch"
        );
        summary
    }

    async fn process_one(&self, policy_id: Uuid, reason: &str) -> PerPolicyResult {
        match self.process_one_inner(policy_id, reason).await {
            Ok(outcome) => PerPolicyResult { policy_id, outcome },
            Err(e) => {
                error!(policy_id = %policy_id, error = %e, "unexpected error evaluating payout eligibility");
                PerPolicyResult {
                    policy_id,
                    outcome: PolicyOutcome::Ineligible {
                        reason: EligibilityError::PolicyNotFound,
                    },
                }
            }
        }
    }

    async fn process_one_inner(&self, policy_id: Uuid, reason: &str) -> Result<PolicyOutcome> {
        info!(policy_id = %policy_id, reason, "evaluating triggered payout");

        // Step 1: load.
        let policy = self.policies.get(policy_id).await?;
        let escrow = self.escrows.get_by_policy(policy_id).await?;

        // Idempotency: a prior COMPLETED payout for this policy means the
        // work is already done (spec invariant 5). Checked ahead of
        // eligibility, since a completed payout has already moved the
        // policy/escrow past the states eligibility requires.
        if let Some(existing) = self.payouts.get_by_policy(policy_id).await? {
            if existing.status == PayoutStatus::Completed {
                return Ok(PolicyOutcome::Completed {
                    payout_id: existing.payout_id,
                    tx_hash: existing.tx_hash.unwrap_or_default(),
                    amount: existing.amount,
                });
            }
        }

        let wallet = match &policy {
            Some(p) => self.wallet_for(p).await?,
            None => None,
        };

        // Step 2: eligibility check.
        if let Err(reason) = check_eligibility(policy.as_ref(), wallet.as_ref(), escrow.as_ref()) {
            return Ok(PolicyOutcome::Ineligible { reason });
        }
        let policy = policy.expect("checked by eligibility");
        let escrow = escrow.expect("checked by eligibility");

        // Step 3: release the escrow via the chain-agnostic abstraction.
        let service = self
            .chain_registry
            .get(escrow.chain)
            .ok_or_else(|| crate::domain::CoreError::chain_adapter("no escrow service registered"))?;

        let signer = policy.policy_id.to_string();
        match service.release_escrow(&escrow.blockchain_id, &signer).await {
            Ok(receipt) => {
                // Step 4: write the PayoutRecord.
                let record = PayoutRecord::completed(
                    policy.policy_id,
                    escrow.internal_id.clone(),
                    policy.payout_amount,
                    receipt.hash.clone(),
                );
                self.persist_payout_record(&record).await;

                // Step 5 & 6: transition policy and escrow.
                self.transition_policy(&policy, PolicyStatus::Claimed).await?;
                self.transition_escrow(&escrow, EscrowStatus::Released).await?;

                Ok(PolicyOutcome::Completed {
                    payout_id: record.payout_id,
                    tx_hash: receipt.hash,
                    amount: record.amount,
                })
            }
            Err(e) => {
                let record = PayoutRecord::failed(
                    policy.policy_id,
                    escrow.internal_id.clone(),
                    policy.payout_amount,
                    e.to_string(),
                );
                self.persist_payout_record(&record).await;
                Ok(PolicyOutcome::ChainFailure { error: e.to_string() })
            }
        }
    }

    async fn wallet_for(&self, policy: &Policy) -> Result<Option<UserWallet>> {
        let chain = ChainProvider::Paygo; // primary chain, pending a per-policy chain tag
        match &policy.owner {
            PolicyOwner::User(user_id) => self.wallets.get_primary(user_id, chain).await,
            PolicyOwner::AnonymousSession(_) => Ok(None),
        }
    }

    /// A failed PayoutRecord write is itself caught and logged (spec §4.9,
    /// §7): it never alters policy/escrow state and is queued to the DLQ
    /// instead of being lost.
    async fn persist_payout_record(&self, record: &PayoutRecord) {
        if let Err(e) = self.payouts.create(record).await {
            warn!(policy_id = %record.policy_id, error = %e, "failed to persist payout record, queueing to DLQ");
            let payload = serde_json::to_string(record).unwrap_or_default();
            let item = DlqItem::new(
                "aegis".into(),
                payload,
                "payout_record".into(),
                FailureReason::DatabaseError,
                e.to_string(),
                5,
            )
            .with_expiration(72);
            if let Err(dlq_err) = self.dlq.add(item).await {
                error!(error = %dlq_err, "failed to enqueue payout record to DLQ");
            }
        }
    }

    async fn transition_policy(&self, policy: &Policy, next: PolicyStatus) -> Result<()> {
        policy.validate_transition(next)?;
        let mut updated = policy.clone();
        updated.status = next;
        updated.updated_at = chrono::Utc::now();
        self.policies.upsert(&updated).await
    }

    async fn transition_escrow(&self, escrow: &Escrow, next: EscrowStatus) -> Result<()> {
        escrow.validate_transition(next)?;
        let mut updated = escrow.clone();
        updated.status = next;
        updated.updated_at = chrono::Utc::now();
        self.escrows.upsert(&updated).await
    }
}

/// Whether `policy`'s coverage type matches the predicate family that
/// triggered it; kept here (rather than in `monitor`) since both the
/// monitor and manual/administrative triggers need the same mapping.
pub fn coverage_allows_manual_trigger(coverage_type: CoverageType) -> bool {
    matches!(
        coverage_type,
        CoverageType::FlightDelay | CoverageType::FlightCancellation | CoverageType::WeatherDisruption
    )
}
