//! The verification request pipeline.
//!
//! One sequential async chain per submitted `(ticket, proof)`:
//! nonce consume -> unconditional nonce invalidation -> signature proof ->
//! rule resolution -> per-rule evaluation and side effects -> best-effort
//! outcome notification. Per-subject mutual exclusion comes from nonce
//! overwrite semantics, not a lock: only the most recently issued challenge
//! can complete.

use std::sync::Arc;

use tokengate_store::{NonceStore, RuleStore, StoreError};
use tokengate_types::{
    AssignmentKey, ChallengeContext, EngineParams, FieldMatch, MessageId, RoleId, Timestamp,
    VerificationRule, VerificationTicket, WalletAddress,
};

use crate::assignment::RoleAssignmentTracker;
use crate::error::VerifyError;
use crate::matcher::{self, ZeroMinPolicy};
use crate::nonce::NonceManager;
use crate::outcome::{EvaluationPath, OutcomeNote, RuleFailure, RuleOutcome, VerifyOutcome};
use crate::providers::{AssetProvider, NotificationChannel, PlatformRoleApi, ProviderError};
use crate::signature::SignatureVerifier;

pub struct VerificationOrchestrator {
    nonces: NonceManager,
    verifier: SignatureVerifier,
    rules: Arc<dyn RuleStore>,
    tracker: RoleAssignmentTracker,
    assets: Arc<dyn AssetProvider>,
    platform: Arc<dyn PlatformRoleApi>,
    notifier: Arc<dyn NotificationChannel>,
    assignment_ttl_secs: Option<u64>,
}

impl VerificationOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: &EngineParams,
        nonce_store: Arc<dyn NonceStore>,
        rules: Arc<dyn RuleStore>,
        tracker: RoleAssignmentTracker,
        assets: Arc<dyn AssetProvider>,
        platform: Arc<dyn PlatformRoleApi>,
        notifier: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            nonces: NonceManager::new(nonce_store, params.nonce_ttl_secs),
            verifier: SignatureVerifier::from_params(params),
            rules,
            tracker,
            assets,
            platform,
            notifier,
            assignment_ttl_secs: params.assignment_ttl_secs,
        }
    }

    /// The challenge issuer, exposed for the transport layer.
    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    /// Run the full pipeline for one submission.
    ///
    /// The nonce is consumed exactly once no matter what: it is invalidated
    /// immediately after the read, before any fallible downstream step.
    pub async fn verify(
        &self,
        ticket: &VerificationTicket,
        proof_hex: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        let check = self.nonces.consume(&ticket.subject_id, &ticket.nonce);
        self.nonces.invalidate(&ticket.subject_id);

        if !check.valid {
            tracing::info!(subject = %ticket.subject_id, "rejected: stale or unknown challenge");
            return Err(VerifyError::NonceInvalidOrExpired);
        }
        let context = check.context.unwrap_or_default();

        let result = self.evaluate(ticket, proof_hex, &context).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    subject = %ticket.subject_id,
                    server = %ticket.server_id,
                    assigned = outcome.assigned_roles().len(),
                    path = ?outcome.path,
                    "verification succeeded"
                );
            }
            Err(e) => {
                tracing::info!(subject = %ticket.subject_id, error = %e, "verification rejected");
            }
        }

        self.notify_outcome(ticket, &context, &result).await;
        result
    }

    async fn evaluate(
        &self,
        ticket: &VerificationTicket,
        proof_hex: &str,
        context: &ChallengeContext,
    ) -> Result<VerifyOutcome, VerifyError> {
        let address = self
            .verifier
            .verify(ticket, proof_hex, Timestamp::now())?;

        if let Some(message_id) = &context.message_id {
            self.evaluate_message_scoped(ticket, &address, message_id)
                .await
        } else if ticket.legacy_role_id.is_some() {
            self.evaluate_legacy(ticket, &address).await
        } else {
            self.evaluate_broad(ticket, &address, context).await
        }
    }

    /// Message-scoped path: the rules bound to the challenge's message, each
    /// checked with a pre-filtered provider count. `min_items == 0` means no
    /// minimum here.
    async fn evaluate_message_scoped(
        &self,
        ticket: &VerificationTicket,
        address: &WalletAddress,
        message_id: &MessageId,
    ) -> Result<VerifyOutcome, VerifyError> {
        let rules = self
            .rules
            .rules_for_message(&ticket.server_id, message_id)
            .map_err(store_failure)?;
        if rules.is_empty() {
            return Err(VerifyError::NoApplicableRules);
        }

        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in &rules {
            let count = self
                .assets
                .count_matching(
                    address,
                    &rule.collection,
                    rule.attribute_filter(),
                    rule.min_items,
                )
                .await
                .map_err(asset_failure)?;

            let satisfied =
                matcher::satisfies_count(rule.min_items, count, ZeroMinPolicy::ZeroMeansUnbounded);
            outcomes.push(self.settle(ticket, Some(rule), &rule.role_id, satisfied).await);
        }

        finish(address.clone(), EvaluationPath::MessageScoped, outcomes)
    }

    /// Deprecated single-role path: any holding at all qualifies.
    async fn evaluate_legacy(
        &self,
        ticket: &VerificationTicket,
        address: &WalletAddress,
    ) -> Result<VerifyOutcome, VerifyError> {
        let role_id = ticket
            .legacy_role_id
            .clone()
            .ok_or_else(|| VerifyError::Unexpected("legacy path without role".to_string()))?;

        let count = self
            .assets
            .count_matching(address, &FieldMatch::Wildcard, None, Some(1))
            .await
            .map_err(asset_failure)?;

        let outcome = self.settle(ticket, None, &role_id, count >= 1).await;
        finish(address.clone(), EvaluationPath::LegacySingleRole, vec![outcome])
    }

    /// Broad-scan path: every rule for the server against one snapshot.
    /// `min_items == 0` can never match here.
    async fn evaluate_broad(
        &self,
        ticket: &VerificationTicket,
        address: &WalletAddress,
        context: &ChallengeContext,
    ) -> Result<VerifyOutcome, VerifyError> {
        let rules = self
            .rules
            .rules_for_server(&ticket.server_id)
            .map_err(store_failure)?;
        if rules.is_empty() {
            return Err(VerifyError::NoApplicableRules);
        }

        let snapshot = self
            .assets
            .snapshot(address)
            .await
            .map_err(asset_failure)?;

        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in &rules {
            let satisfied = matcher::matches(
                rule,
                &snapshot,
                context.channel_id.as_ref(),
                ZeroMinPolicy::ZeroMeansNever,
            );
            outcomes.push(self.settle(ticket, Some(rule), &rule.role_id, satisfied).await);
        }

        finish(address.clone(), EvaluationPath::BroadScan, outcomes)
    }

    /// Apply one rule's side effects. Failures here are isolated: they mark
    /// this rule failed and the loop continues with the others.
    async fn settle(
        &self,
        ticket: &VerificationTicket,
        rule: Option<&VerificationRule>,
        role_id: &RoleId,
        satisfied: bool,
    ) -> RuleOutcome {
        let rule_id = rule.map(|r| r.id);
        if !satisfied {
            return RuleOutcome::Unsatisfied {
                rule_id,
                role_id: role_id.clone(),
            };
        }

        let assign_result = self
            .platform
            .assign(&ticket.subject_id, role_id, &ticket.server_id)
            .await;

        // The assignment row is recorded whether or not the platform call
        // landed; the sweep reconciles any drift on its next pass.
        let now = Timestamp::now();
        let key = AssignmentKey::new(
            ticket.subject_id.clone(),
            ticket.server_id.clone(),
            role_id.clone(),
        );
        let expires_at = self.assignment_ttl_secs.map(|ttl| now.plus_secs(ttl));
        let persist_result = self.tracker.record_verified(&key, rule_id, now, expires_at);

        match (assign_result, persist_result) {
            (Ok(assigned), Ok(_)) => RuleOutcome::Assigned {
                rule_id,
                role_id: role_id.clone(),
                already_held: assigned.already_held,
            },
            (Err(e), _) => {
                tracing::warn!(key = %key, error = %e, "platform role grant failed");
                RuleOutcome::Failed {
                    rule_id,
                    role_id: role_id.clone(),
                    failure: RuleFailure::RoleApi(e.to_string()),
                }
            }
            (Ok(_), Err(e)) => {
                tracing::warn!(key = %key, error = %e, "assignment persistence failed");
                RuleOutcome::Failed {
                    rule_id,
                    role_id: role_id.clone(),
                    failure: RuleFailure::Persistence(e.to_string()),
                }
            }
        }
    }

    async fn notify_outcome(
        &self,
        ticket: &VerificationTicket,
        context: &ChallengeContext,
        result: &Result<VerifyOutcome, VerifyError>,
    ) {
        let note = match result {
            Ok(outcome) => OutcomeNote::Verified {
                roles: outcome.assigned_roles(),
            },
            Err(e) => OutcomeNote::Rejected {
                reason: e.user_message(),
            },
        };

        if let Err(e) = self
            .notifier
            .notify(&ticket.subject_id, context, &note)
            .await
        {
            tracing::warn!(subject = %ticket.subject_id, error = %e, "outcome notification failed");
        }
    }
}

fn store_failure(e: StoreError) -> VerifyError {
    VerifyError::Unexpected(format!("rule lookup failed: {e}"))
}

fn asset_failure(e: ProviderError) -> VerifyError {
    VerifyError::AssetProvider(e.to_string())
}

/// Aggregate per-rule outcomes into the request result. Rules existed, so an
/// all-unsatisfied evaluation is `InsufficientHoldings`; anything that was
/// satisfied (even if its side effects failed) makes the request a success
/// with the failures reported inline.
fn finish(
    address: WalletAddress,
    path: EvaluationPath,
    outcomes: Vec<RuleOutcome>,
) -> Result<VerifyOutcome, VerifyError> {
    let all_unsatisfied = outcomes
        .iter()
        .all(|o| matches!(o, RuleOutcome::Unsatisfied { .. }));
    if all_unsatisfied {
        return Err(VerifyError::InsufficientHoldings);
    }

    Ok(VerifyOutcome {
        address,
        path,
        outcomes,
    })
}
