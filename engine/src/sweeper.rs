//! The reverification sweep.
//!
//! Re-walks every active assignment (oldest check first), re-evaluates the
//! originating rule against the holder's current holdings, and revokes roles
//! no longer justified. Runs on an external scheduler trigger; a single bad
//! assignment never halts the sweep.

use std::sync::Arc;

use thiserror::Error;

use tokengate_store::{RuleStore, StoreError};
use tokengate_types::{AssetHolding, RoleAssignment, Timestamp};

use crate::assignment::RoleAssignmentTracker;
use crate::matcher::{self, ZeroMinPolicy};
use crate::providers::{AssetProvider, PlatformRoleApi, ProviderError};

/// Counters for one sweep run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: u64,
    pub refreshed: u64,
    pub revoked: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Error)]
enum SweepError {
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

enum Disposition {
    Refreshed,
    Revoked,
    Skipped,
}

pub struct ReverificationSweeper {
    rules: Arc<dyn RuleStore>,
    tracker: RoleAssignmentTracker,
    assets: Arc<dyn AssetProvider>,
    platform: Arc<dyn PlatformRoleApi>,
}

impl ReverificationSweeper {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        tracker: RoleAssignmentTracker,
        assets: Arc<dyn AssetProvider>,
        platform: Arc<dyn PlatformRoleApi>,
    ) -> Self {
        Self {
            rules,
            tracker,
            assets,
            platform,
        }
    }

    /// One full pass over the active assignments.
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let active = match self.tracker.active_assignments() {
            Ok(active) => active,
            Err(e) => {
                tracing::error!(error = %e, "sweep aborted: could not list active assignments");
                report.failed += 1;
                return report;
            }
        };

        for assignment in active {
            report.checked += 1;
            match self.check_one(&assignment).await {
                Ok(Disposition::Refreshed) => report.refreshed += 1,
                Ok(Disposition::Revoked) => report.revoked += 1,
                Ok(Disposition::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        key = %assignment.key(),
                        error = %e,
                        "reverification check failed; continuing sweep"
                    );
                }
            }
        }

        tracing::info!(
            checked = report.checked,
            refreshed = report.refreshed,
            revoked = report.revoked,
            skipped = report.skipped,
            failed = report.failed,
            "reverification sweep complete"
        );
        report
    }

    async fn check_one(&self, assignment: &RoleAssignment) -> Result<Disposition, SweepError> {
        // Legacy grants carry no rule; nothing to re-evaluate.
        let Some(rule_id) = assignment.rule_id else {
            return Ok(Disposition::Skipped);
        };
        // Deleted rules skip permissively rather than punishing the holder.
        let Some(rule) = self.rules.rule_by_id(rule_id)? else {
            return Ok(Disposition::Skipped);
        };

        if !self
            .platform
            .is_member(&assignment.subject_id, &assignment.server_id)
            .await?
        {
            return Ok(Disposition::Skipped);
        }

        let addresses = self.assets.addresses_for(&assignment.subject_id).await?;
        let mut holdings: Vec<AssetHolding> = Vec::new();
        for address in &addresses {
            holdings.extend(self.assets.snapshot(address).await?);
        }

        let now = Timestamp::now();
        if matcher::matches(&rule, &holdings, None, ZeroMinPolicy::ZeroMeansNever) {
            self.tracker.touch(&assignment.key(), now)?;
            return Ok(Disposition::Refreshed);
        }

        // Revoke on the platform first; if that call fails the status is
        // left active and the next sweep retries.
        self.platform
            .revoke(
                &assignment.subject_id,
                &assignment.role_id,
                &assignment.server_id,
            )
            .await?;
        self.tracker.mark_revoked(&assignment.key(), now)?;
        Ok(Disposition::Revoked)
    }
}
