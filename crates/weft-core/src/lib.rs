pub mod identity;
pub mod parse;
pub mod plan;
pub mod window;

pub use identity::{Identity, IdentityPool};
pub use plan::{BranchPlan, CommitRange, CommitTarget, PlanSpec, ReleasePhase, Strategy};
pub use window::TimeWindow;

use time::OffsetDateTime;

/// One planned commit, produced by the scheduler and consumed exactly once
/// by the repository driver.
///
/// Within a branch, timestamps are deliberately NOT monotonic in creation
/// order: each commit draws its instant independently from the branch window,
/// modeling interleaved, non-chronological development activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCommit {
    pub branch: String,
    pub timestamp: OffsetDateTime,
    pub author: Identity,
    pub message: String,
    /// Tried in order; the first target that actually changes its file wins.
    pub targets: Vec<CommitTarget>,
}

/// One planned merge into the trunk.
/// Invariant: `timestamp >= max(timestamp of the branch's applied commits)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeEvent {
    pub branch: String,
    pub timestamp: OffsetDateTime,
    pub author: Identity,
    pub message: String,
}

/// Outcome of one applied operation (commit, branch creation, or merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReport {
    pub label: String,
    pub ok: bool,
}

/// Tally of a full run. Failed operations are recorded, never fatal:
/// the scheduler's contract is best-effort history construction.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub commits_attempted: usize,
    pub operations: Vec<OpReport>,
}

impl RunSummary {
    pub fn record(&mut self, label: impl Into<String>, ok: bool) {
        self.operations.push(OpReport {
            label: label.into(),
            ok,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.operations.iter().filter(|op| op.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.operations.iter().filter(|op| !op.ok).count()
    }

    pub fn all_ok(&self) -> bool {
        self.operations.iter().all(|op| op.ok)
    }
}
