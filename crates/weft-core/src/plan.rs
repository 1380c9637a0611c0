use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Declarative description of the history to synthesize: branches, commit
/// counts, message pools, mutation targets, and the merge order.
///
/// Static per run: constructed once by the parser and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Optional kebab-case plan name, used only in output.
    #[serde(default)]
    pub name: Option<String>,
    /// The long-lived integration branch every feature branch merges into.
    #[serde(default = "default_trunk")]
    pub trunk: String,
    /// Overall project span.
    pub window: WindowSpec,
    pub identities: Vec<Identity>,
    /// Message for the opening trunk commit.
    #[serde(default = "default_initial_message")]
    pub initial_message: String,
    /// Targets for the opening trunk commit.
    #[serde(default)]
    pub initial_targets: Vec<CommitTarget>,
    pub branches: Vec<BranchPlan>,
    /// Branches merged into the trunk, in this order. Defaults to declaration
    /// order, minus the release branch. A branch may be listed here to merge
    /// much later than its peers.
    #[serde(default)]
    pub merge_order: Vec<String>,
    /// Tried in order when a commit's own targets all produced no change.
    #[serde(default)]
    pub fallback_targets: Vec<CommitTarget>,
    /// Always-present tracked file that takes a benign appended line when
    /// every other target is a no-op. Commit application is change-guaranteed
    /// as long as this file is writable.
    #[serde(default = "default_touch_file")]
    pub touch_file: String,
    /// Terminal release commit + late merge for the last branch.
    #[serde(default)]
    pub release: Option<ReleasePhase>,
    /// RNG seed. Omit for a non-reproducible run.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Raw window as written in YAML. Accepts RFC 3339 timestamps or bare
/// `YYYY-MM-DD` dates (taken as midnight UTC); resolved by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: String,
    pub end: String,
}

/// One feature branch: where it forks from, how many commits it receives,
/// and what those commits say and touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchPlan {
    pub name: String,
    /// Ref the branch is created from. Defaults to the trunk.
    #[serde(default)]
    pub parent: Option<String>,
    pub commits: CommitRange,
    /// Commit `i` takes `messages[i % messages.len()]`, so pools shorter
    /// than the commit count repeat deterministically.
    pub messages: Vec<String>,
    #[serde(default)]
    pub targets: Vec<CommitTarget>,
}

/// Inclusive bounds for a branch's commit count, drawn once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRange {
    pub min: u32,
    pub max: u32,
}

/// One file/strategy pair a commit may mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTarget {
    pub path: String,
    pub strategy: Strategy,
}

/// Closed set of content mutation strategies. Each is a pure
/// `(bytes) -> (bytes, changed)` transform, implemented in `weft-mutate`,
/// so the set can grow without touching the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Prepend a comment line, or suffix an existing leading comment.
    /// Deliberately not idempotent: it must always produce a visible diff.
    CommentInsert,
    /// Collapse runs of 3+ blank lines to exactly 2.
    WhitespaceNormalize,
    /// Insert a marker field into a JSON document, once.
    StructuredFieldTouch,
    /// Append a trailing newline if absent.
    TrailingNewlineEnsure,
}

impl Strategy {
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::CommentInsert => "comment-insert",
            Strategy::WhitespaceNormalize => "whitespace-normalize",
            Strategy::StructuredFieldTouch => "structured-field-touch",
            Strategy::TrailingNewlineEnsure => "trailing-newline-ensure",
        }
    }
}

/// The release phase: one terminal commit on a designated branch, drawn from
/// a window skewed later than the main span, followed by the run's last merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasePhase {
    /// Branch carrying the terminal commit. Defaults to the last declared
    /// branch, which is then excluded from the default merge order.
    #[serde(default)]
    pub branch: Option<String>,
    pub message: String,
    #[serde(default)]
    pub targets: Vec<CommitTarget>,
    pub window: WindowSpec,
}

impl PlanSpec {
    /// The branch the release phase lands on, if a release phase exists.
    pub fn release_branch(&self) -> Option<&str> {
        let release = self.release.as_ref()?;
        match &release.branch {
            Some(name) => Some(name),
            None => self.branches.last().map(|b| b.name.as_str()),
        }
    }

    /// Merge order with the default applied: declaration order, minus the
    /// release branch (it merges separately, after the release commit).
    pub fn resolved_merge_order(&self) -> Vec<String> {
        if !self.merge_order.is_empty() {
            return self.merge_order.clone();
        }
        let skip = self.release_branch();
        self.branches
            .iter()
            .map(|b| b.name.clone())
            .filter(|name| Some(name.as_str()) != skip)
            .collect()
    }
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_initial_message() -> String {
    "Initial project setup".to_string()
}

fn default_touch_file() -> String {
    ".gitignore".to_string()
}
