//! Pure timeline planning: timestamps and authors for commits and merges,
//! drawn from a caller-threaded generator under the ordering constraints.
//!
//! Per-branch commit timestamps are drawn independently, so a later-created
//! commit may carry an earlier timestamp than its predecessor. That models
//! interleaved work on a branch and is kept deliberately; ordering is only
//! enforced at merge points.

use rand::Rng;
use time::Duration;

use weft_core::plan::{BranchPlan, PlanSpec};
use weft_core::window::{sample_between, TimeWindow};
use weft_core::{IdentityPool, MergeEvent, ScheduledCommit};

/// The opening trunk commit: timestamp uniform within the first day of the
/// project span, authored by the lead identity.
pub fn plan_initial_commit<R: Rng>(
    rng: &mut R,
    plan: &PlanSpec,
    pool: &IdentityPool,
    window: TimeWindow,
) -> ScheduledCommit {
    let first_day = TimeWindow::new(
        window.start,
        window.end.min(window.start + Duration::days(1)),
    );
    ScheduledCommit {
        branch: plan.trunk.clone(),
        timestamp: first_day.sample(rng),
        author: pool.lead().clone(),
        message: plan.initial_message.clone(),
        targets: plan.initial_targets.clone(),
    }
}

/// Plan one branch's commits.
///
/// The commit count is drawn once from the inclusive configured range; each
/// commit then draws its author and timestamp independently. A degenerate
/// window yields exactly one commit pinned to its start.
pub fn plan_branch<R: Rng>(
    rng: &mut R,
    pool: &IdentityPool,
    branch: &BranchPlan,
    window: TimeWindow,
) -> Vec<ScheduledCommit> {
    let count = if window.is_degenerate() {
        1
    } else {
        rng.gen_range(branch.commits.min..=branch.commits.max) as usize
    };
    (0..count)
        .map(|i| ScheduledCommit {
            branch: branch.name.clone(),
            timestamp: window.sample(rng),
            author: pool.choose(rng).clone(),
            message: branch.messages[i % branch.messages.len()].clone(),
            targets: branch.targets.clone(),
        })
        .collect()
}

/// Plan a branch's merge into the trunk.
///
/// With applied commits the merge lands between the branch's latest commit
/// and three days after it, capped at the window end and pinned to the
/// latest commit when that cap collapses the range. A branch that landed
/// nothing draws from `fallback` instead. The merge author is drawn from the
/// pool independently of who authored the branch.
pub fn plan_merge<R: Rng>(
    rng: &mut R,
    pool: &IdentityPool,
    branch: &str,
    commits: &[ScheduledCommit],
    window: TimeWindow,
    fallback: TimeWindow,
) -> MergeEvent {
    let timestamp = match commits.iter().map(|c| c.timestamp).max() {
        Some(latest) => sample_between(rng, latest, window.end.min(latest + Duration::days(3))),
        None => fallback.sample(rng),
    };
    MergeEvent {
        branch: branch.to_string(),
        timestamp,
        author: pool.choose(rng).clone(),
        message: format!("Merge {branch}"),
    }
}

/// Branch commits land inside the span with a day of margin on each side,
/// leaving room for the initial commit before them and merges after.
pub fn work_window(window: TimeWindow) -> TimeWindow {
    window.shrunk(Duration::days(1), Duration::days(1))
}

/// Merge fallback for branches that landed no commits: well inside the span,
/// away from both edges.
pub fn merge_fallback_window(window: TimeWindow) -> TimeWindow {
    window.shrunk(Duration::days(5), Duration::days(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;
    use weft_core::plan::{CommitRange, PlanSpec};
    use weft_core::Identity;

    fn pool() -> IdentityPool {
        IdentityPool::new(vec![
            Identity {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
            Identity {
                name: "Brin".into(),
                email: "brin@example.com".into(),
            },
        ])
    }

    fn branch(min: u32, max: u32) -> BranchPlan {
        BranchPlan {
            name: "feature/x".into(),
            parent: None,
            commits: CommitRange { min, max },
            messages: vec!["one".into(), "two".into(), "three".into()],
            targets: vec![],
        }
    }

    fn span() -> TimeWindow {
        TimeWindow::new(
            datetime!(2025-11-02 00:00 UTC),
            datetime!(2025-11-12 00:00 UTC),
        )
    }

    fn plan_yaml() -> PlanSpec {
        weft_core::parse::parse_plan(
            r#"
window: { start: "2025-11-02", end: "2025-11-12" }
identities:
  - { name: "Ada", email: "ada@example.com" }
branches:
  - name: feature/x
    commits: { min: 1, max: 1 }
    messages: ["x"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn initial_commit_lands_in_the_first_day() {
        let plan = plan_yaml();
        let p = pool();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let c = plan_initial_commit(&mut rng, &plan, &p, span());
            assert_eq!(c.branch, "main");
            assert_eq!(c.author.name, "Ada");
            assert!(c.timestamp >= span().start);
            assert!(c.timestamp < span().start + Duration::days(1));
        }
    }

    #[test]
    fn branch_commits_stay_in_window_and_range() {
        let p = pool();
        let w = span();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let commits = plan_branch(&mut rng, &p, &branch(2, 4), w);
            assert!((2..=4).contains(&commits.len()));
            for c in &commits {
                assert!(w.contains(c.timestamp), "{} outside window", c.timestamp);
            }
        }
    }

    #[test]
    fn fixed_range_yields_exact_count_and_cycled_messages() {
        let p = pool();
        let mut rng = StdRng::seed_from_u64(5);
        let commits = plan_branch(&mut rng, &p, &branch(5, 5), span());
        assert_eq!(commits.len(), 5);
        let msgs: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(msgs, ["one", "two", "three", "one", "two"]);
    }

    #[test]
    fn degenerate_window_pins_one_commit_to_start() {
        let p = pool();
        let t = datetime!(2025-11-02 00:00 UTC);
        let mut rng = StdRng::seed_from_u64(8);
        let commits = plan_branch(&mut rng, &p, &branch(2, 4), TimeWindow::new(t, t));
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].timestamp, t);
    }

    #[test]
    fn merge_respects_latest_commit_and_three_day_cap() {
        let p = pool();
        let w = span();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let commits = plan_branch(&mut rng, &p, &branch(2, 2), w);
            let latest = commits.iter().map(|c| c.timestamp).max().unwrap();
            let ev = plan_merge(&mut rng, &p, "feature/x", &commits, w, merge_fallback_window(w));
            assert!(ev.timestamp >= latest);
            assert!(ev.timestamp <= w.end.min(latest + Duration::days(3)));
        }
    }

    #[test]
    fn merge_pins_when_cap_collapses_below_latest_commit() {
        let p = pool();
        let w = span();
        let late = datetime!(2025-11-11 23:59:59 UTC);
        let commits = vec![ScheduledCommit {
            branch: "feature/x".into(),
            timestamp: late,
            author: p.lead().clone(),
            message: "late".into(),
            targets: vec![],
        }];
        let mut rng = StdRng::seed_from_u64(2);
        let ev = plan_merge(&mut rng, &p, "feature/x", &commits, w, merge_fallback_window(w));
        assert_eq!(ev.timestamp, late);
    }

    #[test]
    fn merge_of_empty_branch_uses_fallback_window() {
        let p = pool();
        let w = span();
        let fallback = merge_fallback_window(w);
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..100 {
            let ev = plan_merge(&mut rng, &p, "feature/x", &[], w, fallback);
            assert!(ev.timestamp >= fallback.start);
            assert!(ev.timestamp <= fallback.end);
            assert_eq!(ev.message, "Merge feature/x");
        }
    }

    #[test]
    fn seeded_planning_is_reproducible() {
        let p = pool();
        let a = plan_branch(&mut StdRng::seed_from_u64(99), &p, &branch(2, 4), span());
        let b = plan_branch(&mut StdRng::seed_from_u64(99), &p, &branch(2, 4), span());
        assert_eq!(a, b);
    }
}
