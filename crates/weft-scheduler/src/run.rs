use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

use weft_core::plan::{CommitTarget, PlanSpec};
use weft_core::window::TimeWindow;
use weft_core::{IdentityPool, MergeEvent, RunSummary, ScheduledCommit};
use weft_git::GitRepo;

use crate::timeline::{self, merge_fallback_window, work_window};

const CLEANUP_MESSAGE: &str = "Finalize project structure and cleanup";

/// Drives a plan end to end: plans the timeline, mutates content so every
/// commit has a real diff, and sequences the repository driver.
///
/// Fully sequential. Repository state (current branch, index, working tree)
/// is process-wide shared state, so each operation completes before the next
/// starts. A failed commit or merge is recorded in the summary and the run
/// continues; partial histories are an accepted outcome.
pub struct Scheduler {
    plan: PlanSpec,
    pool: IdentityPool,
    window: TimeWindow,
    repo: GitRepo,
    rng: StdRng,
}

/// One entry of a previewed timeline.
#[derive(Debug, Clone)]
pub enum TimelineOp {
    Commit(ScheduledCommit),
    Merge(MergeEvent),
}

impl Scheduler {
    /// `seed` overrides `plan.seed`; with neither, the generator is seeded
    /// from entropy and the run is not reproducible.
    pub fn new(plan: PlanSpec, repo: GitRepo, seed: Option<u64>) -> Result<Self> {
        let window = plan.window.resolve().context("resolving plan window")?;
        let pool = IdentityPool::new(plan.identities.clone());
        let rng = match seed.or(plan.seed) {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            plan,
            pool,
            window,
            repo,
            rng,
        })
    }

    /// Execute the plan against the working tree. Never aborts on a single
    /// failed operation; the returned summary is the caller's record.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let trunk = self.plan.trunk.clone();

        summary.record(
            format!("checkout {trunk}"),
            self.repo.ensure_branch(&trunk)?,
        );

        let initial =
            timeline::plan_initial_commit(&mut self.rng, &self.plan, &self.pool, self.window);
        let mut latest = initial.timestamp;
        self.apply_commit(&initial, &mut summary)?;

        let work = work_window(self.window);
        let fallback = merge_fallback_window(self.window);

        // Branches strictly in declaration order: the structure stays
        // deterministic even though individual timestamps are randomized.
        let mut applied: Vec<(String, Vec<ScheduledCommit>)> = Vec::new();
        let branch_plans = self.plan.branches.clone();
        for bp in &branch_plans {
            let parent = bp.parent.clone().unwrap_or_else(|| trunk.clone());
            let created = self.repo.create_branch(&bp.name, &parent)?;
            summary.record(format!("branch {}", bp.name), created);

            let mut landed = Vec::new();
            if created {
                for commit in timeline::plan_branch(&mut self.rng, &self.pool, bp, work) {
                    if self.apply_commit(&commit, &mut summary)? {
                        latest = latest.max(commit.timestamp);
                        landed.push(commit);
                    }
                }
            }
            applied.push((bp.name.clone(), landed));
        }

        // Merges strictly in the caller-specified order, which need not match
        // creation order: a branch may land much later than its peers.
        for name in self.plan.resolved_merge_order() {
            let commits = applied
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| c.clone())
                .unwrap_or_default();
            let event =
                timeline::plan_merge(&mut self.rng, &self.pool, &name, &commits, work, fallback);
            latest = latest.max(event.timestamp);
            self.apply_merge(&event, &mut summary)?;
        }

        if let Some(release) = self.plan_release_commit()? {
            if self.repo.checkout(&release.branch)? {
                if self.apply_commit(&release, &mut summary)? {
                    latest = latest.max(release.timestamp);
                }
                let event = MergeEvent {
                    branch: release.branch.clone(),
                    timestamp: release.timestamp,
                    author: self.pool.lead().clone(),
                    message: format!("Merge {}", release.branch),
                };
                latest = latest.max(event.timestamp);
                self.apply_merge(&event, &mut summary)?;
            } else {
                summary.record(format!("checkout {}", release.branch), false);
            }
        }

        self.unify(latest, &mut summary)?;
        Ok(summary)
    }

    /// Plan the full timeline without touching the repository, assuming every
    /// commit applies.
    pub fn preview(&mut self) -> Result<Vec<TimelineOp>> {
        let mut ops = vec![TimelineOp::Commit(timeline::plan_initial_commit(
            &mut self.rng,
            &self.plan,
            &self.pool,
            self.window,
        ))];

        let work = work_window(self.window);
        let fallback = merge_fallback_window(self.window);

        let mut planned: Vec<(String, Vec<ScheduledCommit>)> = Vec::new();
        for bp in &self.plan.branches {
            let commits = timeline::plan_branch(&mut self.rng, &self.pool, bp, work);
            ops.extend(commits.iter().cloned().map(TimelineOp::Commit));
            planned.push((bp.name.clone(), commits));
        }

        for name in self.plan.resolved_merge_order() {
            let commits = planned
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| c.as_slice())
                .unwrap_or(&[]);
            ops.push(TimelineOp::Merge(timeline::plan_merge(
                &mut self.rng,
                &self.pool,
                &name,
                commits,
                work,
                fallback,
            )));
        }

        if let Some(release) = self.plan_release_commit()? {
            let event = MergeEvent {
                branch: release.branch.clone(),
                timestamp: release.timestamp,
                author: self.pool.lead().clone(),
                message: format!("Merge {}", release.branch),
            };
            ops.push(TimelineOp::Commit(release));
            ops.push(TimelineOp::Merge(event));
        }

        Ok(ops)
    }

    /// The terminal release commit, when the plan declares a release phase:
    /// lead-authored, drawn from the release window.
    fn plan_release_commit(&mut self) -> Result<Option<ScheduledCommit>> {
        let Some(release) = &self.plan.release else {
            return Ok(None);
        };
        let window = release.window.resolve().context("resolving release window")?;
        let Some(branch) = self.plan.release_branch() else {
            return Ok(None);
        };
        Ok(Some(ScheduledCommit {
            branch: branch.to_string(),
            timestamp: window.sample(&mut self.rng),
            author: self.pool.lead().clone(),
            message: release.message.clone(),
            targets: release.targets.clone(),
        }))
    }

    /// Mutate targets until one produces a change, stage, and commit with the
    /// planned identity and the author/committer timestamps pinned to the
    /// scheduled instant. A rejected commit is recorded and skipped, never an
    /// abort.
    fn apply_commit(&mut self, commit: &ScheduledCommit, summary: &mut RunSummary) -> Result<bool> {
        summary.commits_attempted += 1;

        let mut changed = self.mutate_first(&commit.targets)?;
        if !changed {
            let fallbacks = self.plan.fallback_targets.clone();
            changed = self.mutate_first(&fallbacks)?;
        }
        if !changed {
            let touch = self.repo.root().join(&self.plan.touch_file);
            weft_mutate::append_blank_line(&touch)?;
        }

        self.repo.stage_all()?;
        if !self.repo.has_staged_changes()? {
            // Every target was a no-op against the index; force a benign
            // change on the touch file and restage.
            let touch = self.repo.root().join(&self.plan.touch_file);
            if weft_mutate::append_blank_line(&touch)? {
                self.repo.stage_all()?;
            }
        }

        // Still attempted even if nothing is staged: the backend's rejection
        // comes back as a recorded skip rather than a hard failure.
        let ok = self
            .repo
            .commit(&commit.message, &commit.author, commit.timestamp)?;
        if ok {
            println!(
                "  ✓ {} {} ({})",
                commit.branch, commit.message, commit.author.name
            );
        } else {
            eprintln!("  ✗ commit skipped on {}: {}", commit.branch, commit.message);
        }
        summary.record(format!("commit {}: {}", commit.branch, commit.message), ok);
        Ok(ok)
    }

    /// Run targets in order through the mutator, stopping at the first one
    /// that reports a change. Missing files are "nothing to do", not errors.
    fn mutate_first(&self, targets: &[CommitTarget]) -> Result<bool> {
        for target in targets {
            let path: PathBuf = self.repo.root().join(&target.path);
            if weft_mutate::mutate_file(&path, target.strategy)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Check out the trunk and merge a branch into it with `--no-ff`
    /// semantics and a pinned timestamp. A conflict is backed out so the
    /// trunk stays usable for the operations that follow.
    fn apply_merge(&mut self, event: &MergeEvent, summary: &mut RunSummary) -> Result<bool> {
        if !self.repo.checkout(&self.plan.trunk)? {
            eprintln!("  ✗ cannot check out {} for merge", self.plan.trunk);
            summary.record(format!("merge {}", event.branch), false);
            return Ok(false);
        }
        let ok = self.repo.merge(
            &event.branch,
            &event.message,
            &event.author,
            event.timestamp,
            true,
        )?;
        if ok {
            println!("  ✓ merge {} ({})", event.branch, event.author.name);
        } else {
            eprintln!("  ✗ merge failed: {}", event.branch);
            self.repo.abort_merge()?;
        }
        summary.record(format!("merge {}", event.branch), ok);
        Ok(ok)
    }

    /// Final unification: restore tracked content, then fold whatever remains
    /// in the working tree into one cleanup commit 10 to 60 minutes after the
    /// last planned timestamp.
    ///
    /// `latest` is the maximum over every commit and merge timestamp, release
    /// merge included, so the cleanup commit is the chronologically last one
    /// even when a branch sampled later than the release window.
    fn unify(&mut self, latest: OffsetDateTime, summary: &mut RunSummary) -> Result<()> {
        self.repo.checkout(&self.plan.trunk)?;
        self.repo.restore_tracked()?;
        self.repo.stage_all()?;
        if !self.repo.has_staged_changes()? {
            return Ok(());
        }
        let ts = latest + Duration::minutes(self.rng.gen_range(10..=60));
        summary.commits_attempted += 1;
        let ok = self.repo.commit(CLEANUP_MESSAGE, self.pool.lead(), ts)?;
        summary.record("commit cleanup", ok);
        Ok(())
    }
}
