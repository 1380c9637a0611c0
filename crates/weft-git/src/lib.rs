use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use weft_core::Identity;

/// Thin façade over git subprocess primitives. Owns no scheduling logic.
///
/// Every operation is synchronous and reports success/failure only: a
/// non-zero git exit is a `false` outcome, while a failure to spawn git at
/// all propagates as an error.
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .with_context(|| format!("running git {}", args.join(" ")))
    }

    /// `git checkout -b name`, falling back to a plain checkout when the
    /// branch already exists. Works on an unborn HEAD in a fresh repository.
    pub fn ensure_branch(&self, name: &str) -> Result<bool> {
        if self.git(&["checkout", "-b", name])?.status.success() {
            return Ok(true);
        }
        if self.checkout(name)? {
            return Ok(true);
        }
        // Unborn HEAD already on `name` in a fresh repository: neither
        // checkout form succeeds, but there is nothing to do.
        let head = self.git(&["symbolic-ref", "--short", "HEAD"])?;
        Ok(head.status.success() && String::from_utf8_lossy(&head.stdout).trim() == name)
    }

    /// Create `name` from `from` and leave it checked out.
    pub fn create_branch(&self, name: &str, from: &str) -> Result<bool> {
        if !self.checkout(from)? {
            return Ok(false);
        }
        if self.git(&["checkout", "-b", name])?.status.success() {
            return Ok(true);
        }
        // Branch may survive from an earlier partial run.
        self.checkout(name)
    }

    pub fn checkout(&self, reference: &str) -> Result<bool> {
        Ok(self.git(&["checkout", reference])?.status.success())
    }

    /// Stage every change in the working tree, additions and deletions alike.
    pub fn stage_all(&self) -> Result<bool> {
        Ok(self.git(&["add", "-A"])?.status.success())
    }

    /// `git diff --cached --quiet` exits non-zero exactly when something is
    /// staged.
    pub fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.git(&["diff", "--cached", "--quiet"])?.status.success())
    }

    /// Commit the staged changes as `author`, with both the author and
    /// committer timestamps pinned to `timestamp` rather than wall-clock
    /// time.
    pub fn commit(&self, message: &str, author: &Identity, timestamp: OffsetDateTime) -> Result<bool> {
        let date = git_date(timestamp)?;
        let output = self
            .identity_command(author)
            .args(["commit", "-m", message])
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .output()
            .context("running git commit")?;
        Ok(output.status.success())
    }

    /// Merge `branch` into the current branch. With `no_ff` a merge commit is
    /// created even when a fast-forward would do, so the merge stays visible
    /// in history. A conflict surfaces as a `false` outcome, never an error.
    pub fn merge(
        &self,
        branch: &str,
        message: &str,
        author: &Identity,
        timestamp: OffsetDateTime,
        no_ff: bool,
    ) -> Result<bool> {
        let date = git_date(timestamp)?;
        let mut cmd = self.identity_command(author);
        cmd.arg("merge");
        if no_ff {
            cmd.arg("--no-ff");
        }
        let output = cmd
            .args([branch, "-m", message])
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .output()
            .context("running git merge")?;
        Ok(output.status.success())
    }

    /// Back out of a conflicted merge so the current branch stays usable.
    /// Fails harmlessly when no merge is in progress.
    pub fn abort_merge(&self) -> Result<bool> {
        Ok(self.git(&["merge", "--abort"])?.status.success())
    }

    /// `git checkout -- .`: restore tracked files to their committed content.
    pub fn restore_tracked(&self) -> Result<bool> {
        Ok(self.git(&["checkout", "--", "."])?.status.success())
    }

    /// Current branch via `git rev-parse --abbrev-ref HEAD`, or `None` when
    /// the repository has no commits yet.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let output = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if !output.status.success() {
            return Ok(None);
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!name.is_empty()).then_some(name))
    }

    /// Commit count reachable from `reference`.
    pub fn rev_count(&self, reference: &str) -> Result<u64> {
        let output = self.git(&["rev-list", "--count", reference])?;
        if !output.status.success() {
            anyhow::bail!(
                "git rev-list failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .context("parsing rev-list count")
    }

    /// Merge-commit count reachable from `reference`.
    pub fn merge_count(&self, reference: &str) -> Result<u64> {
        let output = self.git(&["rev-list", "--count", "--merges", reference])?;
        if !output.status.success() {
            anyhow::bail!(
                "git rev-list failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .context("parsing rev-list count")
    }

    /// A git invocation with the author identity threaded in per-call, so no
    /// repository or global config is touched.
    fn identity_command(&self, author: &Identity) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-c")
            .arg(format!("user.name={}", author.name))
            .arg("-c")
            .arg(format!("user.email={}", author.email))
            .current_dir(&self.root);
        cmd
    }
}

/// Git accepts strict ISO 8601 for its date environment overrides.
fn git_date(timestamp: OffsetDateTime) -> Result<String> {
    timestamp
        .format(&Rfc3339)
        .context("formatting commit timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn author() -> Identity {
        Identity {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn init_repo(dir: &Path) -> GitRepo {
        let repo = GitRepo::open(dir);
        let out = Command::new("git")
            .args(["init"])
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(out.status.success());
        repo
    }

    #[test]
    fn commit_pins_author_and_committer_date() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        assert!(repo.ensure_branch("main").unwrap());

        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        assert!(repo.stage_all().unwrap());
        assert!(repo.has_staged_changes().unwrap());

        let ts = datetime!(2025-11-02 10:30 UTC);
        assert!(repo.commit("first", &author(), ts).unwrap());

        let out = Command::new("git")
            .args(["log", "-1", "--format=%an|%aI|%cI"])
            .current_dir(dir.path())
            .output()
            .unwrap();
        let line = String::from_utf8_lossy(&out.stdout);
        assert!(line.starts_with("Ada|"), "got {line}");
        assert!(line.contains("2025-11-02T10:30:00"), "got {line}");
    }

    #[test]
    fn staged_detection_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        assert!(repo.ensure_branch("main").unwrap());
        assert!(!repo.has_staged_changes().unwrap());

        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        repo.stage_all().unwrap();
        repo.commit("first", &author(), datetime!(2025-11-02 08:00 UTC))
            .unwrap();

        // Nothing staged, commit is rejected: a false outcome, not an error.
        assert!(!repo.has_staged_changes().unwrap());
        assert!(!repo
            .commit("empty", &author(), datetime!(2025-11-02 09:00 UTC))
            .unwrap());
        assert_eq!(repo.rev_count("main").unwrap(), 1);
    }

    #[test]
    fn no_ff_merge_creates_a_merge_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        repo.ensure_branch("main").unwrap();
        std::fs::write(dir.path().join("base.txt"), "base\n").unwrap();
        repo.stage_all().unwrap();
        repo.commit("base", &author(), datetime!(2025-11-02 08:00 UTC))
            .unwrap();

        assert!(repo.create_branch("feature/x", "main").unwrap());
        std::fs::write(dir.path().join("x.txt"), "x\n").unwrap();
        repo.stage_all().unwrap();
        repo.commit("feat", &author(), datetime!(2025-11-03 08:00 UTC))
            .unwrap();

        assert!(repo.checkout("main").unwrap());
        assert!(repo
            .merge(
                "feature/x",
                "Merge feature/x",
                &author(),
                datetime!(2025-11-04 08:00 UTC),
                true,
            )
            .unwrap());
        assert_eq!(repo.merge_count("main").unwrap(), 1);
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn create_branch_from_missing_ref_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        assert!(!repo.create_branch("feature/x", "no-such-ref").unwrap());
    }
}
