use anyhow::{bail, Context, Result};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::plan::{PlanSpec, WindowSpec};
use crate::window::TimeWindow;

/// Load and validate a plan from a YAML file.
pub fn load_plan(path: &Path) -> Result<PlanSpec> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_plan(&content)
}

/// Parse and validate a plan from a YAML string.
pub fn parse_plan(yaml: &str) -> Result<PlanSpec> {
    let plan: PlanSpec = serde_yaml::from_str(yaml).context("plan schema validation failed")?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Parse a plan timestamp. Accepts RFC 3339 (`2025-11-02T09:30:00Z`) or a
/// bare date (`2025-11-02`), taken as midnight UTC.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    let owned;
    let candidate = if s.len() == 10 && !s.contains('T') {
        owned = format!("{s}T00:00:00Z");
        owned.as_str()
    } else {
        s
    };
    OffsetDateTime::parse(candidate, &Rfc3339).with_context(|| format!("invalid timestamp '{s}'"))
}

impl WindowSpec {
    /// Resolve the raw strings into a concrete window, checking ordering.
    pub fn resolve(&self) -> Result<TimeWindow> {
        let start = parse_timestamp(&self.start)?;
        let end = parse_timestamp(&self.end)?;
        if end < start {
            bail!("window end '{}' precedes start '{}'", self.end, self.start);
        }
        Ok(TimeWindow::new(start, end))
    }
}

fn validate_plan(plan: &PlanSpec) -> Result<()> {
    if plan.identities.is_empty() {
        bail!("plan needs at least one identity");
    }
    if plan.branches.is_empty() {
        bail!("plan declares no branches");
    }
    plan.window.resolve().context("invalid plan window")?;

    for branch in &plan.branches {
        if branch.name == plan.trunk {
            bail!("branch '{}' shadows the trunk", branch.name);
        }
        if branch.commits.min > branch.commits.max {
            bail!(
                "branch '{}': commit range min {} exceeds max {}",
                branch.name,
                branch.commits.min,
                branch.commits.max
            );
        }
        if branch.commits.max == 0 {
            bail!("branch '{}': commit range max must be at least 1", branch.name);
        }
        if branch.messages.is_empty() {
            bail!("branch '{}' has an empty message pool", branch.name);
        }
    }

    let declared: Vec<&str> = plan.branches.iter().map(|b| b.name.as_str()).collect();
    for name in &plan.merge_order {
        if !declared.contains(&name.as_str()) {
            bail!("merge_order names undeclared branch '{name}'");
        }
    }

    if let Some(release) = &plan.release {
        release.window.resolve().context("invalid release window")?;
        if let Some(branch) = plan.release_branch() {
            if !declared.contains(&branch) {
                bail!("release branch '{branch}' is not declared");
            }
            if plan.merge_order.iter().any(|n| n == branch) {
                bail!("release branch '{branch}' must not appear in merge_order");
            }
        }
    }

    Ok(())
}
