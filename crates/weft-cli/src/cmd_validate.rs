use anyhow::Result;
use std::path::Path;

use weft_core::parse::load_plan;

pub fn execute(plan_path: &Path) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let merge_order = plan.resolved_merge_order();
    println!(
        "✓ plan ok: {} branches, {} identities, trunk \"{}\"",
        plan.branches.len(),
        plan.identities.len(),
        plan.trunk
    );
    println!("  merge order: {}", merge_order.join(", "));
    if let Some(branch) = plan.release_branch() {
        println!("  release branch: {branch}");
    }
    Ok(())
}
