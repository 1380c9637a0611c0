use anyhow::Result;
use std::path::Path;

use weft_core::parse::load_plan;
use weft_git::GitRepo;
use weft_scheduler::Scheduler;

pub fn execute(plan_path: &Path, repo: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let root = match repo {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let name = plan.name.clone().unwrap_or_else(|| "history".to_string());
    println!("Weaving \"{name}\" into {}", root.display());

    let mut scheduler = Scheduler::new(plan, GitRepo::open(root), seed)?;
    let summary = scheduler.run()?;

    println!(
        "{} commits attempted; {}/{} operations succeeded",
        summary.commits_attempted,
        summary.succeeded(),
        summary.operations.len()
    );
    if !summary.all_ok() {
        for op in summary.operations.iter().filter(|op| !op.ok) {
            eprintln!("  skipped: {}", op.label);
        }
    }
    Ok(())
}
