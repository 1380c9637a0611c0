use anyhow::{Context, Result};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

use weft_core::parse::load_plan;
use weft_git::GitRepo;
use weft_scheduler::{Scheduler, TimelineOp};

pub fn execute(plan_path: &Path, seed: Option<u64>) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let mut scheduler = Scheduler::new(plan, GitRepo::open(std::env::current_dir()?), seed)?;

    for op in scheduler.preview()? {
        match op {
            TimelineOp::Commit(c) => println!(
                "{}  commit  {:28} {:16} {}",
                fmt(c.timestamp)?,
                c.branch,
                c.author.name,
                c.message
            ),
            TimelineOp::Merge(m) => println!(
                "{}  merge   {:28} {:16} {}",
                fmt(m.timestamp)?,
                m.branch,
                m.author.name,
                m.message
            ),
        }
    }
    Ok(())
}

fn fmt(ts: time::OffsetDateTime) -> Result<String> {
    ts.format(&Rfc3339).context("formatting timestamp")
}
