use anyhow::{Context, Result};
use linkmerge::v1::{MergePlan, MergeResult, MergeSession};
use std::io::Read;
use std::path::PathBuf;

use crate::cmd_validate::read_snapshot;

fn read_plan(source: &str) -> Result<MergePlan> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read plan from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {:?}", source))?
    };
    MergePlan::from_json(&content).with_context(|| format!("Invalid plan {:?}", source))
}

fn merge(existing: &PathBuf, loaded: &PathBuf, plan: Option<&MergePlan>) -> Result<MergeResult> {
    let mut session = MergeSession::new(read_snapshot(existing)?, read_snapshot(loaded)?)
        .context("Cannot start merge session")?;
    if let Some(plan) = plan {
        session.apply_plan(plan)?;
    }
    Ok(session.into_result()?)
}

pub fn run(
    existing: PathBuf,
    loaded: PathBuf,
    plan: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let plan = plan.as_deref().map(read_plan).transpose()?;
    let result = merge(&existing, &loaded, plan.as_ref())?;

    let json = if pretty {
        result.to_json_pretty()?
    } else {
        result.to_json()?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("Wrote merge result to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
