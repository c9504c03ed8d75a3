//! The issue-to-change pipeline.
//!
//! One linear pass: load documents, build the prompt, call the completion
//! endpoint, interpret the reply, apply it. Any fatal signal short-circuits
//! to the caller; there are no retries or backward transitions inside a
//! run. Re-entrant invocation against the same working tree is unsupported.

use crate::apply::{self, ApplyReport};
use crate::changeset::parse_change_set;
use crate::completion::{self, Credentials};
use crate::docs;
use crate::error::RunError;
use crate::exec::{run_shell, CommandResult};
use crate::prompt::{self, ParseMode};
use crate::util::clip;
use anyhow::Result;
use std::path::{Path, PathBuf};

const RESPONSE_PREVIEW_BYTES: usize = 500;
const COMMAND_PREVIEW_BYTES: usize = 200;

/// Explicit per-run configuration; nothing below this reads globals.
#[derive(Debug)]
pub struct RunConfig {
    pub workdir: PathBuf,
    pub issue_path: PathBuf,
    pub protocol_path: PathBuf,
    pub model: Option<String>,
    pub mode: ParseMode,
}

/// Execute one run against the working tree.
///
/// The caller owns the conversion to a process exit status; this function
/// owns everything else, including the placeholder fallback for change sets
/// that carry no file operations.
pub fn run(config: &RunConfig, credentials: &Credentials) -> Result<()> {
    let documents = docs::load_documents(&config.workdir, &config.issue_path, &config.protocol_path)?;
    println!("Read {}", config.issue_path.display());
    if documents.protocol.is_some() {
        println!("Read {}", config.protocol_path.display());
    }

    let endpoint = completion::resolve_endpoint(credentials)?;
    let model = completion::resolve_model(config.model.as_deref(), credentials, &endpoint);

    let built = prompt::build(&documents.issue, documents.protocol.as_deref(), config.mode);

    println!("=== Calling API: {model} ===");
    tracing::debug!(endpoint = endpoint.url, model = %model, mode = ?config.mode, "sending completion request");
    let raw = completion::complete(&built, &model, &endpoint, config.mode)?;
    println!("Got API response");

    match config.mode {
        ParseMode::Strict => {
            let report = apply_structured(&raw, &config.workdir)?;
            println!(
                "Implementation complete. Created/modified {} files.",
                report.files_written
            );
        }
        ParseMode::Lenient => {
            apply_freeform(&raw, &config.workdir);
        }
    }
    Ok(())
}

/// Strict path: parse the structured change-set and apply it.
///
/// On parse failure the recovered fragments are surfaced for the operator
/// and the error propagates; nothing touches the working tree.
fn apply_structured(raw: &str, workdir: &Path) -> Result<ApplyReport> {
    let change_set = match parse_change_set(raw) {
        Ok(change_set) => change_set,
        Err(err) => {
            if let RunError::Malformed {
                recovered_fragments,
                ..
            } = &err
            {
                eprintln!("Could not parse response as a change set");
                eprintln!("Response: {}", clip(raw, RESPONSE_PREVIEW_BYTES));
                if !recovered_fragments.is_empty() {
                    eprintln!(
                        "Recovered {} fenced code fragment(s); inspect manually, they are not applied",
                        recovered_fragments.len()
                    );
                }
            }
            return Err(err.into());
        }
    };

    if change_set.is_empty() {
        tracing::warn!("parsed change set has no usable file operations");
    }
    apply::apply(&change_set, workdir)
}

/// Lenient path: preserve the original free-text fallback behavior - show a
/// response preview and execute the command lines the reply contains.
fn apply_freeform(raw: &str, workdir: &Path) -> Vec<CommandResult> {
    println!("=== API Response ===");
    println!("{}", clip(raw, RESPONSE_PREVIEW_BYTES));

    let mut results = Vec::new();
    for command in scan_freeform_commands(raw) {
        let result = run_shell(&command, workdir);
        if !result.stdout.is_empty() {
            println!("Command output: {}", clip(&result.stdout, COMMAND_PREVIEW_BYTES));
        }
        results.push(result);
    }
    results
}

/// Command lines the free-text mode is willing to execute: only `cat ` and
/// `echo ` prefixed lines, anything else in the reply is ignored.
fn scan_freeform_commands(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("cat ") || line.starts_with("echo "))
        .map(str::to_string)
        .collect()
}
