//! CLI argument parsing for the issue-implementation pipeline.
//!
//! The CLI is intentionally thin: it resolves paths and flags, then hands a
//! single explicit config to the pipeline without embedding policy.
use crate::docs;
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "iforge",
    version,
    about = "Implement an issue by applying a completion endpoint's change set to the working tree",
    after_help = "Credentials:\n  OPENAI_API_KEY      use the OpenAI endpoint (default model gpt-4o)\n  OPENROUTER_API_KEY  use the OpenRouter endpoint (default model openai/gpt-4o);\n                      wins when both keys are set\n  IFORGE_MODEL        override the default model\n\nExamples:\n  iforge --workdir .\n  iforge --workdir /srv/checkout --model gpt-4o-mini\n  iforge --lenient"
)]
pub struct RootArgs {
    /// Working tree the change set is applied to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Issue document, relative to the working tree
    #[arg(long, value_name = "PATH", default_value = docs::ISSUE_DOC_REL)]
    pub issue: PathBuf,

    /// Protocol/ruleset document, relative to the working tree (optional on disk)
    #[arg(long, value_name = "PATH", default_value = docs::PROTOCOL_DOC_REL)]
    pub protocol: PathBuf,

    /// Model identifier (overrides IFORGE_MODEL and the endpoint default)
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Free-text fallback mode: skip structured parsing and scan the
    /// response for commands instead
    #[arg(long)]
    pub lenient: bool,
}
