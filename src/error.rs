//! Failure taxonomy for a pipeline run.
//!
//! Every fatal condition a run can hit is named here so the entrypoint can
//! turn it into a diagnostic and an exit status in one place. Nothing below
//! the orchestrator converts errors to process state.

use std::fmt;

/// Classification of a failed completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    /// The endpoint rejected the credential (HTTP 401/403).
    Unauthorized,
    /// The endpoint throttled the request (HTTP 429).
    RateLimited,
    /// The request never produced an HTTP response.
    Transport,
    /// Anything else, including unexpected response envelopes.
    Unknown,
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompletionErrorKind::Unauthorized => "unauthorized",
            CompletionErrorKind::RateLimited => "rate limited",
            CompletionErrorKind::Transport => "transport",
            CompletionErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Fatal pipeline failures. Per-command non-zero exits are not errors; they
/// are recorded in the apply report and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("issue document not found at {path}")]
    MissingIssueDocument { path: String },

    #[error("no API key found (need OPENAI_API_KEY or OPENROUTER_API_KEY)")]
    MissingCredentials,

    #[error("completion request failed ({kind}): {message}")]
    Completion {
        kind: CompletionErrorKind,
        message: String,
    },

    /// The response was not the structured change-set shape. Fenced code
    /// fragments recovered from the text are surfaced for inspection but
    /// never applied.
    #[error("malformed completion response: {message}")]
    Malformed {
        message: String,
        recovered_fragments: Vec<String>,
    },
}
