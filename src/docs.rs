//! Working-tree document loading for prompt assembly.

use crate::error::RunError;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Default issue document path, relative to the working tree.
pub const ISSUE_DOC_REL: &str = "ISSUE.md";
/// Default protocol/ruleset document path, relative to the working tree.
pub const PROTOCOL_DOC_REL: &str = "AGENT_PROTOCOL.md";

/// The input documents, read once at the start of a run.
#[derive(Debug)]
pub struct SourceDocuments {
    pub issue: String,
    /// Absence is a valid state, not an error; the prompt builder
    /// substitutes a fixed placeholder.
    pub protocol: Option<String>,
}

/// Load both documents. Only the mandatory issue document can fail the run.
pub fn load_documents(workdir: &Path, issue_rel: &Path, protocol_rel: &Path) -> Result<SourceDocuments> {
    let issue_path = workdir.join(issue_rel);
    let issue = load_text_optional(&issue_path)?.ok_or_else(|| RunError::MissingIssueDocument {
        path: issue_path.display().to_string(),
    })?;
    let protocol = load_text_optional(&workdir.join(protocol_rel))?;
    Ok(SourceDocuments { issue, protocol })
}

/// Load a UTF-8 document, distinguishing absence from read failure.
pub fn load_text_optional(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn absent_document_is_none() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let loaded = load_text_optional(&dir.path().join(ISSUE_DOC_REL)).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn present_document_returns_content() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(ISSUE_DOC_REL);
        fs::write(&path, "add logging").expect("write issue");
        let loaded = load_text_optional(&path).expect("load");
        assert_eq!(loaded.as_deref(), Some("add logging"));
    }

    #[test]
    fn missing_issue_document_is_the_only_fatal_absence() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let issue_rel = PathBuf::from(ISSUE_DOC_REL);
        let protocol_rel = PathBuf::from(PROTOCOL_DOC_REL);

        let err = load_documents(dir.path(), &issue_rel, &protocol_rel).expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<RunError>(),
            Some(RunError::MissingIssueDocument { .. })
        ));

        fs::write(dir.path().join(ISSUE_DOC_REL), "fix it").expect("write issue");
        let documents = load_documents(dir.path(), &issue_rel, &protocol_rel).expect("load");
        assert_eq!(documents.issue, "fix it");
        assert!(documents.protocol.is_none());
    }
}
