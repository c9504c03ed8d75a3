//! Change-set construction from raw completion text.
//!
//! The model's reply is not a trusted contract: the change-set and its file
//! operations are validated value objects built only through
//! [`parse_change_set`], which defaults missing fields and drops unusable
//! entries rather than deserializing blindly.
//!
//! When the structured interpretation fails outright, a best-effort pass
//! recovers fenced code fragments from the text. Fragments are surfaced for
//! operator inspection only; they are never applied to the working tree.

use crate::error::RunError;
use serde_json::Value;

/// What to do at a file op's target path. Anything unrecognized parses as
/// `Modify`; the distinction only affects the execution-plan record since
/// application always overwrites whole files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Create,
    Modify,
}

impl FileAction {
    pub fn as_str(self) -> &'static str {
        match self {
            FileAction::Create => "create",
            FileAction::Modify => "modify",
        }
    }
}

/// One validated file operation. `path` is non-empty and relative to the
/// working tree; `content` is non-empty (an empty-content op would blank an
/// existing file, so the parser drops it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOp {
    pub path: String,
    pub content: String,
    pub action: FileAction,
}

/// The structured answer derived from the model's reply. Application order
/// is the list order; later ops on the same path win.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub plan: String,
    pub file_ops: Vec<FileOp>,
    pub commands: Vec<String>,
}

impl ChangeSet {
    /// Zero usable file ops after filtering: the degraded state compensated
    /// by the applier's placeholder file.
    pub fn is_empty(&self) -> bool {
        self.file_ops.is_empty()
    }
}

/// Interpret raw completion text as a change-set.
///
/// Missing optional fields default to empty, never to an error. Structural
/// failure (non-JSON text, or a non-object at the top level) yields
/// [`RunError::Malformed`] carrying any recovered code fragments.
pub fn parse_change_set(raw: &str) -> Result<ChangeSet, RunError> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => return Err(malformed(err.to_string(), raw)),
    };
    let Some(object) = value.as_object() else {
        return Err(malformed("top-level JSON is not an object".to_string(), raw));
    };

    let plan = object
        .get("plan")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut file_ops = Vec::new();
    for entry in object.get("files").and_then(Value::as_array).into_iter().flatten() {
        let path = entry.get("path").and_then(Value::as_str).unwrap_or_default();
        let content = entry
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if path.is_empty() {
            tracing::debug!("skipped file op with empty path");
            continue;
        }
        if content.is_empty() {
            tracing::debug!(path, "skipped file op with empty content");
            continue;
        }
        let action = match entry.get("action").and_then(Value::as_str) {
            Some("create") => FileAction::Create,
            _ => FileAction::Modify,
        };
        file_ops.push(FileOp {
            path: path.to_string(),
            content: content.to_string(),
            action,
        });
    }

    let commands: Vec<String> = object
        .get("commands")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|command| !command.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ChangeSet {
        plan,
        file_ops,
        commands,
    })
}

fn malformed(message: String, raw: &str) -> RunError {
    RunError::Malformed {
        message,
        recovered_fragments: extract_code_fragments(raw),
    }
}

/// Recover fenced code blocks (with an optional language tag) from text the
/// model was supposed to return as JSON.
pub fn extract_code_fragments(text: &str) -> Vec<String> {
    let pattern = regex::Regex::new(r"(?s)```(?:\w+)?\n(.*?)```").expect("valid fragment pattern");
    pattern
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_change_set_in_order() {
        let raw = r#"{
            "plan": "add logging",
            "files": [
                {"path": "a.txt", "content": "hello", "action": "create"},
                {"path": "b.txt", "content": "world", "action": "modify"}
            ],
            "commands": ["echo done", "ls"]
        }"#;
        let change_set = parse_change_set(raw).expect("parse");
        assert_eq!(change_set.plan, "add logging");
        assert_eq!(change_set.file_ops.len(), 2);
        assert_eq!(change_set.file_ops[0].path, "a.txt");
        assert_eq!(change_set.file_ops[0].action, FileAction::Create);
        assert_eq!(change_set.file_ops[1].action, FileAction::Modify);
        assert_eq!(change_set.commands, vec!["echo done", "ls"]);
    }

    #[test]
    fn missing_fields_default_instead_of_erroring() {
        let change_set = parse_change_set("{}").expect("parse");
        assert!(change_set.plan.is_empty());
        assert!(change_set.file_ops.is_empty());
        assert!(change_set.commands.is_empty());
        assert!(change_set.is_empty());
    }

    #[test]
    fn empty_path_and_empty_content_ops_are_dropped() {
        let raw = r#"{
            "files": [
                {"path": "", "content": "orphan"},
                {"path": "keep.txt", "content": ""},
                {"path": "keep.txt", "content": "kept"}
            ]
        }"#;
        let change_set = parse_change_set(raw).expect("parse");
        assert_eq!(change_set.file_ops.len(), 1);
        assert_eq!(change_set.file_ops[0].content, "kept");
    }

    #[test]
    fn unknown_action_defaults_to_modify() {
        let raw = r#"{"files": [{"path": "a", "content": "x", "action": "delete"}]}"#;
        let change_set = parse_change_set(raw).expect("parse");
        assert_eq!(change_set.file_ops[0].action, FileAction::Modify);
    }

    #[test]
    fn empty_command_strings_are_skipped() {
        let raw = r#"{"commands": ["", "echo ok", ""]}"#;
        let change_set = parse_change_set(raw).expect("parse");
        assert_eq!(change_set.commands, vec!["echo ok"]);
    }

    #[test]
    fn non_json_text_surfaces_recovered_fragments() {
        let raw = "Here is the code:\n```rust\nfn main() {}\n```\nand a note.";
        let err = parse_change_set(raw).expect_err("must fail");
        match err {
            RunError::Malformed {
                recovered_fragments,
                ..
            } => {
                assert_eq!(recovered_fragments, vec!["fn main() {}\n".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn top_level_non_object_is_malformed() {
        let err = parse_change_set("\"just a string\"").expect_err("must fail");
        assert!(matches!(err, RunError::Malformed { .. }));
    }

    #[test]
    fn fragment_extraction_handles_multiple_blocks() {
        let text = "```python\nprint(1)\n```\nprose\n```\nplain\n```";
        let fragments = extract_code_fragments(text);
        assert_eq!(fragments, vec!["print(1)\n".to_string(), "plain\n".to_string()]);
    }
}
