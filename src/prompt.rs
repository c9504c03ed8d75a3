//! Prompt assembly for the completion request.
//!
//! Building is a pure function of the loaded documents and the parse mode.
//! When the protocol document is absent a fixed placeholder is substituted
//! instead of dropping the section, so the prompt keeps the same shape
//! either way - the model's output format depends on a stable structure.

/// How the response will be interpreted. Strict demands the JSON change-set
/// shape; lenient leaves the model free-form and scans the reply for
/// commands afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Lenient,
}

/// The exact request payload for one completion call. Built once, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

// Prompt templates loaded at compile time
const IMPLEMENT_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/implement_system.md"
));
const IMPLEMENT_USER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/implement_user.md"
));
const FREEFORM_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/freeform_system.md"
));
const FREEFORM_USER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/freeform_user.md"
));

/// Placeholder for an absent protocol document in strict mode.
const STRICT_PROTOCOL_PLACEHOLDER: &str = "Follow best practices";
/// Placeholder for an absent protocol document in lenient mode.
const LENIENT_PROTOCOL_PLACEHOLDER: &str = "Not found";

/// Compose the system and user instructions from the loaded documents.
pub fn build(issue: &str, protocol: Option<&str>, mode: ParseMode) -> Prompt {
    let (system, user_template, placeholder) = match mode {
        ParseMode::Strict => (IMPLEMENT_SYSTEM, IMPLEMENT_USER, STRICT_PROTOCOL_PLACEHOLDER),
        ParseMode::Lenient => (FREEFORM_SYSTEM, FREEFORM_USER, LENIENT_PROTOCOL_PLACEHOLDER),
    };
    let user = user_template
        .replace("{issue_content}", issue)
        .replace("{protocol_content}", protocol.unwrap_or(placeholder));
    Prompt {
        system: system.trim_end().to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_prompt_embeds_both_documents() {
        let prompt = build("fix the bug", Some("no force pushes"), ParseMode::Strict);
        assert!(prompt.user.contains("fix the bug"));
        assert!(prompt.user.contains("no force pushes"));
        assert!(prompt.system.contains("\"files\""));
    }

    #[test]
    fn strict_prompt_substitutes_placeholder_for_absent_protocol() {
        let prompt = build("fix the bug", None, ParseMode::Strict);
        assert!(prompt.user.contains("Follow best practices"));
        // The section itself is still present.
        assert!(prompt.user.contains("AGENT_PROTOCOL.md"));
    }

    #[test]
    fn lenient_prompt_substitutes_its_own_placeholder() {
        let prompt = build("fix the bug", None, ParseMode::Lenient);
        assert!(prompt.user.contains("Not found"));
        assert!(!prompt.system.contains("JSON"));
    }

    #[test]
    fn building_is_deterministic() {
        let first = build("issue", Some("rules"), ParseMode::Strict);
        let second = build("issue", Some("rules"), ParseMode::Strict);
        assert_eq!(first, second);
    }
}
