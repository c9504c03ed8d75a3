//! Remote completion client: credential routing, request assembly, and
//! response envelope handling.
//!
//! Two credential classes are recognized. `OPENROUTER_API_KEY` routes to
//! OpenRouter and wins when both are set (prefer the override);
//! `OPENAI_API_KEY` routes to OpenAI. Each implies a default model, which
//! `--model` or `IFORGE_MODEL` can override.
//!
//! Exactly one blocking request is attempted per run. Retry policy belongs
//! to the enclosing CI system, which re-invokes the whole process.

use crate::error::{CompletionErrorKind, RunError};
use crate::prompt::{ParseMode, Prompt};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Instant;

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-4o";

const REQUEST_TEMPERATURE: f64 = 0.7;
/// Response cap for free-form replies; structured replies are shaped by
/// `response_format` instead.
const FREEFORM_MAX_TOKENS: u32 = 4000;

/// Environment inputs, captured once so the pipeline stages receive explicit
/// configuration instead of reading globals mid-run.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_key: Option<String>,
    pub openrouter_key: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub model_override: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_key: non_empty_env("OPENAI_API_KEY"),
            openrouter_key: non_empty_env("OPENROUTER_API_KEY"),
            referer: non_empty_env("HTTP_REFERER"),
            title: non_empty_env("X_TITLE"),
            model_override: non_empty_env("IFORGE_MODEL"),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// A resolved endpoint: where to send the request and how to authenticate.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: &'static str,
    pub api_key: String,
    pub default_model: &'static str,
    pub extra_headers: Vec<(&'static str, String)>,
}

/// Pick the endpoint implied by the available credentials, failing fast
/// before any network attempt when neither class is present.
pub fn resolve_endpoint(credentials: &Credentials) -> Result<Endpoint, RunError> {
    if let Some(key) = &credentials.openrouter_key {
        let referer = credentials
            .referer
            .clone()
            .unwrap_or_else(|| "https://github.com".to_string());
        let title = credentials
            .title
            .clone()
            .unwrap_or_else(|| "GitHub Actions".to_string());
        return Ok(Endpoint {
            url: OPENROUTER_URL,
            api_key: key.clone(),
            default_model: OPENROUTER_DEFAULT_MODEL,
            extra_headers: vec![("HTTP-Referer", referer), ("X-Title", title)],
        });
    }
    if let Some(key) = &credentials.openai_key {
        return Ok(Endpoint {
            url: OPENAI_URL,
            api_key: key.clone(),
            default_model: OPENAI_DEFAULT_MODEL,
            extra_headers: Vec::new(),
        });
    }
    Err(RunError::MissingCredentials)
}

/// Resolve the model identifier: `--model` flag, then the environment
/// override, then the endpoint default.
pub fn resolve_model(flag: Option<&str>, credentials: &Credentials, endpoint: &Endpoint) -> String {
    if let Some(model) = flag {
        return model.to_string();
    }
    credentials
        .model_override
        .clone()
        .unwrap_or_else(|| endpoint.default_model.to_string())
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(prompt: &'a Prompt, model: &'a str, mode: ParseMode) -> ChatRequest<'a> {
    let (response_format, max_tokens) = match mode {
        ParseMode::Strict => (Some(ResponseFormat { format: "json_object" }), None),
        ParseMode::Lenient => (None, Some(FREEFORM_MAX_TOKENS)),
    };
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
        temperature: REQUEST_TEMPERATURE,
        response_format,
        max_tokens,
    }
}

/// Send the prompt and return the raw content string unmodified.
pub fn complete(
    prompt: &Prompt,
    model: &str,
    endpoint: &Endpoint,
    mode: ParseMode,
) -> Result<String, RunError> {
    let body = build_request(prompt, model, mode);
    let started = Instant::now();

    let mut request = ureq::post(endpoint.url)
        .header("Authorization", format!("Bearer {}", endpoint.api_key))
        .header("Content-Type", "application/json");
    for (name, value) in &endpoint.extra_headers {
        request = request.header(*name, value.as_str());
    }

    let mut response = match request.send_json(&body) {
        Ok(response) => response,
        Err(ureq::Error::StatusCode(code)) => {
            return Err(RunError::Completion {
                kind: classify_status(code),
                message: format!("endpoint returned HTTP {code}"),
            })
        }
        Err(err) => {
            return Err(RunError::Completion {
                kind: CompletionErrorKind::Transport,
                message: err.to_string(),
            })
        }
    };

    let envelope: ChatResponse =
        response
            .body_mut()
            .read_json()
            .map_err(|err| RunError::Completion {
                kind: CompletionErrorKind::Unknown,
                message: format!("decode response body: {err}"),
            })?;

    let content = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RunError::Completion {
            kind: CompletionErrorKind::Unknown,
            message: "response missing choices[0].message.content".to_string(),
        })?;

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        prompt_bytes = prompt.system.len() + prompt.user.len(),
        response_bytes = content.len(),
        "completion received"
    );

    Ok(content)
}

/// Map a non-2xx status to the failure taxonomy.
pub fn classify_status(code: u16) -> CompletionErrorKind {
    match code {
        401 | 403 => CompletionErrorKind::Unauthorized,
        429 => CompletionErrorKind::RateLimited,
        _ => CompletionErrorKind::Unknown,
    }
}
