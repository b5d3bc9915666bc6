//! OpenAI-compatible chat-completions client. One blocking call per
//! generation request, bounded by a fixed timeout; every failure mode maps to
//! a typed [`AssistError`] so the endpoint layer can surface it structurally.

use crate::assist::builder::GenerationPayload;
use crate::error::{AssistError, Service};
use reqwest::blocking::Client;
use serde_json::Value;
use std::env;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const TEMPERATURE: f64 = 0.4;
const MAX_TOKENS: u64 = 250;

pub fn default_prompt() -> &'static str {
    "\
You are an expert SEO strategist for enterprise content platforms.
Your task is to generate metadata optimized for search visibility and click-through rate using pixel-based SERP heuristics rather than fixed character limits.

Rules:
* Meta descriptions must fit within typical Google SERP pixel widths.
* Target maximum pixel widths:
  * Meta description: ~920px (desktop), ~680px (mobile).
* Prefer shorter descriptions if uncertain.
* Keep meta_title consistent with the provided page title. Minor refinements are allowed; meaning must remain unchanged.
* Focus on clarity, intent matching, and concrete value.
* Avoid keyword stuffing and marketing fluff.
* Do not invent features or capabilities not present in the content.
* Do not use markdown.
* Return only valid JSON.

Heuristic guidance for length (approximate):
* Meta description: typically 140-155 characters, but prioritize pixel fit over character count.
* Twitter description: typically 120-130 characters.
* Open Graph description: may be slightly longer, but should still avoid truncation."
}

pub fn default_user_prompt() -> &'static str {
    "\
Input is a JSON object containing:
* title: the current page title.
* raw_content: structured block JSON content of the page.

Task:
1. Generate:
   * meta_title
   * meta_description
   * open_graph_description
   * twitter_description
2. Use the page title as the base for meta_title.
3. Base all descriptions strictly on the real content intent and value.
4. Write for enterprise B2B decision-makers (CMO, Head of Web, CTO).
5. Ensure descriptions would not be truncated in standard Google SERP previews on desktop or mobile.

Data:
title: {{title}}
raw_content: {{raw_content}}

Return a strictly valid JSON object with exactly these keys:
meta_title
meta_description
open_graph_description
twitter_description"
}

/// The four fields the provider is asked for. Titles for the social cards
/// and keywords are never produced here; the orchestrator backfills them
/// from the heuristic bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSuggestions {
    pub meta_title: String,
    pub meta_description: String,
    pub open_graph_description: String,
    pub twitter_description: String,
}

fn base_url() -> String {
    match env::var("SEO_ASSIST_OPENAI_BASE_URL") {
        Ok(v) if !v.trim().is_empty() => v.trim().trim_end_matches('/').to_string(),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

/// Substitute `{{title}}` and `{{raw_content}}` in the user prompt template.
/// The block-structure payload wins over plain content; a non-string value is
/// serialized to JSON text.
pub(crate) fn render_user_message(payload: &GenerationPayload) -> String {
    let raw_content = match &payload.raw_blocks {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => payload.content.clone(),
    };

    payload
        .user_prompt
        .replace("{{title}}", &payload.title)
        .replace("{{raw_content}}", &raw_content)
}

pub(crate) fn parse_chat_reply(
    status: u16,
    body: &str,
    fallback_title: &str,
) -> Result<ProviderSuggestions, AssistError> {
    if !(200..300).contains(&status) {
        return Err(AssistError::UpstreamHttp {
            service: Service::OpenAi,
            status,
            body: body.to_string(),
        });
    }

    let data: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = data
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("");

    if message.is_empty() {
        return Err(AssistError::EmptyResponse {
            service: Service::OpenAi,
        });
    }

    let decoded: Value = serde_json::from_str(message).unwrap_or(Value::Null);
    let Some(fields) = decoded.as_object() else {
        return Err(AssistError::ParseError);
    };

    let field = |key: &str| -> String {
        fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let meta_title = match fields.get("meta_title").and_then(Value::as_str) {
        Some(title) => title.to_string(),
        None => fallback_title.to_string(),
    };

    Ok(ProviderSuggestions {
        meta_title,
        meta_description: field("meta_description"),
        open_graph_description: field("open_graph_description"),
        twitter_description: field("twitter_description"),
    })
}

pub fn suggest(
    payload: &GenerationPayload,
    api_key: &str,
    model: &str,
) -> Result<ProviderSuggestions, AssistError> {
    if api_key.is_empty() {
        return Err(AssistError::MissingCredential);
    }

    let user_message = render_user_message(payload);
    let request_body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": payload.system_prompt},
            {"role": "user", "content": user_message},
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "response_format": {"type": "json_object"},
    });

    let client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|source| AssistError::Transport {
            service: Service::OpenAi,
            source,
        })?;
    let response = client
        .post(format!("{}/v1/chat/completions", base_url()))
        .bearer_auth(api_key)
        .json(&request_body)
        .send()
        .map_err(|source| AssistError::Transport {
            service: Service::OpenAi,
            source,
        })?;

    let status = response.status().as_u16();
    let body = response.text().map_err(|source| AssistError::Transport {
        service: Service::OpenAi,
        source,
    })?;

    parse_chat_reply(status, &body, &payload.title)
}
