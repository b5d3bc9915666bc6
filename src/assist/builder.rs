//! Suggestion orchestration. The heuristic bundle is always computed first
//! as the baseline; the generator tiers are then tried in a fixed order
//! (injected hook, then the OpenAI client) with the precedence rules kept at
//! this single call site: a hook result always wins, and a provider failure
//! is terminal for the request rather than silently downgrading to the
//! heuristic output.

use crate::assist::config::{AiModel, AssistSettings};
use crate::assist::heuristic;
use crate::assist::paths::AssistPaths;
use crate::assist::provider;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionBundle {
    pub meta_title: String,
    pub meta_description: String,
    pub open_graph_title: String,
    pub open_graph_description: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub keywords: Vec<String>,
    pub model_used: String,
}

impl Default for SuggestionBundle {
    fn default() -> Self {
        Self {
            meta_title: String::new(),
            meta_description: String::new(),
            open_graph_title: String::new(),
            open_graph_description: String::new(),
            twitter_title: String::new(),
            twitter_description: String::new(),
            keywords: Vec::new(),
            model_used: "heuristic".to_string(),
        }
    }
}

/// Everything a generator tier gets to work with for one request.
#[derive(Debug, Clone)]
pub struct GenerationPayload {
    pub post_id: u64,
    pub title: String,
    pub content: String,
    pub raw_blocks: Option<Value>,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Partial bundle returned by an external generator; `None` fields are
/// filled from the heuristic baseline.
#[derive(Debug, Clone, Default)]
pub struct PartialSuggestions {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub open_graph_title: Option<String>,
    pub open_graph_description: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub keywords: Option<Vec<String>>,
}

/// Injectable strategy consulted before any built-in network call. Returning
/// `None` declines and lets the next tier run.
pub trait SuggestionHook {
    fn generate(&self, model: &str, payload: &GenerationPayload) -> Option<PartialSuggestions>;
}

pub struct SuggestionBuilder<'a> {
    hook: Option<&'a dyn SuggestionHook>,
}

impl<'a> SuggestionBuilder<'a> {
    pub fn new() -> Self {
        Self { hook: None }
    }

    pub fn with_hook(hook: &'a dyn SuggestionHook) -> Self {
        Self { hook: Some(hook) }
    }

    pub fn build(
        &self,
        paths: &AssistPaths,
        post_id: u64,
        title: &str,
        content: &str,
        raw_blocks: Option<Value>,
        settings: &AssistSettings,
    ) -> Result<SuggestionBundle> {
        let heuristic_bundle = heuristic::build(paths, post_id, title, content)?;

        let selected = settings.ai_model();
        if selected == AiModel::Heuristic {
            return Ok(heuristic_bundle);
        }

        let payload = GenerationPayload {
            post_id,
            title: title.to_string(),
            content: content.to_string(),
            raw_blocks,
            system_prompt: settings.openai_prompt.clone(),
            user_prompt: settings.openai_user_prompt.clone(),
        };

        if let Some(hook) = self.hook {
            if let Some(partial) = hook.generate(selected.as_str(), &payload) {
                return Ok(merge_partial(heuristic_bundle, partial, selected.as_str()));
            }
        }

        if selected == AiModel::OpenAi {
            let provided =
                provider::suggest(&payload, &settings.openai_api_key, &settings.openai_model)?;
            return Ok(merge_provider(heuristic_bundle, provided));
        }

        // Unrecognized model with no hook result: degrade to the heuristic
        // bundle, annotated with the selected name so the caller can see the
        // misconfiguration.
        let mut bundle = heuristic_bundle;
        bundle.model_used = selected.as_str().to_string();
        Ok(bundle)
    }
}

/// Hook fields win over the heuristic baseline; gaps are filled from it.
fn merge_partial(
    base: SuggestionBundle,
    partial: PartialSuggestions,
    model_used: &str,
) -> SuggestionBundle {
    SuggestionBundle {
        meta_title: partial.meta_title.unwrap_or(base.meta_title),
        meta_description: partial.meta_description.unwrap_or(base.meta_description),
        open_graph_title: partial.open_graph_title.unwrap_or(base.open_graph_title),
        open_graph_description: partial
            .open_graph_description
            .unwrap_or(base.open_graph_description),
        twitter_title: partial.twitter_title.unwrap_or(base.twitter_title),
        twitter_description: partial
            .twitter_description
            .unwrap_or(base.twitter_description),
        keywords: partial.keywords.unwrap_or(base.keywords),
        model_used: model_used.to_string(),
    }
}

/// The provider only produces four fields; the heuristic social titles and
/// keywords survive the merge.
fn merge_provider(
    base: SuggestionBundle,
    provided: provider::ProviderSuggestions,
) -> SuggestionBundle {
    SuggestionBundle {
        meta_title: provided.meta_title,
        meta_description: provided.meta_description,
        open_graph_title: base.open_graph_title,
        open_graph_description: provided.open_graph_description,
        twitter_title: base.twitter_title,
        twitter_description: provided.twitter_description,
        keywords: base.keywords,
        model_used: "openai".to_string(),
    }
}
