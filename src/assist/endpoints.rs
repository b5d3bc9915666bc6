//! Operation layer behind the CLI surface: the suggest, apply, and
//! social-image endpoints, with their shared preconditions. Every endpoint
//! rejects before doing any work unless the post id is valid, the caller may
//! edit the post, and the configured target integration is usable.

use crate::assist::apply::{self, MetaFields};
use crate::assist::audit;
use crate::assist::builder::{SuggestionBuilder, SuggestionBundle};
use crate::assist::config::{self, AssistSettings};
use crate::assist::paths::AssistPaths;
use crate::assist::social_image;
use crate::assist::store;
use crate::error::{AssistError, invalid_post_id};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub post_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub raw_blocks: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: SuggestionBundle,
    pub current_meta: MetaFields,
    pub settings: AssistSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub post_id: u64,
    #[serde(flatten)]
    pub fields: MetaFields,
    #[serde(default)]
    pub apply: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub updated_keys: Vec<String>,
    pub settings: AssistSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialImageRequest {
    pub post_id: u64,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialImageResponse {
    pub success: bool,
    pub attachment_id: u64,
    pub url: String,
}

/// Edit permission on the referenced post, checked before any generation or
/// apply logic runs.
fn ensure_permission(paths: &AssistPaths, post_id: u64) -> Result<()> {
    if post_id == 0 {
        return Err(invalid_post_id().into());
    }
    if !store::can_edit(paths, post_id)? {
        return Err(AssistError::Forbidden {
            message: "You are not allowed to edit this post.".to_string(),
        }
        .into());
    }
    Ok(())
}

fn ensure_target_integration(paths: &AssistPaths, settings: &AssistSettings) -> Result<()> {
    match settings.seo_plugin.as_str() {
        "tsf" => {
            if !store::plugin_active(paths, "tsf")? {
                return Err(AssistError::Configuration {
                    code: "tsf_inactive",
                    message: "The SEO Framework integration must be active.".to_string(),
                }
                .into());
            }
            Ok(())
        }
        _ => Err(AssistError::Configuration {
            code: "seo_plugin_unsupported",
            message: "Selected SEO plugin is not supported yet.".to_string(),
        }
        .into()),
    }
}

pub fn suggest(paths: &AssistPaths, request: &SuggestRequest) -> Result<SuggestResponse> {
    ensure_permission(paths, request.post_id)?;
    let settings = config::get_settings(paths)?;
    ensure_target_integration(paths, &settings)?;

    let suggestions = SuggestionBuilder::new().build(
        paths,
        request.post_id,
        &request.title,
        &request.content,
        request.raw_blocks.clone(),
        &settings,
    )?;

    audit::append_event(
        paths,
        "suggest",
        "ok",
        &format!(
            "post={} model={}",
            request.post_id, suggestions.model_used
        ),
    )?;

    Ok(SuggestResponse {
        current_meta: apply::current_meta(paths, request.post_id)?,
        suggestions,
        settings,
    })
}

pub fn apply(paths: &AssistPaths, request: &ApplyRequest) -> Result<ApplyResponse> {
    ensure_permission(paths, request.post_id)?;
    let settings = config::get_settings(paths)?;
    ensure_target_integration(paths, &settings)?;

    let updated_keys = apply::apply_fields(paths, request.post_id, &request.fields, &request.apply)?;

    audit::append_event(
        paths,
        "apply",
        "ok",
        &format!("post={} updated={}", request.post_id, updated_keys.len()),
    )?;

    Ok(ApplyResponse {
        success: true,
        updated_keys,
        settings,
    })
}

pub fn social_image(paths: &AssistPaths, request: &SocialImageRequest) -> Result<SocialImageResponse> {
    ensure_permission(paths, request.post_id)?;
    let settings = config::get_settings(paths)?;
    ensure_target_integration(paths, &settings)?;

    let cfg = config::social_image_config(paths)?;
    let record = social_image::generate(paths, request.post_id, request.url.as_deref(), &cfg)?;

    audit::append_event(
        paths,
        "social-image",
        "ok",
        &format!("post={} attachment={}", request.post_id, record.id),
    )?;

    Ok(SocialImageResponse {
        success: true,
        attachment_id: record.id,
        url: record.url,
    })
}
