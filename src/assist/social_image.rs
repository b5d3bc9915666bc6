//! Social card generation. The actual rendering happens in an external
//! service; this module resolves the screenshot target, makes one bounded
//! HTTP call, and files the returned image in the host's attachment store.

use crate::assist::config::SocialImageConfig;
use crate::assist::paths::AssistPaths;
use crate::assist::store::{self, AttachmentRecord, PostRecord};
use crate::assist::warn;
use crate::error::{AssistError, Service};
use anyhow::{Context, Result};
use chrono::Local;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::time::Duration;

/// Target URL precedence: explicit request parameter, then the configured
/// override, then the post's stored permalink.
pub(crate) fn resolve_target(
    url_override: Option<&str>,
    cfg: &SocialImageConfig,
    post: &PostRecord,
) -> Result<String, AssistError> {
    if let Some(url) = url_override {
        if !url.trim().is_empty() {
            return Ok(url.trim().to_string());
        }
    }
    if !cfg.target_override.trim().is_empty() {
        return Ok(cfg.target_override.trim().to_string());
    }
    if let Some(permalink) = &post.permalink {
        if !permalink.trim().is_empty() {
            return Ok(permalink.trim().to_string());
        }
    }
    Err(AssistError::Validation {
        code: "missing_target_url",
        message: "No target URL available for social image rendering.".to_string(),
    })
}

fn fetch_image(cfg: &SocialImageConfig, target: &str) -> Result<Vec<u8>, AssistError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .map_err(|source| AssistError::Transport {
            service: Service::SocialImage,
            source,
        })?;
    let response = client
        .post(&cfg.service_url)
        .json(&serde_json::json!({"url": target}))
        .send()
        .map_err(|source| AssistError::Transport {
            service: Service::SocialImage,
            source,
        })?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let body = response.text().unwrap_or_default();
        return Err(AssistError::UpstreamHttp {
            service: Service::SocialImage,
            status,
            body,
        });
    }

    let bytes = response
        .bytes()
        .map_err(|source| AssistError::Transport {
            service: Service::SocialImage,
            source,
        })?
        .to_vec();
    if bytes.is_empty() {
        return Err(AssistError::EmptyResponse {
            service: Service::SocialImage,
        });
    }
    Ok(bytes)
}

pub(crate) fn attachment_file_name(post_id: u64, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let hash: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    let date = Local::now().format("%Y-%m-%d");
    format!("{date}-post{post_id}-{hash}.png")
}

pub fn generate(
    paths: &AssistPaths,
    post_id: u64,
    url_override: Option<&str>,
    cfg: &SocialImageConfig,
) -> Result<AttachmentRecord> {
    if cfg.service_url.trim().is_empty() {
        return Err(AssistError::Configuration {
            code: "social_service_unconfigured",
            message: "No social image rendering service is configured.".to_string(),
        }
        .into());
    }

    let post = store::load_post(paths, post_id)?
        .with_context(|| format!("post {post_id} does not exist in the content store"))?;
    let target = resolve_target(url_override, cfg, &post)?;
    let bytes = fetch_image(cfg, &target)?;

    fs::create_dir_all(&paths.attachments_dir)
        .with_context(|| format!("failed to create {}", paths.attachments_dir.display()))?;
    let file_name = attachment_file_name(post_id, &bytes);
    let file_path = paths.attachments_dir.join(&file_name);

    let mut tmp = tempfile::NamedTempFile::new_in(&paths.attachments_dir)
        .context("failed to create attachment temp file")?;
    tmp.write_all(&bytes)
        .context("failed to write attachment bytes")?;
    tmp.persist(&file_path)
        .with_context(|| format!("failed to persist {}", file_path.display()))?;

    let url = format!("file://{}", file_path.display());
    let record = store::register_attachment(paths, post_id, &file_name, &url)?;

    // The stored pointer is advisory; the attachment itself already exists,
    // so a failed meta write degrades to a warning.
    if let Err(err) = store::update_post_meta(
        paths,
        post_id,
        "_social_image_attachment_id",
        &record.id.to_string(),
    ) {
        warn::emit(
            "attachment_meta",
            "social-image",
            &post_id.to_string(),
            &format!("{err:#}"),
        );
    }

    Ok(record)
}
