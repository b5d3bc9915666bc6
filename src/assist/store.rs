//! File-backed stand-in for the host platform's persistent stores: the
//! key-value options store, per-post records with their metadata map, and the
//! attachment registry the social image generator writes into.

use crate::assist::paths::AssistPaths;
use crate::assist::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: u64,
    pub post_id: u64,
    pub file: String,
    pub url: String,
    pub created_at_epoch_secs: u64,
}

pub fn options_path(paths: &AssistPaths) -> PathBuf {
    paths.assist_home.join("options.json")
}

pub fn post_path(paths: &AssistPaths, post_id: u64) -> PathBuf {
    paths.posts_dir.join(format!("{post_id}.json"))
}

pub fn attachments_path(paths: &AssistPaths) -> PathBuf {
    paths.assist_home.join("attachments.json")
}

pub fn load_options(paths: &AssistPaths) -> Result<BTreeMap<String, Value>> {
    let path = options_path(paths);
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let raw =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

fn save_options(paths: &AssistPaths, options: &BTreeMap<String, Value>) -> Result<()> {
    let path = options_path(paths);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(options)?;
    fs::write(&path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn get_option(paths: &AssistPaths, key: &str) -> Result<Option<Value>> {
    let options = load_options(paths)?;
    Ok(options.get(key).cloned())
}

pub fn set_option(paths: &AssistPaths, key: &str, value: Value) -> Result<()> {
    let mut options = load_options(paths)?;
    options.insert(key.to_string(), value);
    save_options(paths, &options)
}

/// Whether a host integration is active. A host that never wrote the
/// `active_plugins` key is assumed to ship the default stack; an explicit
/// list without the slug fails closed.
pub fn plugin_active(paths: &AssistPaths, slug: &str) -> Result<bool> {
    let Some(value) = get_option(paths, "active_plugins")? else {
        return Ok(true);
    };
    let Some(list) = value.as_array() else {
        return Ok(false);
    };
    Ok(list.iter().any(|v| v.as_str() == Some(slug)))
}

pub fn load_post(paths: &AssistPaths, post_id: u64) -> Result<Option<PostRecord>> {
    let path = post_path(paths, post_id);
    if !path.exists() {
        return Ok(None);
    }

    let raw =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: PostRecord = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(parsed))
}

pub fn save_post(paths: &AssistPaths, post_id: u64, post: &PostRecord) -> Result<PathBuf> {
    let path = post_path(paths, post_id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(post)?;
    fs::write(&path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn can_edit(paths: &AssistPaths, post_id: u64) -> Result<bool> {
    Ok(load_post(paths, post_id)?.is_some_and(|post| post.editable))
}

pub fn get_post_meta(paths: &AssistPaths, post_id: u64, key: &str) -> Result<String> {
    let Some(post) = load_post(paths, post_id)? else {
        return Ok(String::new());
    };
    Ok(post.meta.get(key).cloned().unwrap_or_default())
}

pub fn update_post_meta(paths: &AssistPaths, post_id: u64, key: &str, value: &str) -> Result<()> {
    let mut post = load_post(paths, post_id)?
        .with_context(|| format!("post {post_id} does not exist in the content store"))?;
    post.meta.insert(key.to_string(), value.to_string());
    save_post(paths, post_id, &post)?;
    Ok(())
}

/// Idempotent: deleting a key that is already absent is a no-op.
pub fn delete_post_meta(paths: &AssistPaths, post_id: u64, key: &str) -> Result<()> {
    let Some(mut post) = load_post(paths, post_id)? else {
        return Ok(());
    };
    if post.meta.remove(key).is_some() {
        save_post(paths, post_id, &post)?;
    }
    Ok(())
}

pub fn load_attachments(paths: &AssistPaths) -> Result<BTreeMap<u64, AttachmentRecord>> {
    let path = attachments_path(paths);
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let raw =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

fn save_attachments(paths: &AssistPaths, map: &BTreeMap<u64, AttachmentRecord>) -> Result<()> {
    let path = attachments_path(paths);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(map)?;
    fs::write(&path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn register_attachment(
    paths: &AssistPaths,
    post_id: u64,
    file: &str,
    url: &str,
) -> Result<AttachmentRecord> {
    let mut map = load_attachments(paths)?;
    let next_id = map.keys().next_back().copied().unwrap_or(0) + 1;
    let record = AttachmentRecord {
        id: next_id,
        post_id,
        file: file.to_string(),
        url: url.to_string(),
        created_at_epoch_secs: now_epoch_secs()?,
    };
    map.insert(next_id, record.clone());

    save_attachments(paths, &map)?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::paths::test_paths;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn post_meta_roundtrip_and_idempotent_delete() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        save_post(
            &paths,
            7,
            &PostRecord {
                title: "Home".to_string(),
                content: "Welcome.".to_string(),
                permalink: None,
                editable: true,
                meta: BTreeMap::new(),
            },
        )
        .expect("save post");

        update_post_meta(&paths, 7, "_genesis_title", "Home | widgets").expect("update");
        assert_eq!(
            get_post_meta(&paths, 7, "_genesis_title").expect("get"),
            "Home | widgets"
        );

        delete_post_meta(&paths, 7, "_genesis_title").expect("delete");
        delete_post_meta(&paths, 7, "_genesis_title").expect("delete again");
        assert_eq!(get_post_meta(&paths, 7, "_genesis_title").expect("get"), "");
    }

    #[test]
    fn plugin_active_defaults_open_and_respects_explicit_list() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        assert!(plugin_active(&paths, "tsf").expect("absent key"));

        set_option(&paths, "active_plugins", json!(["yoast"])).expect("set");
        assert!(!plugin_active(&paths, "tsf").expect("explicit list"));

        set_option(&paths, "active_plugins", json!(["yoast", "tsf"])).expect("set");
        assert!(plugin_active(&paths, "tsf").expect("listed"));
    }

    #[test]
    fn attachment_ids_increment() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        let a = register_attachment(&paths, 1, "a.png", "file:///a.png").expect("a");
        let b = register_attachment(&paths, 1, "b.png", "file:///b.png").expect("b");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }
}
