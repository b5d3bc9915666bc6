//! Effective settings resolution.
//!
//! Layering, lowest to highest: compiled literal defaults, the optional
//! `assist.toml` deployment config, environment default values, then the
//! persisted options record, except that a field whose environment variable
//! is *defined* (presence, not value) always resolves to its compiled
//! default, ignoring whatever was persisted. Settings are recomputed on every
//! request; nothing here is cached.

use crate::assist::paths::AssistPaths;
use crate::assist::provider;
use crate::assist::store;
use crate::assist::warn;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const OPTION_KEY: &str = "seo_assist_settings";
const LEGACY_OPTION_KEY: &str = "seo_helper_settings";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistSettings {
    pub ai_model: String,
    pub seo_plugin: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_prompt: String,
    pub openai_user_prompt: String,
}

/// Generator selection as a closed tag so the orchestrator's tier dispatch
/// stays a single visible match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiModel {
    Heuristic,
    OpenAi,
    Custom(String),
}

impl AiModel {
    pub fn parse(raw: &str) -> AiModel {
        match raw.trim() {
            "" | "heuristic" => AiModel::Heuristic,
            "openai" => AiModel::OpenAi,
            other => AiModel::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AiModel::Heuristic => "heuristic",
            AiModel::OpenAi => "openai",
            AiModel::Custom(name) => name,
        }
    }
}

impl AssistSettings {
    pub fn ai_model(&self) -> AiModel {
        AiModel::parse(&self.ai_model)
    }
}

#[derive(Debug, Clone)]
pub struct SocialImageConfig {
    pub service_url: String,
    pub target_override: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileOpenAiDefaults {
    api_key: Option<String>,
    model: Option<String>,
    prompt: Option<String>,
    user_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileSocialImageDefaults {
    service_url: Option<String>,
    target_override: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileDefaults {
    ai_model: Option<String>,
    seo_plugin: Option<String>,
    #[serde(default)]
    openai: FileOpenAiDefaults,
    #[serde(default)]
    social_image: FileSocialImageDefaults,
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

/// Presence check, not value check: an override is in force as soon as the
/// variable is defined, even if empty.
fn env_defined(var: &str) -> bool {
    env::var_os(var).is_some()
}

fn resolve_config_path(paths: &AssistPaths) -> PathBuf {
    if let Ok(custom) = env::var("SEO_ASSIST_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    paths.assist_home.join("assist.toml")
}

fn load_file_defaults(paths: &AssistPaths) -> Result<FileDefaults> {
    let path = resolve_config_path(paths);
    if !path.exists() {
        return Ok(FileDefaults::default());
    }

    let raw = fs::read_to_string(&path)?;
    toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse assist config {}: {err}", path.display()))
}

/// Compiled defaults for each field: literal, overlaid by `assist.toml`,
/// overlaid by the environment value when one is set.
pub fn defaults(paths: &AssistPaths) -> Result<AssistSettings> {
    let file = load_file_defaults(paths)?;

    Ok(AssistSettings {
        ai_model: env_or_string(
            "SEO_ASSIST_MODEL",
            file.ai_model.as_deref().unwrap_or("heuristic"),
        ),
        seo_plugin: env_or_string(
            "SEO_ASSIST_PLUGIN",
            file.seo_plugin.as_deref().unwrap_or("tsf"),
        ),
        openai_api_key: env_or_string(
            "SEO_ASSIST_OPENAI_KEY",
            file.openai.api_key.as_deref().unwrap_or(""),
        ),
        openai_model: env_or_string(
            "SEO_ASSIST_OPENAI_MODEL",
            file.openai.model.as_deref().unwrap_or("gpt-4o-mini"),
        ),
        openai_prompt: file
            .openai
            .prompt
            .unwrap_or_else(|| provider::default_prompt().to_string()),
        openai_user_prompt: file
            .openai
            .user_prompt
            .unwrap_or_else(|| provider::default_user_prompt().to_string()),
    })
}

fn stored_record(paths: &AssistPaths) -> Result<serde_json::Map<String, Value>> {
    let primary = store::get_option(paths, OPTION_KEY)?
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();
    if !primary.is_empty() {
        return Ok(primary);
    }

    // Backward compatibility for options saved under the pre-rename key.
    // Read-only: nothing is migrated back into the primary key.
    let legacy = store::get_option(paths, LEGACY_OPTION_KEY)?
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();
    if !legacy.is_empty() {
        warn::emit("legacy_settings", "config", "na", "read_legacy_option_key");
    }
    Ok(legacy)
}

fn stored_str(record: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn get_settings(paths: &AssistPaths) -> Result<AssistSettings> {
    let stored = stored_record(paths)?;
    let defaults = defaults(paths)?;

    let pick = |env_var: &str, key: &str, default: &str| -> String {
        if env_defined(env_var) {
            default.to_string()
        } else {
            stored_str(&stored, key).unwrap_or_else(|| default.to_string())
        }
    };

    Ok(AssistSettings {
        ai_model: pick("SEO_ASSIST_MODEL", "ai_model", &defaults.ai_model),
        seo_plugin: pick("SEO_ASSIST_PLUGIN", "seo_plugin", &defaults.seo_plugin),
        openai_api_key: pick(
            "SEO_ASSIST_OPENAI_KEY",
            "openai_api_key",
            &defaults.openai_api_key,
        ),
        openai_model: pick(
            "SEO_ASSIST_OPENAI_MODEL",
            "openai_model",
            &defaults.openai_model,
        ),
        openai_prompt: stored_str(&stored, "openai_prompt").unwrap_or(defaults.openai_prompt),
        openai_user_prompt: stored_str(&stored, "openai_user_prompt")
            .unwrap_or(defaults.openai_user_prompt),
    })
}

/// Sanitize a settings update the way the host settings form did: only the
/// operator-editable keys persist, `seo_plugin` must name a known
/// integration, and blank prompts revert to the built-in defaults.
pub fn sanitize_update(
    paths: &AssistPaths,
    updates: &std::collections::BTreeMap<String, String>,
) -> Result<serde_json::Map<String, Value>> {
    let defaults = defaults(paths)?;
    let current = stored_record(paths)?;

    let value_for = |key: &str, fallback: &str| -> String {
        updates
            .get(key)
            .cloned()
            .or_else(|| stored_str(&current, key))
            .unwrap_or_else(|| fallback.to_string())
    };

    let seo_plugin = value_for("seo_plugin", &defaults.seo_plugin);
    let seo_plugin = if matches!(seo_plugin.as_str(), "tsf" | "yoast") {
        seo_plugin
    } else {
        defaults.seo_plugin.clone()
    };

    let prompt = value_for("openai_prompt", &defaults.openai_prompt);
    let prompt = if prompt.trim().is_empty() {
        defaults.openai_prompt.clone()
    } else {
        prompt
    };

    let user_prompt = value_for("openai_user_prompt", &defaults.openai_user_prompt);
    let user_prompt = if user_prompt.trim().is_empty() {
        defaults.openai_user_prompt.clone()
    } else {
        user_prompt
    };

    let mut record = serde_json::Map::new();
    record.insert("seo_plugin".to_string(), Value::String(seo_plugin));
    record.insert("openai_prompt".to_string(), Value::String(prompt));
    record.insert("openai_user_prompt".to_string(), Value::String(user_prompt));
    Ok(record)
}

pub fn save_settings(paths: &AssistPaths, record: serde_json::Map<String, Value>) -> Result<()> {
    store::set_option(paths, OPTION_KEY, Value::Object(record))
}

pub fn social_image_config(paths: &AssistPaths) -> Result<SocialImageConfig> {
    let file = load_file_defaults(paths)?;

    Ok(SocialImageConfig {
        service_url: env_or_string(
            "SEO_ASSIST_SOCIAL_SERVICE_URL",
            file.social_image.service_url.as_deref().unwrap_or(""),
        ),
        target_override: env_or_string(
            "SEO_ASSIST_SOCIAL_TARGET",
            file.social_image.target_override.as_deref().unwrap_or(""),
        ),
        timeout_secs: env_or_u64(
            "SEO_ASSIST_SOCIAL_TIMEOUT",
            file.social_image.timeout_secs.unwrap_or(30),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::paths::test_paths;
    use serde_json::json;
    use tempfile::tempdir;

    // This test sets a process-wide variable; the only field it can leak
    // into concurrently is ai_model, which no other test asserts against a
    // persisted value.
    #[test]
    fn env_override_wins_over_persisted_value() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        store::set_option(
            &paths,
            OPTION_KEY,
            json!({"ai_model": "openai", "openai_model": "gpt-4.1"}),
        )
        .expect("seed options");

        unsafe {
            env::set_var("SEO_ASSIST_MODEL", "");
        }
        let settings = get_settings(&paths).expect("settings");
        unsafe {
            env::remove_var("SEO_ASSIST_MODEL");
        }

        // Defined (even empty) env var forces the compiled default.
        assert_eq!(settings.ai_model, "heuristic");
        // Untouched field still reads the persisted value.
        assert_eq!(settings.openai_model, "gpt-4.1");
    }

    #[test]
    fn persisted_settings_override_defaults_without_env() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        store::set_option(&paths, OPTION_KEY, json!({"seo_plugin": "yoast"}))
            .expect("seed options");

        let settings = get_settings(&paths).expect("settings");
        assert_eq!(settings.seo_plugin, "yoast");
        assert_eq!(settings.ai_model, "heuristic");
    }

    #[test]
    fn legacy_option_key_is_read_when_primary_is_empty() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        store::set_option(&paths, LEGACY_OPTION_KEY, json!({"seo_plugin": "yoast"}))
            .expect("seed legacy");

        let settings = get_settings(&paths).expect("settings");
        assert_eq!(settings.seo_plugin, "yoast");

        // Primary record, even with other keys, shadows the legacy one.
        store::set_option(&paths, OPTION_KEY, json!({"openai_model": "gpt-4.1-mini"}))
            .expect("seed primary");
        let settings = get_settings(&paths).expect("settings");
        assert_eq!(settings.seo_plugin, "tsf");
        assert_eq!(settings.openai_model, "gpt-4.1-mini");
    }

    #[test]
    fn config_file_supplies_compiled_defaults() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        fs::create_dir_all(&paths.assist_home).expect("mkdir");
        fs::write(
            paths.assist_home.join("assist.toml"),
            "ai_model = \"openai\"\n\n[openai]\nmodel = \"gpt-4o\"\n\n[social_image]\nservice_url = \"https://cards.example/render\"\ntimeout_secs = 10\n",
        )
        .expect("write config");

        let settings = get_settings(&paths).expect("settings");
        assert_eq!(settings.ai_model, "openai");
        assert_eq!(settings.openai_model, "gpt-4o");

        let social = social_image_config(&paths).expect("social config");
        assert_eq!(social.service_url, "https://cards.example/render");
        assert_eq!(social.timeout_secs, 10);
        assert_eq!(social.target_override, "");
    }

    #[test]
    fn sanitize_update_validates_plugin_and_reverts_blank_prompts() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        let mut updates = std::collections::BTreeMap::new();
        updates.insert("seo_plugin".to_string(), "rankmath".to_string());
        updates.insert("openai_prompt".to_string(), "   ".to_string());
        updates.insert("ai_model".to_string(), "openai".to_string());

        let record = sanitize_update(&paths, &updates).expect("sanitize");
        assert_eq!(record.get("seo_plugin").and_then(Value::as_str), Some("tsf"));
        assert_eq!(
            record.get("openai_prompt").and_then(Value::as_str),
            Some(provider::default_prompt())
        );
        // Only the operator-editable keys survive sanitation.
        assert!(!record.contains_key("ai_model"));
    }

    #[test]
    fn ai_model_tag_parses_known_and_custom_names() {
        assert_eq!(AiModel::parse("heuristic"), AiModel::Heuristic);
        assert_eq!(AiModel::parse(""), AiModel::Heuristic);
        assert_eq!(AiModel::parse("openai"), AiModel::OpenAi);
        assert_eq!(
            AiModel::parse("acme-llm"),
            AiModel::Custom("acme-llm".to_string())
        );
        assert_eq!(AiModel::Custom("acme-llm".to_string()).as_str(), "acme-llm");
    }
}
