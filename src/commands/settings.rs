use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

use crate::assist::config::{self, AssistSettings};
use crate::assist::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct SettingsOptions {
    /// Raw `key=value` pairs; empty means show the effective settings.
    pub set: Vec<String>,
}

const EDITABLE_KEYS: [&str; 3] = ["seo_plugin", "openai_prompt", "openai_user_prompt"];

fn parse_updates(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut updates = BTreeMap::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(anyhow!("invalid setting `{pair}`; use key=value"));
        };
        if !EDITABLE_KEYS.contains(&key) {
            return Err(anyhow!(
                "unknown or read-only setting `{key}`; editable: {}",
                EDITABLE_KEYS.join(", ")
            ));
        }
        updates.insert(key.to_string(), value.to_string());
    }
    Ok(updates)
}

pub fn run(opts: &SettingsOptions) -> Result<AssistSettings> {
    let paths = resolve_paths()?;

    if !opts.set.is_empty() {
        let updates = parse_updates(&opts.set)?;
        let record = config::sanitize_update(&paths, &updates)?;
        config::save_settings(&paths, record)?;
    }

    config::get_settings(&paths)
}

#[cfg(test)]
mod tests {
    use super::parse_updates;

    #[test]
    fn accepts_editable_keys_only() {
        let updates = parse_updates(&["seo_plugin=tsf".to_string()]).expect("parse");
        assert_eq!(updates.get("seo_plugin").map(String::as_str), Some("tsf"));

        assert!(parse_updates(&["openai_api_key=sk-123".to_string()]).is_err());
        assert!(parse_updates(&["seo_plugin".to_string()]).is_err());
    }
}
