use anyhow::Result;
use std::env;

use crate::assist::config;
use crate::assist::paths::resolve_paths;
use crate::assist::store;
use crate::commands::CommandReport;

include!(concat!(env!("OUT_DIR"), "/assist_env_allowlist.rs"));

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build={}", env!("BUILD_UUID")));
    report.detail(format!("assist_home={}", paths.assist_home.display()));
    report.detail(format!("posts_dir={}", paths.posts_dir.display()));
    report.detail(format!("attachments_dir={}", paths.attachments_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    match config::get_settings(&paths) {
        Ok(settings) => {
            report.detail(format!("ai_model={}", settings.ai_model));
            report.detail(format!("seo_plugin={}", settings.seo_plugin));
            report.detail(format!(
                "openai_key_configured={}",
                !settings.openai_api_key.is_empty()
            ));
        }
        Err(err) => report.issue(format!("settings unreadable: {err:#}")),
    }

    let set_env: Vec<&str> = GENERATED_ASSIST_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some())
        .collect();
    report.detail(format!("env_overrides=[{}]", set_env.join(",")));

    if !paths.assist_home.exists() {
        report.issue("missing assist home (set SEO_ASSIST_HOME or create ~/.seo-assist)");
    }
    if !paths.posts_dir.exists() {
        report.issue("missing posts dir; no content store to read from");
    }
    if !store::options_path(&paths).exists() {
        report.detail("options store empty; compiled defaults in effect".to_string());
    }

    Ok(report)
}
