use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AssistPaths {
    pub assist_home: PathBuf,
    pub posts_dir: PathBuf,
    pub attachments_dir: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<AssistPaths> {
    let home = required_home_dir()?;
    let assist_home = env_or_default_path("SEO_ASSIST_HOME", home.join(".seo-assist"));

    let posts_dir = env_or_default_path("SEO_ASSIST_POSTS_DIR", assist_home.join("posts"));
    let attachments_dir =
        env_or_default_path("SEO_ASSIST_ATTACHMENTS_DIR", assist_home.join("attachments"));
    let logs_dir = env_or_default_path("SEO_ASSIST_LOGS_DIR", assist_home.join("logs"));

    Ok(AssistPaths {
        assist_home,
        posts_dir,
        attachments_dir,
        logs_dir,
    })
}

#[cfg(test)]
pub fn test_paths(root: &std::path::Path) -> AssistPaths {
    AssistPaths {
        assist_home: root.to_path_buf(),
        posts_dir: root.join("posts"),
        attachments_dir: root.join("attachments"),
        logs_dir: root.join("logs"),
    }
}
