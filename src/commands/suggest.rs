use anyhow::Result;
use serde_json::Value;

use crate::assist::endpoints::{self, SuggestRequest, SuggestResponse};
use crate::assist::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct SuggestOptions {
    pub post_id: u64,
    pub title: String,
    pub content: String,
    pub raw_blocks: Option<String>,
}

pub fn run(opts: &SuggestOptions) -> Result<SuggestResponse> {
    let paths = resolve_paths()?;

    let request = SuggestRequest {
        post_id: opts.post_id,
        title: opts.title.clone(),
        content: opts.content.clone(),
        raw_blocks: opts.raw_blocks.clone().map(Value::String),
    };

    endpoints::suggest(&paths, &request)
}
