use anyhow::Result;

use crate::assist::endpoints::{self, SocialImageRequest, SocialImageResponse};
use crate::assist::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct SocialImageOptions {
    pub post_id: u64,
    pub url: Option<String>,
}

pub fn run(opts: &SocialImageOptions) -> Result<SocialImageResponse> {
    let paths = resolve_paths()?;

    endpoints::social_image(
        &paths,
        &SocialImageRequest {
            post_id: opts.post_id,
            url: opts.url.clone(),
        },
    )
}
