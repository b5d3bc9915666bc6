use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

use crate::assist::apply::{FIELD_KEYS, MetaFields};
use crate::assist::endpoints::{self, ApplyRequest, ApplyResponse};
use crate::assist::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub post_id: u64,
    pub meta_title: String,
    pub meta_description: String,
    pub open_graph_title: String,
    pub open_graph_description: String,
    pub twitter_title: String,
    pub twitter_description: String,
    /// Raw `field=bool` pairs from the command line. Absent fields apply.
    pub apply: Vec<String>,
}

fn parse_apply_flags(raw: &[String]) -> Result<BTreeMap<String, bool>> {
    let mut flags = BTreeMap::new();
    for pair in raw {
        let Some((field, value)) = pair.split_once('=') else {
            return Err(anyhow!("invalid apply flag `{pair}`; use field=true|false"));
        };
        if !FIELD_KEYS.contains(&field) {
            return Err(anyhow!("unknown apply field `{field}`"));
        }
        let value = match value.trim() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => return Err(anyhow!("invalid apply value `{other}`; use true or false")),
        };
        flags.insert(field.to_string(), value);
    }
    Ok(flags)
}

pub fn run(opts: &ApplyOptions) -> Result<ApplyResponse> {
    let paths = resolve_paths()?;

    let request = ApplyRequest {
        post_id: opts.post_id,
        fields: MetaFields {
            meta_title: opts.meta_title.clone(),
            meta_description: opts.meta_description.clone(),
            open_graph_title: opts.open_graph_title.clone(),
            open_graph_description: opts.open_graph_description.clone(),
            twitter_title: opts.twitter_title.clone(),
            twitter_description: opts.twitter_description.clone(),
        },
        apply: parse_apply_flags(&opts.apply)?,
    };

    endpoints::apply(&paths, &request)
}
