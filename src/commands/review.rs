//! Interactive-surface driver: runs the authoring session state machine
//! against the local endpoints, the way the host editor sidebar would.

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::assist::apply::FIELD_KEYS;
use crate::assist::builder::SuggestionBundle;
use crate::assist::endpoints::{self, ApplyRequest, ApplyResponse, SuggestRequest, SuggestResponse};
use crate::assist::paths::{AssistPaths, resolve_paths};
use crate::assist::session::{Display, HostForm, SuggestSession, SuggestTransport};

#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    pub post_id: u64,
    pub refresh: bool,
    pub apply: bool,
    pub skip: Vec<String>,
}

struct LocalTransport {
    paths: AssistPaths,
}

impl SuggestTransport for LocalTransport {
    fn suggest(&mut self, request: &SuggestRequest) -> Result<SuggestResponse> {
        endpoints::suggest(&self.paths, request)
    }

    fn apply(&mut self, request: &ApplyRequest) -> Result<ApplyResponse> {
        endpoints::apply(&self.paths, request)
    }
}

#[derive(Default)]
struct MirroredFields {
    set: Vec<(String, String)>,
}

impl HostForm for MirroredFields {
    fn set_field(&mut self, key: &str, value: &str) {
        self.set.push((key.to_string(), value.to_string()));
    }
}

#[derive(Serialize)]
pub struct ReviewReport {
    pub suggestions: SuggestionBundle,
    pub apply_flags: std::collections::BTreeMap<String, bool>,
    pub mirrored: Vec<(String, String)>,
    pub notice: String,
}

pub fn run(opts: &ReviewOptions) -> Result<ReviewReport> {
    for field in &opts.skip {
        if !FIELD_KEYS.contains(&field.as_str()) {
            return Err(anyhow!("unknown field `{field}` in --skip"));
        }
    }

    let paths = resolve_paths()?;
    let mut session = SuggestSession::new(LocalTransport { paths }, opts.post_id);

    if opts.refresh {
        session.refresh();
    } else {
        session.fetch_suggestions(false);
    }
    if !session.error.is_empty() {
        return Err(anyhow!("{}", session.error));
    }

    let mut form = MirroredFields::default();
    if opts.apply {
        for field in &opts.skip {
            session.apply_flags.insert(field.clone(), false);
        }
        session.apply_suggestions(&mut form);
        if !session.error.is_empty() {
            return Err(anyhow!("{}", session.error));
        }
    } else if session.display == Display::Open {
        session.close();
    }

    Ok(ReviewReport {
        suggestions: session.suggestions.clone(),
        apply_flags: session.apply_flags.clone(),
        mirrored: form.set,
        notice: session.notice.clone(),
    })
}
