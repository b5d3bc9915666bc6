//! Authoring-session state machine. Owns the per-post cache of the last
//! suggestion bundle, decides when a fetch goes to the network versus the
//! cache, and mirrors applied values into the host's visible form fields.
//!
//! The machine is single-threaded and cooperative: a fetch or apply in
//! flight disables its trigger (`is_loading` / `is_applying`) rather than
//! being cancellable.

use crate::assist::apply::FIELD_KEYS;
use crate::assist::apply::MetaFields;
use crate::assist::builder::SuggestionBundle;
use crate::assist::endpoints::{ApplyRequest, ApplyResponse, SuggestRequest, SuggestResponse};
use anyhow::Result;
use std::collections::BTreeMap;

/// Outbound calls the session makes. The CLI wires this to the local
/// endpoints; tests substitute a scripted double.
pub trait SuggestTransport {
    fn suggest(&mut self, request: &SuggestRequest) -> Result<SuggestResponse>;
    fn apply(&mut self, request: &ApplyRequest) -> Result<ApplyResponse>;
}

/// The host UI's form fields, as far as this module is concerned: something
/// that accepts a value per field key and handles its own change
/// notifications.
pub trait HostForm {
    fn set_field(&mut self, key: &str, value: &str);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    suggestions: SuggestionBundle,
    current_meta: MetaFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Closed,
    Open,
}

pub struct SuggestSession<T: SuggestTransport> {
    transport: T,
    post_id: u64,
    cache: BTreeMap<u64, CacheEntry>,
    has_fetched: bool,
    pub suggestions: SuggestionBundle,
    pub current_meta: MetaFields,
    pub apply_flags: BTreeMap<String, bool>,
    pub display: Display,
    pub is_loading: bool,
    pub is_applying: bool,
    pub error: String,
    pub notice: String,
}

/// A field's apply toggle defaults to on exactly when the suggested value is
/// non-empty. Computed once per loaded bundle; editable afterwards.
fn default_apply_flags(suggestions: &SuggestionBundle) -> BTreeMap<String, bool> {
    let values = MetaFields {
        meta_title: suggestions.meta_title.clone(),
        meta_description: suggestions.meta_description.clone(),
        open_graph_title: suggestions.open_graph_title.clone(),
        open_graph_description: suggestions.open_graph_description.clone(),
        twitter_title: suggestions.twitter_title.clone(),
        twitter_description: suggestions.twitter_description.clone(),
    };
    FIELD_KEYS
        .iter()
        .map(|key| ((*key).to_string(), !values.get(key).is_empty()))
        .collect()
}

impl<T: SuggestTransport> SuggestSession<T> {
    pub fn new(transport: T, post_id: u64) -> Self {
        Self {
            transport,
            post_id,
            cache: BTreeMap::new(),
            has_fetched: false,
            suggestions: SuggestionBundle::default(),
            current_meta: MetaFields::default(),
            apply_flags: BTreeMap::new(),
            display: Display::Closed,
            is_loading: false,
            is_applying: false,
            error: String::new(),
            notice: String::new(),
        }
    }

    /// Switch the session to another post, reloading display state from the
    /// cache when an entry for it exists.
    pub fn set_post(&mut self, post_id: u64) {
        self.post_id = post_id;
        self.has_fetched = false;
        self.display = Display::Closed;
        if let Some(entry) = self.cache.get(&post_id).cloned() {
            self.load_entry(entry);
        }
    }

    fn load_entry(&mut self, entry: CacheEntry) {
        self.apply_flags = default_apply_flags(&entry.suggestions);
        self.suggestions = entry.suggestions;
        self.current_meta = entry.current_meta;
        self.has_fetched = true;
    }

    pub fn fetch_suggestions(&mut self, force: bool) {
        if self.is_loading {
            return;
        }

        // A successful fetch this session reopens without any new request.
        if self.has_fetched && !force {
            self.error.clear();
            self.notice.clear();
            self.display = Display::Open;
            return;
        }

        if !force {
            if let Some(entry) = self.cache.get(&self.post_id).cloned() {
                self.load_entry(entry);
                self.display = Display::Open;
                return;
            }
        }

        self.error.clear();
        self.notice.clear();
        self.is_loading = true;

        let request = SuggestRequest {
            post_id: self.post_id,
            title: String::new(),
            content: String::new(),
            raw_blocks: None,
        };
        match self.transport.suggest(&request) {
            Ok(response) => {
                self.cache.insert(
                    self.post_id,
                    CacheEntry {
                        suggestions: response.suggestions.clone(),
                        current_meta: response.current_meta.clone(),
                    },
                );
                self.load_entry(CacheEntry {
                    suggestions: response.suggestions,
                    current_meta: response.current_meta,
                });
                self.display = Display::Open;
            }
            Err(err) => {
                self.error = format!("{err:#}");
                self.display = Display::Closed;
            }
        }
        self.is_loading = false;
    }

    /// Evict the cache entry for the current post and fetch fresh.
    pub fn refresh(&mut self) {
        self.cache.remove(&self.post_id);
        self.fetch_suggestions(true);
    }

    fn field_with_meta_fallback(&self, key: &str) -> String {
        let value = self.suggestions_field(key);
        if value.is_empty() {
            match key {
                "open_graph_title" | "twitter_title" => self.suggestions.meta_title.clone(),
                "open_graph_description" | "twitter_description" => {
                    self.suggestions.meta_description.clone()
                }
                _ => value,
            }
        } else {
            value
        }
    }

    fn suggestions_field(&self, key: &str) -> String {
        match key {
            "meta_title" => self.suggestions.meta_title.clone(),
            "meta_description" => self.suggestions.meta_description.clone(),
            "open_graph_title" => self.suggestions.open_graph_title.clone(),
            "open_graph_description" => self.suggestions.open_graph_description.clone(),
            "twitter_title" => self.suggestions.twitter_title.clone(),
            "twitter_description" => self.suggestions.twitter_description.clone(),
            _ => String::new(),
        }
    }

    /// Send the currently-edited bundle with its per-field flags. On success
    /// the applied values are mirrored into the host form and the display
    /// closes; on failure the display stays open showing the error.
    pub fn apply_suggestions(&mut self, form: &mut dyn HostForm) {
        if self.is_applying {
            return;
        }

        self.error.clear();
        self.notice.clear();
        self.is_applying = true;

        let fields = MetaFields {
            meta_title: self.suggestions.meta_title.clone(),
            meta_description: self.suggestions.meta_description.clone(),
            open_graph_title: self.field_with_meta_fallback("open_graph_title"),
            open_graph_description: self.field_with_meta_fallback("open_graph_description"),
            twitter_title: self.field_with_meta_fallback("twitter_title"),
            twitter_description: self.field_with_meta_fallback("twitter_description"),
        };
        let request = ApplyRequest {
            post_id: self.post_id,
            fields: fields.clone(),
            apply: self.apply_flags.clone(),
        };

        match self.transport.apply(&request) {
            Ok(response) => {
                for key in FIELD_KEYS {
                    let should_apply = self.apply_flags.get(key).copied().unwrap_or(true);
                    if should_apply {
                        form.set_field(key, fields.get(key));
                    }
                }
                self.notice = if response.success {
                    "SEO fields updated.".to_string()
                } else {
                    "No changes were applied.".to_string()
                };
                self.display = Display::Closed;
            }
            Err(err) => {
                self.error = format!("{err:#}");
            }
        }
        self.is_applying = false;
    }

    pub fn close(&mut self) {
        self.display = Display::Closed;
    }
}
