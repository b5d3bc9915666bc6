//! Selective apply: writes operator-approved suggestion fields into the host
//! metadata store, one independent write per field key. An empty trimmed
//! value deletes the stored entry instead of writing a blank.

use crate::assist::paths::AssistPaths;
use crate::assist::store;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Single-line value: markup stripped, inner whitespace collapsed.
    Text,
    /// Multi-line value: markup stripped, line breaks preserved.
    Textarea,
}

/// Suggestion field names paired with their target metadata keys, in write
/// order. The `_genesis_*` keys are the target integration's native storage
/// schema; this module does not own it.
const META_FIELDS: [(&str, &str, FieldKind); 6] = [
    ("meta_title", "_genesis_title", FieldKind::Text),
    ("meta_description", "_genesis_description", FieldKind::Textarea),
    ("open_graph_title", "_open_graph_title", FieldKind::Text),
    (
        "open_graph_description",
        "_open_graph_description",
        FieldKind::Textarea,
    ),
    ("twitter_title", "_twitter_title", FieldKind::Text),
    (
        "twitter_description",
        "_twitter_description",
        FieldKind::Textarea,
    ),
];

pub const FIELD_KEYS: [&str; 6] = [
    "meta_title",
    "meta_description",
    "open_graph_title",
    "open_graph_description",
    "twitter_title",
    "twitter_description",
];

/// The six suggestion field values, as carried by apply requests and the
/// `current_meta` view of the stored state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFields {
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub open_graph_title: String,
    #[serde(default)]
    pub open_graph_description: String,
    #[serde(default)]
    pub twitter_title: String,
    #[serde(default)]
    pub twitter_description: String,
}

impl MetaFields {
    pub fn get(&self, key: &str) -> &str {
        match key {
            "meta_title" => &self.meta_title,
            "meta_description" => &self.meta_description,
            "open_graph_title" => &self.open_graph_title,
            "open_graph_description" => &self.open_graph_description,
            "twitter_title" => &self.twitter_title,
            "twitter_description" => &self.twitter_description,
            _ => "",
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "meta_title" => self.meta_title = value,
            "meta_description" => self.meta_description = value,
            "open_graph_title" => self.open_graph_title = value,
            "open_graph_description" => self.open_graph_description = value,
            "twitter_title" => self.twitter_title = value,
            "twitter_description" => self.twitter_description = value,
            _ => {}
        }
    }
}

fn strip_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for ch in value.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Host convention for single-line metadata: no markup, no control
/// characters, single spaces.
pub fn sanitize_text_field(value: &str) -> String {
    strip_markup(value)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Host convention for multi-line metadata: no markup, normalized newlines,
/// lines trimmed of trailing spaces.
pub fn sanitize_textarea_field(value: &str) -> String {
    let stripped = strip_markup(value).replace("\r\n", "\n").replace('\r', "\n");
    stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Apply the given field values to the post's metadata. A field whose flag is
/// absent defaults to apply; a trimmed-empty value deletes the stored key and
/// is not counted as updated. Each key write is independent of the others.
pub fn apply_fields(
    paths: &AssistPaths,
    post_id: u64,
    values: &MetaFields,
    flags: &BTreeMap<String, bool>,
) -> Result<Vec<String>> {
    let mut updated = Vec::new();

    for (field, meta_key, kind) in META_FIELDS {
        let should_apply = flags.get(field).copied().unwrap_or(true);
        if !should_apply {
            continue;
        }

        let sanitized = match kind {
            FieldKind::Text => sanitize_text_field(values.get(field)),
            FieldKind::Textarea => sanitize_textarea_field(values.get(field)),
        };
        let value = sanitized.trim();

        if value.is_empty() {
            store::delete_post_meta(paths, post_id, meta_key)?;
            continue;
        }

        store::update_post_meta(paths, post_id, meta_key, value)?;
        updated.push(meta_key.to_string());
    }

    Ok(updated)
}

/// Read the stored metadata back out as suggestion-field values.
pub fn current_meta(paths: &AssistPaths, post_id: u64) -> Result<MetaFields> {
    let mut out = MetaFields::default();
    for (field, meta_key, _) in META_FIELDS {
        out.set(field, store::get_post_meta(paths, post_id, meta_key)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::paths::test_paths;
    use crate::assist::store::PostRecord;
    use tempfile::tempdir;

    fn seed(paths: &crate::assist::paths::AssistPaths, post_id: u64) {
        store::save_post(
            paths,
            post_id,
            &PostRecord {
                title: "Home".to_string(),
                content: String::new(),
                permalink: None,
                editable: true,
                meta: BTreeMap::new(),
            },
        )
        .expect("save post");
    }

    fn values() -> MetaFields {
        MetaFields {
            meta_title: "Home | widgets".to_string(),
            meta_description: "Enterprise widgets.".to_string(),
            open_graph_title: "Home | widgets".to_string(),
            open_graph_description: "Enterprise widgets.".to_string(),
            twitter_title: "Home | widgets".to_string(),
            twitter_description: "Enterprise widgets.".to_string(),
        }
    }

    #[test]
    fn all_fields_apply_by_default() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        seed(&paths, 1);

        let updated = apply_fields(&paths, 1, &values(), &BTreeMap::new()).expect("apply");
        assert_eq!(updated.len(), 6);
        assert_eq!(
            store::get_post_meta(&paths, 1, "_genesis_title").expect("meta"),
            "Home | widgets"
        );
    }

    #[test]
    fn false_flag_skips_the_field_entirely() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        seed(&paths, 1);

        let mut flags = BTreeMap::new();
        flags.insert("meta_title".to_string(), false);

        let updated = apply_fields(&paths, 1, &values(), &flags).expect("apply");
        assert!(!updated.contains(&"_genesis_title".to_string()));
        assert_eq!(updated.len(), 5);
        assert_eq!(store::get_post_meta(&paths, 1, "_genesis_title").expect("meta"), "");
    }

    #[test]
    fn empty_value_deletes_the_key_and_is_not_counted() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        seed(&paths, 1);
        store::update_post_meta(&paths, 1, "_twitter_description", "old value").expect("seed meta");

        let mut vals = values();
        vals.twitter_description = "   ".to_string();

        let updated = apply_fields(&paths, 1, &vals, &BTreeMap::new()).expect("apply");
        assert!(!updated.contains(&"_twitter_description".to_string()));
        assert_eq!(
            store::get_post_meta(&paths, 1, "_twitter_description").expect("meta"),
            ""
        );
        // Deleting an already-absent key stays a no-op.
        let updated = apply_fields(&paths, 1, &vals, &BTreeMap::new()).expect("apply again");
        assert!(!updated.contains(&"_twitter_description".to_string()));
    }

    #[test]
    fn sanitizers_strip_markup_and_normalize_whitespace() {
        assert_eq!(
            sanitize_text_field("  <b>Home</b>   widgets \n title "),
            "Home widgets title"
        );
        assert_eq!(
            sanitize_textarea_field("Line one.  \r\n<em>Line two.</em>\r\n"),
            "Line one.\nLine two."
        );
    }

    #[test]
    fn roundtrip_applied_values_show_up_in_current_meta() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        seed(&paths, 2);

        apply_fields(&paths, 2, &values(), &BTreeMap::new()).expect("apply");
        let current = current_meta(&paths, 2).expect("current");
        assert_eq!(current, values());
    }
}
