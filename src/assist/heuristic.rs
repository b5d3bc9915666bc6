//! Deterministic text-analysis fallback: strips the post body down to plain
//! text, then derives a description, ranked keywords, and a title variant.

use crate::assist::builder::SuggestionBundle;
use crate::assist::paths::AssistPaths;
use crate::assist::store;
use anyhow::Result;

pub const DESCRIPTION_LIMIT: usize = 155;
pub const TITLE_LIMIT: usize = 60;
const FALLBACK_TITLE: &str = "Suggested Title";

const STOPWORDS: [&str; 39] = [
    "the", "and", "for", "with", "that", "this", "from", "your", "have", "will", "about", "into",
    "while", "what", "when", "where", "would", "could", "their", "there", "they", "them", "over",
    "under", "above", "below", "between", "after", "before", "because", "been", "being", "also",
    "just", "more", "most", "such", "only", "other",
];

/// Build the full heuristic bundle for a post. Empty `title`/`content`
/// arguments fall back to the stored post record; an unknown post degrades to
/// empty strings rather than failing.
pub fn build(paths: &AssistPaths, post_id: u64, title: &str, content: &str) -> Result<SuggestionBundle> {
    let stored = if title.is_empty() || content.is_empty() {
        store::load_post(paths, post_id)?
    } else {
        None
    };

    let resolved_content = if content.is_empty() {
        stored.as_ref().map(|p| p.content.clone()).unwrap_or_default()
    } else {
        content.to_string()
    };
    let resolved_title = if title.is_empty() {
        stored.as_ref().map(|p| p.title.clone()).unwrap_or_default()
    } else {
        title.to_string()
    };

    let plain = normalize_content(&resolved_content);
    let description = generate_description(&plain);
    let keywords = extract_keywords(&plain);
    let title_suggestion = generate_title(&resolved_title, &keywords);

    Ok(SuggestionBundle {
        meta_title: title_suggestion.clone(),
        meta_description: description.clone(),
        open_graph_title: title_suggestion.clone(),
        open_graph_description: description.clone(),
        twitter_title: title_suggestion,
        twitter_description: description,
        keywords,
        model_used: "heuristic".to_string(),
    })
}

/// Strip markup, decode entities, and collapse whitespace runs to a single
/// space. Tags are replaced with a space so adjacent blocks never glue words
/// together.
pub fn normalize_content(content: &str) -> String {
    let stripped = strip_markup(content);
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_markup(input: &str) -> String {
    let without_blocks = drop_container(input, "script");
    let without_blocks = drop_container(&without_blocks, "style");

    let mut out = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    for ch in without_blocks.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Remove `<name ...>...</name>` containers including their content.
fn drop_container(input: &str, name: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}>");

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;
    while let Some(rel_start) = lower[cursor..].find(&open) {
        let start = cursor + rel_start;
        out.push_str(&input[cursor..start]);
        match lower[start..].find(&close) {
            Some(rel_end) => cursor = start + rel_end + close.len(),
            None => return out,
        }
    }
    out.push_str(&input[cursor..]);
    out
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            Some(end) if end <= 10 => {
                let entity = &tail[1..end];
                match decode_entity(entity) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }

    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "hellip" => Some('…'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "lsquo" => Some('‘'),
        "rsquo" => Some('’'),
        "ldquo" => Some('“'),
        "rdquo" => Some('”'),
        _ => None,
    }
}

/// First sentence of the text: everything up to the first `.`, `!` or `?`
/// that is followed by whitespace, or the whole text when no boundary exists.
fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().is_some_and(|(_, next)| next.is_whitespace())
        {
            return &text[..=idx];
        }
    }
    text
}

pub fn generate_description(plain: &str) -> String {
    if plain.is_empty() {
        return String::new();
    }

    truncate(first_sentence(plain).trim(), DESCRIPTION_LIMIT)
}

pub fn generate_title(post_title: &str, keywords: &[String]) -> String {
    let mut title = post_title.to_string();
    if let Some(primary) = keywords.first() {
        if !post_title.to_lowercase().contains(&primary.to_lowercase()) {
            title = format!("{post_title} | {primary}");
        }
    }

    if title.is_empty() {
        title = FALLBACK_TITLE.to_string();
    }
    truncate(&title, TITLE_LIMIT)
}

/// Top five content words by frequency. Words of four characters or fewer
/// and common function words are discarded. Ties keep the first-seen order:
/// stable, but not otherwise specified.
pub fn extract_keywords(plain: &str) -> Vec<String> {
    if plain.is_empty() {
        return Vec::new();
    }

    let lowered = plain.to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for word in lowered.split(|c: char| !c.is_alphabetic() && c != '\'' && c != '-') {
        let word = word.trim_matches(|c| c == '\'' || c == '-');
        if word.chars().count() <= 4 || STOPWORDS.contains(&word) {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| seen == word) {
            Some((_, count)) => *count += 1,
            None => counts.push((word.to_string(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(5).map(|(word, _)| word).collect()
}

/// Truncate to `limit` characters: cut to `limit - 3`, trim trailing
/// whitespace, append `...`.
pub fn truncate(value: &str, limit: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= limit {
        return value.to_string();
    }

    let cut: String = value.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
