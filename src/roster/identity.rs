//! Person-key normalisation.
//!
//! Every segment is grouped under a person key of the form `person-<slug>`.
//! Keys derived from names go through [`slugify`]; keys that were stored on a
//! record are authoritative and used as-is (see [`resolve_person_key`]).

pub const PERSON_KEY_PREFIX: &str = "person-";

/// The whitespace set that older key writers split words on. It differs from
/// `char::is_whitespace`: U+FEFF separates, U+0085 does not.
fn is_separator_space(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' '
            | '\u{A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}'
            | '\u{2028}' | '\u{2029}' | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

/// Lowercase, keep only `[a-z0-9]`, and join the remaining words with single
/// hyphens. Whitespace and hyphen runs become one separator; any other
/// character is dropped without separating words (`"o'neil"` -> `"oneil"`).
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch == '-' || is_separator_space(ch) {
            pending_separator = true;
        }
    }

    slug
}

pub fn key_from_name(name: &str) -> String {
    format!("{PERSON_KEY_PREFIX}{}", slugify(name))
}

/// Canonical key for either an existing key or a raw name. Idempotent.
pub fn canonicalize_id(id_or_name: &str) -> String {
    let raw = id_or_name.trim();
    match raw.strip_prefix(PERSON_KEY_PREFIX) {
        Some(rest) => format!("{PERSON_KEY_PREFIX}{}", slugify(rest)),
        None => key_from_name(raw),
    }
}

/// Keys that older imports may have written for the same person.
///
/// Order is significant: the canonical key comes first, duplicates are removed.
pub fn candidate_keys(canonical: &str) -> Vec<String> {
    let without_prefix = canonical
        .strip_prefix(PERSON_KEY_PREFIX)
        .unwrap_or(canonical);

    let variants = [
        canonical,
        without_prefix,
        canonical.trim_end_matches('-'),
        without_prefix.trim_end_matches('-'),
    ];

    let mut keys: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        if !keys.iter().any(|existing| existing == variant) {
            keys.push(variant.to_string());
        }
    }
    keys
}

/// Person key for a stored record: the stored id wins, the name is the fallback.
///
/// Returns `None` when neither is usable; such records cannot be grouped.
pub fn resolve_person_key(person_id: Option<&str>, name: Option<&str>) -> Option<String> {
    if let Some(id) = person_id.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(id.to_string());
    }

    name.filter(|name| !name.trim().is_empty())
        .map(key_from_name)
}
