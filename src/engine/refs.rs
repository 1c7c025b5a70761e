//! Cross-record references: `{REF:<field>@<class>:<search>}`.
//!
//! `<class>` selects what the store searches (`T`itle, `U`ser name, URL `A`,
//! `P`assword, `N`otes, uu`I`d, `O`ther fields) and `<field>` what is read from
//! the first hit (same letters minus `O`). Resolved tokens are cached for the
//! whole top-level compile and the first value stored for a token wins.

use super::encoding::transform_content;
use super::pipeline::Compiler;
use super::text::{find_ci, replace_ci};
use crate::api::CompileContext;
use crate::record::{
    HIDDEN_PASSWORD, NOTES_FIELD, PASSWORD_FIELD, Record, SearchField, TITLE_FIELD, URL_FIELD, USER_NAME_FIELD,
};
use tracing::{debug, trace};

const REF_START: &str = "{REF:";

/// Upper bound on resolution attempts per pass.
pub const MAX_REF_ITERATIONS: usize = 20;

// --- Cache ------------------------------------------------------------------

/// Resolved reference tokens, in insertion order.
#[derive(Debug, Default)]
pub(crate) struct RefCache {
    entries: Vec<(String, String)>,
}

impl RefCache {
    /// Store `value` under `token` unless the token is already cached.
    pub(crate) fn insert_if_absent(&mut self, token: String, value: String) -> bool {
        if self.entries.iter().any(|(t, _)| *t == token) {
            return false;
        }
        self.entries.push((token, value));
        true
    }

    /// Replace every cached token occurring in `text` (case-insensitively).
    pub(crate) fn apply(&self, text: &str) -> String {
        self.entries.iter().fold(text.to_string(), |acc, (token, value)| replace_ci(&acc, token, value))
    }

    pub(crate) fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

// --- Token grammar ----------------------------------------------------------

/// A syntactically valid reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reference<'t> {
    /// Field letter to read from the hit, upper-cased.
    pub wanted: char,
    pub search_in: SearchField,
    pub search_text: &'t str,
}

/// Parse a full `{REF:...}` token.
///
/// The inner part needs `@` at char 1, `:` at char 3 and more than four chars.
pub(crate) fn parse_reference(token: &str) -> Option<Reference<'_>> {
    let inner = token.get(REF_START.len()..)?.strip_suffix('}')?;

    let mut chars = inner.char_indices();
    let (_, wanted) = chars.next()?;
    let (_, at) = chars.next()?;
    let (_, class) = chars.next()?;
    let (_, colon) = chars.next()?;
    let (text_start, _) = chars.next()?;

    if at != '@' || colon != ':' {
        return None;
    }

    Some(Reference {
        wanted: wanted.to_ascii_uppercase(),
        search_in: SearchField::from_code(class)?,
        search_text: &inner[text_start..],
    })
}

/// Raw value of the field letter `wanted` on `record`.
fn read_wanted(record: &dyn Record, wanted: char, ctx: &CompileContext<'_>) -> Option<String> {
    let field = match wanted {
        'T' => TITLE_FIELD,
        'U' => USER_NAME_FIELD,
        'A' => URL_FIELD,
        'N' => NOTES_FIELD,
        'P' if !ctx.force_plaintext_passwords => return Some(HIDDEN_PASSWORD.to_string()),
        'P' => PASSWORD_FIELD,
        'I' => return Some(record.uuid_hex()),
        _ => return None,
    };
    Some(record.get_or_empty(field))
}

impl Compiler<'_> {
    pub(super) fn references(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        let Some(store) = ctx.store else {
            return text;
        };

        let mut text = text;
        let mut offset = 0;
        for _ in 0..MAX_REF_ITERATIONS {
            text = self.refs.borrow().apply(&text);

            let Some((start, _)) = find_ci(&text, REF_START, offset) else {
                break;
            };
            let Some(end) = text[start + 1..].find('}').map(|i| start + 1 + i) else {
                break;
            };
            let token = text[start..=end].to_string();

            let Some(reference) = parse_reference(&token) else {
                offset = start + 1;
                continue;
            };
            let Some(found) = store.find_first(reference.search_in, reference.search_text) else {
                trace!(%token, "reference target not found");
                offset = start + 1;
                continue;
            };
            let Some(raw) = read_wanted(found, reference.wanted, ctx) else {
                offset = start + 1;
                continue;
            };

            let sub = ctx.without_content_transforms().with_record(found);
            let value = transform_content(&self.compile_internal(&raw, &sub, depth + 1), ctx);

            if !self.refs.borrow_mut().insert_if_absent(token.clone(), value) {
                debug!(%token, "reference already cached; keeping first value");
            }
            text = self.refs.borrow().apply(&text);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_references() {
        let r = parse_reference("{REF:p@i:0123ABCD}").unwrap();
        assert_eq!(r.wanted, 'P');
        assert_eq!(r.search_in, SearchField::Uuid);
        assert_eq!(r.search_text, "0123ABCD");

        let r = parse_reference("{REF:T@O:Pin=42}").unwrap();
        assert_eq!(r.search_in, SearchField::Other);
        assert_eq!(r.search_text, "Pin=42");
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!(parse_reference("{REF:T@T:}"), None);
        assert_eq!(parse_reference("{REF:T#T:x}"), None);
        assert_eq!(parse_reference("{REF:T@T-x}"), None);
        assert_eq!(parse_reference("{REF:T@X:x}"), None);
        assert_eq!(parse_reference("{REF:T@T:x"), None);
    }

    #[test]
    fn cache_is_first_write_wins_and_case_insensitive() {
        let mut cache = RefCache::default();
        assert!(cache.insert_if_absent("{REF:T@I:AB}".into(), "one".into()));
        assert!(!cache.insert_if_absent("{REF:T@I:AB}".into(), "two".into()));
        assert_eq!(cache.apply("x{ref:t@i:ab}y{REF:T@I:AB}"), "xoneyone");
        assert_eq!(cache.into_entries(), vec![("{REF:T@I:AB}".to_string(), "one".to_string())]);
    }
}
