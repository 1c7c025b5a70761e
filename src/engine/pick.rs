//! Interactive character picking.
//!
//! `{PICKCHARS}` asks the engine's [`CharPicker`](crate::CharPicker) to pick
//! characters from a field and substitutes the answer:
//!
//! ```text
//! {PICKCHARS}                              pick from the password
//! {PICKCHARS:Pin:c=2,id=p,hide=false}      two chars of the Pin field, remembered as "p"
//! {PICKCHARS:Password:id=p,conv=d}         the "p" pick again, as {DOWN} presses
//! ```
//!
//! The deprecated `{PICKPASSWORDCHARS[:count]}` form is only compiled when the
//! context enables it.

use super::encoding::transform_content;
use super::pipeline::Compiler;
use super::text::find_ci;
use crate::api::CompileContext;
use crate::record::{PASSWORD_FIELD, Record};
use crate::services::PickRequest;
use std::collections::HashMap;
use tracing::trace;

const PICK_CHARS_START: &str = "{PICKCHARS";
const LEGACY_PICK_START: &str = "{PICKPASSWORDCHARS";

/// Options of `{PICKCHARS:<field>:<options>}`; keys lowercased, values trimmed.
fn parse_options(options: &str) -> HashMap<String, String> {
    options
        .split(',')
        .filter(|opt| !opt.is_empty())
        .filter_map(|opt| {
            let mut kv = opt.split('=');
            match (kv.next(), kv.next(), kv.next()) {
                (Some(key), Some(value), None) => Some((key.trim().to_lowercase(), value.trim().to_string())),
                _ => None,
            }
        })
        .collect()
}

fn parse_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn string_to_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on" | "enabled" | "checked")
}

/// Replace every `{<marker>...}` token with `resolve(param)`, where `param` is
/// the text between the marker and the first `}`. Identical tokens share one
/// resolution; inserted text is never re-scanned.
fn replace_tokens(text: &str, marker: &str, mut resolve: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut resolved: HashMap<String, String> = HashMap::new();
    let mut rest = text;

    while let Some((start, len)) = find_ci(rest, marker, 0) {
        let Some(close) = rest[start..].find('}').map(|i| start + i) else {
            break;
        };
        out.push_str(&rest[..start]);

        let key = rest[start..=close].to_lowercase();
        let value = match resolved.get(&key) {
            Some(value) => value.clone(),
            None => {
                let value = resolve(&rest[start + len..close]);
                resolved.insert(key, value.clone());
                value
            }
        };
        out.push_str(&value);
        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    out
}

// --- Down-arrow conversion --------------------------------------------------

/// Number of `{DOWN}` presses that select `ch` in a list laid out as `layout`.
fn down_count(ch: char, layout: &str) -> Option<i64> {
    let digit = ch.to_digit(10).map(i64::from);
    let letter = ch.is_ascii_alphabetic().then(|| i64::from(ch.to_ascii_lowercase() as u8 - b'a'));
    // Position of a digit in a 1..9,0 list.
    let one_based = digit.map(|d| if d == 0 { 9 } else { d - 1 });

    match layout.to_lowercase().as_str() {
        "" => digit.or(letter),
        "0a" => digit.or(letter.map(|l| l + 10)),
        "a0" => digit.map(|d| d + 26).or(letter),
        "1a" => one_based.or(letter.map(|l| l + 10)),
        "a1" => one_based.map(|d| d + 26).or(letter),
        _ => None,
    }
}

/// Most `{DOWN}` presses emitted for one character; selection lists are short.
const MAX_DOWNS_PER_CHAR: i64 = 256;

/// Convert `text` into `{DOWN}` presses; unmapped characters are skipped.
pub(crate) fn convert_to_down_arrows(text: &str, offset: i64, layout: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        let Some(downs) = down_count(ch, layout) else {
            continue;
        };
        let presses = offset.saturating_add(downs).clamp(0, MAX_DOWNS_PER_CHAR);
        for _ in 0..presses {
            out.push_str("{DOWN}");
        }
    }
    out
}

impl Compiler<'_> {
    /// Compile `word` and ask the picker for characters of it. An empty word
    /// never reaches the picker.
    fn show_pick(
        &self,
        word: &str,
        count: usize,
        initially_hidden: Option<bool>,
        ctx: &CompileContext<'_>,
        depth: usize,
    ) -> String {
        let text = self.compile_internal(word, &ctx.without_content_transforms(), depth + 1);
        if text.is_empty() {
            return String::new();
        }
        self.engine.picker.pick(&PickRequest { text: &text, count, initially_hidden })
    }

    /// Legacy `{PICKPASSWORDCHARS}` / `{PICKPASSWORDCHARS:<count>}`.
    pub(super) fn pick_password_chars(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        let Some(record) = ctx.record else {
            return text;
        };

        replace_tokens(&text, LEGACY_PICK_START, |param| {
            let count = param.split(':').nth(1).map(parse_int).unwrap_or(0);
            let picked = self.show_pick(
                &record.get_or_empty(PASSWORD_FIELD),
                usize::try_from(count).unwrap_or(0),
                None,
                ctx,
                depth,
            );
            transform_content(&picked, ctx)
        })
    }

    /// `{PICKCHARS}` / `{PICKCHARS:<field>:<options>}`.
    pub(super) fn pick_chars(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        let Some(record) = ctx.record else {
            return text;
        };

        replace_tokens(&text, PICK_CHARS_START, |param| {
            if param.is_empty() {
                let picked = self.show_pick(&record.get_or_empty(PASSWORD_FIELD), 0, None, ctx, depth);
                transform_content(&picked, ctx)
            } else if let Some(args) = param.strip_prefix(':') {
                self.pick_with_options(record, args, ctx, depth)
            } else {
                String::new()
            }
        })
    }

    fn pick_with_options(&self, record: &dyn Record, args: &str, ctx: &CompileContext<'_>, depth: usize) -> String {
        let mut parts = args.split(':');
        let field = parts.next().map(str::trim).filter(|f| !f.is_empty()).unwrap_or(PASSWORD_FIELD);
        let options = parse_options(parts.next().unwrap_or_default());

        let id = options.get("id").map(|id| id.to_lowercase()).unwrap_or_default();
        let count = options.get("count").or_else(|| options.get("c")).map(|c| parse_int(c)).unwrap_or(0);
        let initially_hidden = options.get("hide").map(|h| string_to_bool(h));

        let content = record.get_or_empty(field);
        let remembered = if id.is_empty() { None } else { self.picked.borrow().get(&id).cloned() };
        let picked = if content.is_empty() {
            String::new()
        } else if let Some(previous) = remembered {
            trace!(%id, "reusing remembered pick");
            previous
        } else {
            self.show_pick(&content, usize::try_from(count).unwrap_or(0), initially_hidden, ctx, depth)
        };
        if !id.is_empty() {
            self.picked.borrow_mut().insert(id, picked.clone());
        }

        match options.get("conv") {
            Some(conv) if conv.eq_ignore_ascii_case("d") => {
                let offset = options.get("conv-offset").map(|o| parse_int(o)).unwrap_or(0);
                let layout = options.get("conv-fmt").map(String::as_str).unwrap_or_default();
                // Already keystroke syntax: inserted without encoding.
                convert_to_down_arrows(&picked, offset, layout)
            }
            _ => transform_content(&picked, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_normalized() {
        let options = parse_options(" ID = Pin ,c=3,,broken,a=b=c,C=4");
        assert_eq!(options.get("id").map(String::as_str), Some("Pin"));
        assert_eq!(options.get("c").map(String::as_str), Some("4"));
        assert!(!options.contains_key("broken"));
        assert!(!options.contains_key("a"));
    }

    #[test]
    fn down_arrow_layouts() {
        assert_eq!(convert_to_down_arrows("2b", 0, ""), "{DOWN}{DOWN}{DOWN}");
        assert_eq!(convert_to_down_arrows("b", 0, "0a"), "{DOWN}".repeat(11));
        assert_eq!(convert_to_down_arrows("0", 0, "a0"), "{DOWN}".repeat(26));
        assert_eq!(convert_to_down_arrows("0", 0, "1a"), "{DOWN}".repeat(9));
        assert_eq!(convert_to_down_arrows("1", 0, "A1"), "{DOWN}".repeat(26));
        assert_eq!(convert_to_down_arrows("1", 2, "1a"), "{DOWN}{DOWN}");
        assert_eq!(convert_to_down_arrows("a-!", 1, ""), "{DOWN}");
        assert_eq!(convert_to_down_arrows("c", 0, "zz"), "");
    }

    #[test]
    fn down_arrow_offsets_are_bounded() {
        assert_eq!(convert_to_down_arrows("b", i64::MAX, ""), "{DOWN}".repeat(256));
        assert_eq!(convert_to_down_arrows("b", 2_000_000_000, ""), "{DOWN}".repeat(256));
        assert_eq!(convert_to_down_arrows("b", i64::MIN, ""), "");
    }

    #[test]
    fn replace_tokens_resolves_each_distinct_token_once() {
        let mut calls = 0;
        let out = replace_tokens("x{PICKCHARS}y{pickchars}z{PICKCHARS:f:}", "{PICKCHARS", |param| {
            calls += 1;
            format!("<{param}>")
        });
        assert_eq!(out, "x<>y<>z<:f:>");
        assert_eq!(calls, 2);
    }

    #[test]
    fn unterminated_token_is_left_alone() {
        assert_eq!(replace_tokens("a{PICKCHARS:x", "{PICKCHARS", |_| "!".into()), "a{PICKCHARS:x");
    }

    #[test]
    fn bool_parsing() {
        assert!(string_to_bool("True"));
        assert!(string_to_bool("1"));
        assert!(!string_to_bool("no"));
        assert!(!string_to_bool(""));
    }
}
