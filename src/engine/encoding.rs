//! Output encoders.
//!
//! A resolved value is encoded exactly once, at the point where it is inserted
//! into the outermost string of its branch. Literal text written by the user
//! is never encoded: it already is in the target syntax.

use crate::api::CompileContext;

/// First code point tried as a brace sentinel (WHITE SQUARE).
const SENTINEL_START: char = '\u{25A1}';

/// Characters with a meaning in auto-type sequences, wrapped as `{c}`.
const AUTO_TYPE_SPECIAL: [char; 8] = ['[', ']', '+', '%', '~', '(', ')', '^'];

/// Encode `content` for the output target selected in `ctx`.
pub(crate) fn transform_content(content: &str, ctx: &CompileContext<'_>) -> String {
    let mut out = content.to_string();

    if ctx.encode_quotes_for_command_line {
        out = make_command_quotes(&out);
    }
    if ctx.encode_as_auto_type {
        out = make_auto_type_sequence(&out);
    }

    out
}

/// Escape `text` so that an auto-type sequence types it literally.
pub fn make_auto_type_sequence(text: &str) -> String {
    let braces_escaped = escape_auto_type_brackets(text);

    let mut out = String::with_capacity(braces_escaped.len());
    for ch in braces_escaped.chars() {
        if AUTO_TYPE_SPECIAL.contains(&ch) {
            out.push('{');
            out.push(ch);
            out.push('}');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Next code point at or after `from` that does not occur in `text`.
fn free_char(text: &str, from: char) -> char {
    let mut candidate = from;
    while text.contains(candidate) {
        candidate = next_char(candidate);
    }
    candidate
}

fn next_char(ch: char) -> char {
    let mut code = ch as u32 + 1;
    while char::from_u32(code).is_none() {
        code += 1;
    }
    char::from_u32(code).unwrap_or(ch)
}

/// Rewrite `{` / `}` as `{{}` / `{}}`.
///
/// Braces are first mapped to two sentinel characters absent from the input,
/// so that the `}` of an inserted `{{}` is never escaped a second time.
fn escape_auto_type_brackets(text: &str) -> String {
    let open = free_char(text, SENTINEL_START);
    let close = free_char(text, next_char(open));

    let masked: String = text
        .chars()
        .map(|ch| match ch {
            '{' => open,
            '}' => close,
            other => other,
        })
        .collect();

    masked.replace(open, "{{}").replace(close, "{}}")
}

/// Triple every double quote, as expected by command-line argument parsers.
pub fn make_command_quotes(text: &str) -> String {
    text.replace('"', "\"\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_type_escapes_every_special_character() {
        assert_eq!(make_auto_type_sequence("{}[]+%~()^"), "{{}{}}{[}{]}{+}{%}{~}{(}{)}{^}");
        assert_eq!(make_auto_type_sequence("plain text"), "plain text");
    }

    #[test]
    fn auto_type_keeps_adjacent_braces_apart() {
        assert_eq!(make_auto_type_sequence("a{b}c"), "a{{}b{}}c");
        assert_eq!(make_auto_type_sequence("}}{{"), "{}}{}}{{}{{}");
    }

    #[test]
    fn sentinels_skip_characters_present_in_input() {
        let text = "\u{25A1}\u{25A2}{x}";
        assert_eq!(make_auto_type_sequence(text), "\u{25A1}\u{25A2}{{}x{}}");
    }

    #[test]
    fn command_quotes_are_tripled() {
        assert_eq!(make_command_quotes(r#"say "hi""#), r#"say """hi""""#);
    }

    #[test]
    fn transform_applies_quotes_before_auto_type() {
        let ctx = CompileContext::default().encode_as_auto_type(true).encode_quotes_for_command_line(true);
        assert_eq!(transform_content("\"+", &ctx), "\"\"\"{+}");
        assert_eq!(transform_content("a+b", &CompileContext::default()), "a+b");
    }
}
