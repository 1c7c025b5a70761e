//! Parameterized placeholder scanner.
//!
//! Handles tokens of the form `{PREFIX<sep>p1<sep>p2<sep>...<sep>}` where the
//! separator is whatever character directly follows the prefix:
//!
//! ```text
//! {T-CONV:/hello/upper/}     sep = '/', params = ["hello", "upper"]
//! {T-REPLACE-RX:|a|b|c|}     sep = '|', params = ["a", "b", "c"]
//! ```
//!
//! For prefixes ending in `:` the colon itself is accepted as the separator
//! when the regular form does not parse (`{T-CONV:hello:upper:}`).
//!
//! A malformed token cuts the string at the token start. Whatever parameters
//! were read before the failure are still returned.

use super::pipeline::Compiler;
use super::text::find_ci;
use crate::api::CompileContext;

/// A placeholder removed from the working string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder {
    /// Byte offset where the token started; the replacement goes here.
    pub start: usize,
    pub params: Vec<String>,
}

/// Parameters starting at the separator located at byte `sep_at`.
///
/// Returns the parameters read and, when the list was closed properly, the
/// byte offset just past the closing `}`.
fn split_params(text: &str, sep_at: usize) -> (Vec<String>, Option<usize>) {
    let mut params = Vec::new();
    let Some(sep) = text.get(sep_at..).and_then(|rest| rest.chars().next()) else {
        return (params, None);
    };

    let mut p = sep_at;
    loop {
        let after = p + sep.len_utf8();
        match text[after..].chars().next() {
            None => return (params, None),
            Some('}') => return (params, Some(after + 1)),
            Some(_) => {}
        }
        let Some(q) = text[after..].find(sep).map(|i| after + i) else {
            return (params, None);
        };
        params.push(text[after..q].to_string());
        p = q;
    }
}

/// Find, parse and remove the first `prefix` token from `text`.
///
/// Returns `None` (and leaves `text` untouched) when the prefix is absent.
pub(crate) fn scan_placeholder(text: &mut String, prefix: &str) -> Option<Placeholder> {
    let (start, len) = find_ci(text, prefix, 0)?;
    let sep_at = start + len;

    let (mut params, mut end) = split_params(text, sep_at);
    if end.is_none() && prefix.ends_with(':') {
        let (colon_params, colon_end) = split_params(text, sep_at - 1);
        if colon_end.is_some() {
            params = colon_params;
            end = colon_end;
        }
    }

    match end {
        Some(end) => text.replace_range(start..end, ""),
        None => {
            tracing::trace!(prefix, start, "malformed placeholder; truncating");
            text.truncate(start);
        }
    }

    Some(Placeholder { start, params })
}

impl Compiler<'_> {
    /// [`scan_placeholder`], then compile every parameter at the current
    /// depth with the output encoders off.
    pub(super) fn take_placeholder(
        &self,
        text: &mut String,
        prefix: &str,
        ctx: &CompileContext<'_>,
        depth: usize,
    ) -> Option<Placeholder> {
        let mut placeholder = scan_placeholder(text, prefix)?;

        let sub = ctx.without_content_transforms();
        for param in &mut placeholder.params {
            *param = self.compile_internal(param, &sub, depth);
        }

        Some(placeholder)
    }
}
