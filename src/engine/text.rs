//! Case-insensitive string search and path helpers.
//!
//! Placeholders match regardless of case (`{Title}` == `{TITLE}`). Matching
//! is done char by char with full Unicode lowercasing so that byte offsets
//! always refer to the original string.

/// Length in bytes of the prefix of `s` that case-insensitively equals `prefix`.
fn match_len_ci(s: &str, prefix: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut chars = s.chars();
    for expected in prefix.chars() {
        let actual = chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        consumed += actual.len_utf8();
    }
    Some(consumed)
}

/// First case-insensitive match of `needle` at or after byte `from`.
///
/// Returns `(start, len)` in bytes of `haystack`.
pub(crate) fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    // An offset inside a multibyte char moves forward to the next boundary.
    let from = (from..=haystack.len()).find(|&i| haystack.is_char_boundary(i))?;
    haystack[from..]
        .char_indices()
        .find_map(|(i, _)| match_len_ci(&haystack[from + i..], needle).map(|len| (from + i, len)))
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle, 0).is_some()
}

/// Replace every case-insensitive occurrence of `find` with `replacement`.
///
/// Replaced text is never re-scanned.
pub(crate) fn replace_ci(text: &str, find: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some((start, len)) = find_ci(text, find, pos) {
        out.push_str(&text[pos..start]);
        out.push_str(replacement);
        pos = start + len;
    }
    out.push_str(&text[pos..]);
    out
}

/// Normalize `\r\n` and lone `\r` to `\n`.
pub(crate) fn normalize_new_lines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

// --- Paths ------------------------------------------------------------------

fn last_dir_sep(path: &str) -> Option<usize> {
    path.rfind(['/', '\\'])
}

/// Directory part of `path` without a terminating separator.
pub(crate) fn file_directory(path: &str) -> &str {
    match last_dir_sep(path) {
        Some(i) => &path[..i],
        None => "",
    }
}

/// File name part of `path`.
pub(crate) fn file_name(path: &str) -> &str {
    match last_dir_sep(path) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

fn extension_dot(path: &str) -> Option<usize> {
    let dot = path.rfind('.')?;
    match last_dir_sep(path) {
        Some(sep) if dot <= sep => None,
        _ => Some(dot),
    }
}

/// `path` without its extension (the directory part is kept).
pub(crate) fn strip_extension(path: &str) -> &str {
    match extension_dot(path) {
        Some(dot) => &path[..dot],
        None => path,
    }
}

/// Extension of `path` without the leading dot.
pub(crate) fn extension(path: &str) -> &str {
    match extension_dot(path) {
        Some(dot) => &path[dot + 1..],
        None => "",
    }
}

/// Strip the scheme of a URL: `scheme://`, `scheme:/` or `scheme:`, whichever
/// separator comes first.
pub(crate) fn remove_scheme(url: &str) -> &str {
    let net = url.find("://");
    let sh = url.find(":/");
    let simple = url.find(':');

    let Some(min) = [net, sh, simple].into_iter().flatten().min() else {
        return url;
    };

    if Some(min) == net {
        &url[min + 3..]
    } else if Some(min) == sh {
        &url[min + 2..]
    } else {
        &url[min + 1..]
    }
}
