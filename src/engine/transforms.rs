//! Text transforms: `{T-REPLACE-RX:...}` and `{T-CONV:...}`.

use super::encoding::transform_content;
use super::pipeline::Compiler;
use crate::api::CompileContext;
use crate::error::{Result, SprError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

const REPLACE_RX_PREFIX: &str = "{T-REPLACE-RX:";
const CONV_PREFIX: &str = "{T-CONV:";

/// `{T-REPLACE-RX:/source/pattern/replacement/}`; the replacement may use
/// `$1` / `${name}` group references.
fn replace_rx(source: &str, pattern: &str, replacement: &str) -> Result<String> {
    let re = Regex::new(pattern)?;
    Ok(re.replace_all(source, replacement).into_owned())
}

/// `{T-CONV:/source/mode/}`. Unknown modes return the source unchanged.
fn convert(source: &str, mode: &str) -> Result<String> {
    let converted = match mode.to_lowercase().as_str() {
        "u" | "upper" => source.to_uppercase(),
        "l" | "lower" => source.to_lowercase(),
        "base64" => STANDARD.encode(source.as_bytes()),
        "hex" => hex::encode_upper(source.as_bytes()),
        "uri" => {
            if let Some(bad) = regex!(r"%(?:[0-9A-Fa-f]{2})?").find_iter(source).find(|m| m.len() != 3) {
                return Err(SprError::PercentEscape(bad.start()));
            }
            let spaced = source.replace('+', " ");
            percent_decode_str(&spaced).decode_utf8()?.into_owned()
        }
        "uri-dec" => url::form_urlencoded::byte_serialize(source.as_bytes()).collect(),
        _ => source.to_string(),
    };
    Ok(converted)
}

impl Compiler<'_> {
    /// Both transform families, each looped until no token is left. Failed
    /// transforms drop their token.
    pub(super) fn text_transforms(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        let mut text = text;

        while let Some(found) = self.take_placeholder(&mut text, REPLACE_RX_PREFIX, ctx, depth) {
            let [source, pattern, rest @ ..] = found.params.as_slice() else {
                continue;
            };
            let replacement = rest.first().map(String::as_str).unwrap_or_default();

            match replace_rx(source, pattern, replacement) {
                Ok(value) => text.insert_str(found.start, &transform_content(&value, ctx)),
                Err(err) => debug!(%pattern, error = %err, "dropping T-REPLACE-RX token"),
            }
        }

        while let Some(found) = self.take_placeholder(&mut text, CONV_PREFIX, ctx, depth) {
            let [source, mode, ..] = found.params.as_slice() else {
                continue;
            };

            match convert(source, mode) {
                Ok(value) => text.insert_str(found.start, &transform_content(&value, ctx)),
                Err(err) => debug!(%mode, error = %err, "dropping T-CONV token"),
            }
        }

        text
    }
}
