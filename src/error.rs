use thiserror::Error;

/// Failures raised inside a compile run.
///
/// None of these reach the caller of [`crate::Engine::compile`]: the pipeline
/// logs them and degrades to "drop the token" or "substitute empty".
#[derive(Debug, Error)]
pub enum SprError {
    #[error("field '{field}' does not hold valid {encoding} data")]
    SecretDecode { field: &'static str, encoding: &'static str },

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("'%' at byte {0} is not followed by two hex digits")]
    PercentEscape(usize),

    #[error("decoded text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{capability} failed: {message}")]
    Capability { capability: &'static str, message: String },
}

impl SprError {
    /// Wrap an error reported by an injected collaborator.
    pub fn capability(capability: &'static str, message: impl Into<String>) -> Self {
        SprError::Capability { capability, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, SprError>;
