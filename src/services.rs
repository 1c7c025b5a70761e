//! Injected capabilities.
//!
//! Everything the engine needs from the outside world besides records: wall
//! clock, environment, the interactive character picker, reversible encryption
//! for `{PASSWORD_ENC}`, password generation for `{NEWPASSWORD}` and plugin
//! filters. Each has a small trait so tests (and embedders) can supply
//! deterministic implementations.

use crate::api::CompileContext;
use crate::error::Result;
use chrono::{Local, NaiveDateTime, Utc};

// --- Clock ------------------------------------------------------------------

/// One instant, seen in local time and in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub local: NaiveDateTime,
    pub utc: NaiveDateTime,
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = Utc::now();
        Timestamp { local: now.with_timezone(&Local).naive_local(), utc: now.naive_utc() }
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// --- Environment ------------------------------------------------------------

/// Source of `%NAME%` substitutions.
pub trait EnvSource {
    fn vars(&self) -> Vec<(String, String)>;
}

/// The process environment. Non-UTF-8 entries are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect()
    }
}

/// A fixed list of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv(pub Vec<(String, String)>);

impl StaticEnv {
    pub fn new<K: Into<String>, V: Into<String>>(vars: impl IntoIterator<Item = (K, V)>) -> Self {
        StaticEnv(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for StaticEnv {
    fn vars(&self) -> Vec<(String, String)> {
        self.0.clone()
    }
}

// --- Interactive pick -------------------------------------------------------

/// What the user is asked to pick characters from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest<'t> {
    /// Already compiled text to pick from (never empty).
    pub text: &'t str,
    /// Requested number of characters; `0` means "user decides".
    pub count: usize,
    /// Initial masking state of the dialog, when the placeholder specified one.
    pub initially_hidden: Option<bool>,
}

/// Interactive "pick characters" capability. Its answer is substituted verbatim
/// (before output encoding).
pub trait CharPicker {
    fn pick(&self, request: &PickRequest<'_>) -> String;
}

/// Picker for non-interactive callers: always picks nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPicker;

impl CharPicker for NoPicker {
    fn pick(&self, _request: &PickRequest<'_>) -> String {
        String::new()
    }
}

// --- Encryption / generation ------------------------------------------------

/// Reversible encryption used by `{PASSWORD_ENC}`.
pub trait StringProtector {
    fn encrypt(&self, plain: &str) -> Result<String>;
}

/// Password generator used by `{NEWPASSWORD}`; `profile` is the optional
/// placeholder parameter (`{NEWPASSWORD:/Profile/}`).
pub trait PasswordGenerator {
    fn generate(&self, profile: Option<&str>) -> Result<String>;
}

// --- Filters ----------------------------------------------------------------

/// Plugin hook run before (pre) or after (post) the built-in passes.
///
/// Filters only run when the context carries `EXT_ACTIVE` or `EXT_NON_ACTIVE`.
/// A filter performing an active transformation (state change, UI) should check
/// `ctx.flags.contains(CompileFlags::EXT_ACTIVE)` itself.
pub trait CompileFilter {
    fn filter(&self, text: String, ctx: &CompileContext<'_>) -> String;
}

impl<F> CompileFilter for F
where
    F: Fn(String, &CompileContext<'_>) -> String,
{
    fn filter(&self, text: String, ctx: &CompileContext<'_>) -> String {
        self(text, ctx)
    }
}
