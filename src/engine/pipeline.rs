//! Compilation pipeline and recursion control.

use super::metrics::{PassMetrics, RunMetrics};
use super::refs::RefCache;
use super::text::{normalize_new_lines, replace_ci};
use super::trigger::TriggerInfo;
use super::CompileFlags;
use crate::api::{CompileContext, Engine};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{Level, debug, trace};

/// Nesting level at which a branch is cut off (and compiles to `""`).
pub const MAX_RECURSION_DEPTH: usize = 12;

/// Replacement for `{CLEARFIELD}`. Backspace rather than Delete, so that the
/// sequence can never form Ctrl+Alt+Del.
pub const CLEAR_FIELD_SEQUENCE: &str = "{HOME}+({END}){BKSP}{DELAY 50}";

// --- Pass table -------------------------------------------------------------

/// One stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    FilterPre,
    Comments,
    TextTransforms,
    PickPasswordChars,
    EntryStrings,
    EntryStringsSpecial,
    PasswordEnc,
    Group,
    Paths,
    AutoType,
    DateTime,
    References,
    EnvVars,
    Base,
    NewPassword,
    HmacOtp,
    PickChars,
    FilterPost,
    AutoTypeNewLines,
}

/// Execution order of the passes.
pub(crate) const PIPELINE: [Pass; 19] = [
    Pass::FilterPre,
    Pass::Comments,
    Pass::TextTransforms,
    Pass::PickPasswordChars,
    Pass::EntryStrings,
    Pass::EntryStringsSpecial,
    Pass::PasswordEnc,
    Pass::Group,
    Pass::Paths,
    Pass::AutoType,
    Pass::DateTime,
    Pass::References,
    Pass::EnvVars,
    Pass::Base,
    Pass::NewPassword,
    Pass::HmacOtp,
    Pass::PickChars,
    Pass::FilterPost,
    Pass::AutoTypeNewLines,
];

impl Pass {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Pass::FilterPre => "filter_pre",
            Pass::Comments => "comments",
            Pass::TextTransforms => "text_transforms",
            Pass::PickPasswordChars => "pick_password_chars",
            Pass::EntryStrings => "entry_strings",
            Pass::EntryStringsSpecial => "entry_strings_special",
            Pass::PasswordEnc => "password_enc",
            Pass::Group => "group",
            Pass::Paths => "paths",
            Pass::AutoType => "auto_type",
            Pass::DateTime => "date_time",
            Pass::References => "references",
            Pass::EnvVars => "env_vars",
            Pass::Base => "base",
            Pass::NewPassword => "new_password",
            Pass::HmacOtp => "hmac_otp",
            Pass::PickChars => "pick_chars",
            Pass::FilterPost => "filter_post",
            Pass::AutoTypeNewLines => "auto_type_newlines",
        }
    }

    /// Whether the pass runs at all under `ctx` (flag bit plus bound
    /// record/store where the pass needs them).
    fn enabled(self, ctx: &CompileContext<'_>) -> bool {
        let flags = ctx.flags;
        let record = ctx.record.is_some();
        let store = ctx.store.is_some();

        match self {
            Pass::FilterPre | Pass::FilterPost => flags.runs_filters(),
            Pass::Comments => flags.contains(CompileFlags::COMMENTS),
            Pass::TextTransforms => flags.contains(CompileFlags::TEXT_TRANSFORMS),
            Pass::PickPasswordChars => record && ctx.legacy_pick_password && flags.contains(CompileFlags::PICK_CHARS),
            Pass::EntryStrings => record && flags.contains(CompileFlags::ENTRY_STRINGS),
            Pass::EntryStringsSpecial => record && flags.contains(CompileFlags::ENTRY_STRINGS_SPECIAL),
            Pass::PasswordEnc => record && flags.contains(CompileFlags::PASSWORD_ENC),
            Pass::Group => record && flags.contains(CompileFlags::GROUP),
            Pass::Paths => store && flags.contains(CompileFlags::PATHS),
            Pass::AutoType => flags.contains(CompileFlags::AUTO_TYPE),
            Pass::DateTime => flags.contains(CompileFlags::DATE_TIME),
            Pass::References => store && flags.contains(CompileFlags::REFERENCES),
            Pass::EnvVars => flags.contains(CompileFlags::ENV_VARS),
            Pass::Base => flags.contains(CompileFlags::ENV),
            Pass::NewPassword => record && store && flags.contains(CompileFlags::NEW_PASSWORD),
            Pass::HmacOtp => record && store && flags.contains(CompileFlags::HMAC_OTP),
            Pass::PickChars => record && flags.contains(CompileFlags::PICK_CHARS),
            Pass::AutoTypeNewLines => ctx.encode_as_auto_type,
        }
    }
}

// --- Compiler session -------------------------------------------------------

/// State of one top-level compile call.
///
/// The reference cache and the pick memo live here and are shared by every
/// recursive level of the call; a new `Compiler` is built for every call.
pub struct Compiler<'e> {
    pub(super) engine: &'e Engine,
    pub(super) refs: RefCell<RefCache>,
    pub(super) picked: RefCell<HashMap<String, String>>,
    metrics: Option<RefCell<RunMetrics>>,
}

impl<'e> Compiler<'e> {
    pub fn new(engine: &'e Engine, collect_metrics: bool) -> Self {
        Compiler {
            engine,
            refs: RefCell::new(RefCache::default()),
            picked: RefCell::new(HashMap::new()),
            metrics: collect_metrics.then(|| RefCell::new(RunMetrics::default())),
        }
    }

    pub fn run(&self, text: &str, ctx: &CompileContext<'_>) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.compile_internal(text, ctx, 0)
    }

    /// Consume the session, returning collected metrics and the resolved
    /// reference tokens.
    pub fn finish(self) -> (RunMetrics, Vec<(String, String)>) {
        let metrics = self.metrics.map(RefCell::into_inner).unwrap_or_default();
        (metrics, self.refs.into_inner().into_entries())
    }

    pub(super) fn compile_internal(&self, text: &str, ctx: &CompileContext<'_>, depth: usize) -> String {
        if depth >= MAX_RECURSION_DEPTH {
            debug!(depth, "recursion ceiling reached; branch compiles to an empty string");
            if let Some(metrics) = &self.metrics {
                metrics.borrow_mut().recursion_limit_hit = true;
            }
            return String::new();
        }

        if !TriggerInfo::scan(text).may_change(ctx) {
            return text.to_string();
        }

        // The pre-pass copy is only kept when someone looks at `changed`.
        let track_changes = self.metrics.is_some() || tracing::enabled!(Level::TRACE);

        let mut out = text.to_string();
        for pass in PIPELINE {
            if !pass.enabled(ctx) {
                continue;
            }

            let started = self.metrics.as_ref().map(|_| Instant::now());
            let before = track_changes.then(|| out.clone());
            out = self.run_pass(pass, out, ctx, depth);
            let changed = before.is_some_and(|before| before != out);

            if changed {
                trace!(pass = pass.name(), depth, "pass changed text");
            }
            if let (Some(metrics), Some(started)) = (&self.metrics, started) {
                metrics.borrow_mut().passes.push(PassMetrics {
                    name: pass.name(),
                    depth,
                    duration: started.elapsed(),
                    changed,
                });
            }
        }
        out
    }

    fn run_pass(&self, pass: Pass, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        match pass {
            Pass::FilterPre => self.run_filters(text, ctx, &self.engine.pre_filters),
            Pass::Comments => remove_comments(text),
            Pass::TextTransforms => self.text_transforms(text, ctx, depth),
            Pass::PickPasswordChars => self.pick_password_chars(text, ctx, depth),
            Pass::EntryStrings => self.entry_strings(text, ctx, depth),
            Pass::EntryStringsSpecial => self.entry_strings_special(text, ctx, depth),
            Pass::PasswordEnc => self.password_enc(text, ctx, depth),
            Pass::Group => self.group(text, ctx, depth),
            Pass::Paths => self.paths(text, ctx, depth),
            Pass::AutoType => replace_ci(&text, "{CLEARFIELD}", CLEAR_FIELD_SEQUENCE),
            Pass::DateTime => self.date_time(text, ctx, depth),
            Pass::References => self.references(text, ctx, depth),
            Pass::EnvVars => self.env_vars(text, ctx, depth),
            Pass::Base => self.base(text, ctx, depth),
            Pass::NewPassword => self.new_password(text, ctx, depth),
            Pass::HmacOtp => self.hmac_otp(text, ctx),
            Pass::PickChars => self.pick_chars(text, ctx, depth),
            Pass::FilterPost => self.run_filters(text, ctx, &self.engine.post_filters),
            Pass::AutoTypeNewLines => normalize_new_lines(&text).replace('\n', "{ENTER}"),
        }
    }

    fn run_filters(
        &self,
        text: String,
        ctx: &CompileContext<'_>,
        filters: &[Box<dyn crate::services::CompileFilter>],
    ) -> String {
        filters.iter().fold(text, |acc, filter| filter.filter(acc, ctx))
    }

    /// `%NAME%` substitution; skipped entirely when the text has no `%`.
    fn env_vars(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        if !text.contains('%') {
            return text;
        }

        let mut text = text;
        for (name, value) in self.engine.env.vars() {
            if name.is_empty() {
                continue;
            }
            text = self.fill_if_exists(text, &format!("%{name}%"), &value, ctx, depth);
        }
        text
    }
}

/// Strip `{C:...}` comments: each runs up to the first following `}`.
fn remove_comments(text: String) -> String {
    let mut text = text;
    while let Some(m) = regex!(r"(?is)\{C:.*?\}").find(&text) {
        let range = m.range();
        text.replace_range(range, "");
    }
    text
}
