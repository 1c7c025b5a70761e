//! Placeholder compilation engine.
//!
//! This module is the entry point for everything behind [`crate::Engine::compile`].
//! The work is split into focused submodules under `src/engine/`; the public
//! paths stay flat (`crate::engine::Compiler`, `crate::engine::CompileFlags`).
//!
//! ## How the parts work together
//!
//! Compiling a string is a fixed sequence of passes, each a `String -> String`
//! step gated by one [`CompileFlags`] bit:
//!
//! ```text
//! input ── TriggerInfo::scan ──(no '{', '%', line break)──> returned as is
//!          (trigger.rs)     │
//!                           v
//!               Compiler::compile_internal (pipeline.rs)
//!                 filter_pre
//!                 comments, text_transforms        (transforms.rs, scanner.rs)
//!                 pick_password_chars              (pick.rs)
//!                 entry_strings, entry_strings_special,
//!                 password_enc, group, paths       (fill.rs)
//!                 auto_type ({CLEARFIELD}), date_time
//!                 references                       (refs.rs)
//!                 env_vars, base
//!                 new_password, hmac_otp           (stateful.rs, otp.rs)
//!                 pick_chars                       (pick.rs)
//!                 filter_post, auto_type_newlines
//!                           │
//!                           v
//!                        String
//! ```
//!
//! Most passes resolve a token by compiling some raw value *recursively*: one
//! level deeper, with both output encoders switched off. The value is encoded
//! once (`encoding.rs`) when it is spliced into the string of its own level.
//! At [`MAX_RECURSION_DEPTH`] a branch compiles to the empty string, which is
//! what stops self-referencing fields.
//!
//! ## Per-call state
//!
//! A [`Compiler`] exists for exactly one top-level call. It owns the reference
//! cache (`{REF:...}` token -> resolved value, first write wins), the
//! `{PICKCHARS}` memo keyed by `id` and, for verbose runs, the
//! [`RunMetrics`]. Recursive levels borrow it; nothing survives the call.
//!
//! ## Adding a placeholder family
//!
//! - Add a flag bit in `flags.rs` (and to a composite if it is active).
//! - Add a `Pass` variant, its name and gate in `pipeline.rs`, and put it
//!   into `PIPELINE` at the right position.
//! - Implement the pass as a `Compiler` method; use `fill_if_exists` for plain
//!   token -> value mappings and `take_placeholder` for `{X:/a/b/}` syntax.
//!
//! ## Debugging
//!
//! Recursion cut-offs, dropped tokens and collaborator failures are logged
//! through `tracing` at `debug`; per-pass changes at `trace`. The `spr` binary
//! reads its filter from `SPR_LOG`.

#[path = "engine/encoding.rs"]
mod encoding;
#[path = "engine/fill.rs"]
mod fill;
#[path = "engine/flags.rs"]
mod flags;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/otp.rs"]
mod otp;
#[path = "engine/pick.rs"]
mod pick;
#[path = "engine/pipeline.rs"]
mod pipeline;
#[path = "engine/refs.rs"]
mod refs;
#[path = "engine/scanner.rs"]
mod scanner;
#[path = "engine/stateful.rs"]
mod stateful;
#[path = "engine/text.rs"]
mod text;
#[path = "engine/transforms.rs"]
mod transforms;
#[path = "engine/trigger.rs"]
mod trigger;

pub use encoding::{make_auto_type_sequence, make_command_quotes};
pub use flags::CompileFlags;
pub use metrics::RunMetrics;
pub use otp::{
    COUNTER_FIELD as HMAC_OTP_COUNTER_FIELD, SECRET_BASE32_FIELD as HMAC_OTP_SECRET_BASE32_FIELD,
    SECRET_BASE64_FIELD as HMAC_OTP_SECRET_BASE64_FIELD, SECRET_HEX_FIELD as HMAC_OTP_SECRET_HEX_FIELD,
    SECRET_UTF8_FIELD as HMAC_OTP_SECRET_FIELD,
};
pub use pipeline::{CLEAR_FIELD_SEQUENCE, Compiler, MAX_RECURSION_DEPTH};
pub use refs::MAX_REF_ITERATIONS;
