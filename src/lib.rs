//! Placeholder compilation for password-manager records.
//!
//! Record fields may contain placeholders such as `{USERNAME}`, `{URL:HOST}`,
//! `{REF:P@I:<uuid>}`, `{HMACOTP}` or `{T-CONV:/text/upper/}`. [`Engine::compile`]
//! expands them recursively against a [`CompileContext`] and optionally encodes
//! the result as an auto-type keystroke sequence or for a command line.
//!
//! ```
//! use sprengine::{CompileContext, Engine, MemoryRecord, MemoryStore};
//!
//! let mut store = MemoryStore::new("/home/me/vault.kdbx");
//! let idx = store.add(MemoryRecord::new().field("UserName", "me").field("URL", "https://mail.example.com/"));
//! let record = store.record(idx);
//!
//! let ctx = CompileContext::for_record(record, &store);
//! let out = Engine::new().compile("{USERNAME}@{URL:HOST} ({DB_NAME})", &ctx);
//! assert_eq!(out, "me@mail.example.com (vault.kdbx)");
//! ```
//!
//! Records, stores and the outside world (clock, environment, interactive
//! pick dialog, encryption, password generation) are reached through the
//! traits in [`record`] and [`services`]; [`MemoryRecord`] / [`MemoryStore`]
//! are in-memory implementations.

extern crate self as sprengine;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod memory;
pub mod record;
pub mod services;

pub use api::{CompileContext, CompileDetails, CompileResultVerbose, Engine, PassTrace, compile, compile_verbose};
pub use engine::{
    CLEAR_FIELD_SEQUENCE, CompileFlags, HMAC_OTP_COUNTER_FIELD, HMAC_OTP_SECRET_BASE32_FIELD,
    HMAC_OTP_SECRET_BASE64_FIELD, HMAC_OTP_SECRET_FIELD, HMAC_OTP_SECRET_HEX_FIELD, MAX_RECURSION_DEPTH,
    MAX_REF_ITERATIONS, make_auto_type_sequence, make_command_quotes,
};
pub use error::{Result, SprError};
pub use memory::{MemoryRecord, MemoryStore};
pub use record::{CUSTOM_FIELD_PREFIX, HIDDEN_PASSWORD, Record, RecordStore, SearchField, is_standard_field};
pub use services::{
    CharPicker, Clock, CompileFilter, EnvSource, FixedClock, NoPicker, PasswordGenerator, PickRequest, ProcessEnv,
    StaticEnv, StringProtector, SystemClock, Timestamp,
};
