use crate::engine::{CompileFlags, Compiler, RunMetrics};
use crate::record::{Record, RecordStore};
use crate::services::{
    CharPicker, Clock, CompileFilter, EnvSource, NoPicker, PasswordGenerator, ProcessEnv, StringProtector, SystemClock,
};
use std::time::{Duration, Instant};

/// Per-call compilation context.
///
/// Holds everything that varies between compile calls: which record and store
/// the text belongs to, which placeholder families are enabled and how
/// resolved values are encoded. It is `Copy`; recursive sub-compiles work on
/// modified copies (see [`CompileContext::without_content_transforms`]).
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    /// Record whose fields back `{TITLE}`, `{S:...}`, `{HMACOTP}`, ...
    pub record: Option<&'a dyn Record>,
    /// Store used for `{REF:...}`, `{DB_*}` and to flag modifications.
    pub store: Option<&'a dyn RecordStore>,
    /// Replacement for the `{BASE...}` family.
    pub base: Option<&'a str>,
    /// Whether `base` has already been encoded for the output target.
    pub base_is_encoded: bool,
    /// Escape resolved values as an auto-type keystroke sequence.
    pub encode_as_auto_type: bool,
    /// Triple double quotes in resolved values (command-line arguments).
    pub encode_quotes_for_command_line: bool,
    /// When false, password placeholders resolve to [`crate::HIDDEN_PASSWORD`].
    pub force_plaintext_passwords: bool,
    /// Enabled placeholder families.
    pub flags: CompileFlags,
    /// Enable the deprecated `{PICKPASSWORDCHARS}` placeholder.
    pub legacy_pick_password: bool,
}

impl<'a> CompileContext<'a> {
    pub fn new(record: Option<&'a dyn Record>, store: Option<&'a dyn RecordStore>, flags: CompileFlags) -> Self {
        CompileContext { record, store, flags, ..Self::default() }
    }

    /// Context for a record that lives in `store`, with all placeholder families enabled.
    pub fn for_record(record: &'a dyn Record, store: &'a dyn RecordStore) -> Self {
        Self::new(Some(record), Some(store), CompileFlags::all())
    }

    pub fn with_flags(mut self, flags: CompileFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_record(mut self, record: &'a dyn Record) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_base(mut self, base: &'a str, is_encoded: bool) -> Self {
        self.base = Some(base);
        self.base_is_encoded = is_encoded;
        self
    }

    pub fn encode_as_auto_type(mut self, enabled: bool) -> Self {
        self.encode_as_auto_type = enabled;
        self
    }

    pub fn encode_quotes_for_command_line(mut self, enabled: bool) -> Self {
        self.encode_quotes_for_command_line = enabled;
        self
    }

    pub fn force_plaintext_passwords(mut self, enabled: bool) -> Self {
        self.force_plaintext_passwords = enabled;
        self
    }

    pub fn legacy_pick_password(mut self, enabled: bool) -> Self {
        self.legacy_pick_password = enabled;
        self
    }

    /// Copy with both output encoders switched off. Every recursive compile
    /// runs on such a copy so that content is encoded exactly once, when it is
    /// inserted into the outermost string.
    pub fn without_content_transforms(self) -> Self {
        CompileContext { encode_as_auto_type: false, encode_quotes_for_command_line: false, ..self }
    }
}

impl Default for CompileContext<'_> {
    fn default() -> Self {
        CompileContext {
            record: None,
            store: None,
            base: None,
            base_is_encoded: false,
            encode_as_auto_type: false,
            encode_quotes_for_command_line: false,
            force_plaintext_passwords: true,
            flags: CompileFlags::all(),
            legacy_pick_password: false,
        }
    }
}

impl std::fmt::Debug for CompileContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileContext")
            .field("record", &self.record.map(|r| r.uuid_hex()))
            .field("store", &self.store.map(|s| s.location()))
            .field("base", &self.base)
            .field("base_is_encoded", &self.base_is_encoded)
            .field("encode_as_auto_type", &self.encode_as_auto_type)
            .field("encode_quotes_for_command_line", &self.encode_quotes_for_command_line)
            .field("force_plaintext_passwords", &self.force_plaintext_passwords)
            .field("flags", &self.flags)
            .field("legacy_pick_password", &self.legacy_pick_password)
            .finish()
    }
}

/// The compilation engine: injected capabilities plus plugin filters.
///
/// An `Engine` is cheap to build and holds no per-call state; every
/// [`Engine::compile`] call gets a fresh reference cache.
pub struct Engine {
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) env: Box<dyn EnvSource>,
    pub(crate) picker: Box<dyn CharPicker>,
    pub(crate) protector: Option<Box<dyn StringProtector>>,
    pub(crate) generator: Option<Box<dyn PasswordGenerator>>,
    pub(crate) pre_filters: Vec<Box<dyn CompileFilter>>,
    pub(crate) post_filters: Vec<Box<dyn CompileFilter>>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            clock: Box::new(SystemClock),
            env: Box::new(ProcessEnv),
            picker: Box::new(NoPicker),
            protector: None,
            generator: None,
            pre_filters: Vec::new(),
            post_filters: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("clock", &"<clock>")
            .field("env", &"<env>")
            .field("picker", &"<picker>")
            .field("protector", &self.protector.is_some())
            .field("generator", &self.generator.is_some())
            .field("pre_filters", &self.pre_filters.len())
            .field("post_filters", &self.post_filters.len())
            .finish()
    }
}

impl Engine {
    /// Engine with the system clock, the process environment, a picker that
    /// picks nothing and no protector/generator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn with_picker(mut self, picker: impl CharPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn with_protector(mut self, protector: impl StringProtector + 'static) -> Self {
        self.protector = Some(Box::new(protector));
        self
    }

    pub fn with_generator(mut self, generator: impl PasswordGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Append a filter that runs before the built-in passes.
    pub fn with_pre_filter(mut self, filter: impl CompileFilter + 'static) -> Self {
        self.pre_filters.push(Box::new(filter));
        self
    }

    /// Append a filter that runs after the built-in passes.
    pub fn with_post_filter(mut self, filter: impl CompileFilter + 'static) -> Self {
        self.post_filters.push(Box::new(filter));
        self
    }

    /// Compile `text` against `ctx`.
    ///
    /// Never fails: malformed placeholders are dropped or left verbatim, and a
    /// placeholder cycle resolves to an empty string once the recursion
    /// ceiling is reached. May mutate the context's record (`{HMACOTP}`,
    /// `{NEWPASSWORD}`) and flag its store as modified.
    pub fn compile(&self, text: &str, ctx: &CompileContext<'_>) -> String {
        Compiler::new(self, false).run(text, ctx)
    }

    /// Like [`Engine::compile`], but also returns a per-pass trace.
    pub fn compile_verbose(&self, text: &str, ctx: &CompileContext<'_>) -> CompileResultVerbose {
        let started = Instant::now();
        let compiler = Compiler::new(self, true);
        let output = compiler.run(text, ctx);
        let elapsed = started.elapsed();

        let (metrics, references) = compiler.finish();
        let details = CompileDetails::from_metrics(elapsed, metrics, references);

        CompileResultVerbose { text: output, elapsed, details }
    }
}

/// One executed pass, as reported by [`Engine::compile_verbose`].
#[derive(Debug, Clone)]
pub struct PassTrace {
    pub pass: &'static str,
    /// Recursion level the pass ran at (0 = the caller's text).
    pub depth: usize,
    pub duration: Duration,
    /// Whether the pass changed the working string.
    pub changed: bool,
}

/// Extra information collected by [`Engine::compile_verbose`].
#[derive(Debug, Clone, Default)]
pub struct CompileDetails {
    pub total: Duration,
    pub passes: Vec<PassTrace>,
    /// Resolved `{REF:...}` tokens, in resolution order.
    pub references: Vec<(String, String)>,
    /// Whether some branch hit the recursion ceiling.
    pub recursion_limit_hit: bool,
}

impl CompileDetails {
    fn from_metrics(total: Duration, metrics: RunMetrics, references: Vec<(String, String)>) -> Self {
        let passes = metrics
            .passes
            .into_iter()
            .map(|p| PassTrace { pass: p.name, depth: p.depth, duration: p.duration, changed: p.changed })
            .collect();

        CompileDetails { total, passes, references, recursion_limit_hit: metrics.recursion_limit_hit }
    }
}

/// Result of [`Engine::compile_verbose`].
#[derive(Debug, Clone)]
pub struct CompileResultVerbose {
    pub text: String,
    pub elapsed: Duration,
    pub details: CompileDetails,
}

/// Compile `text` with a default [`Engine`].
///
/// # Example
/// ```
/// use sprengine::{CompileContext, compile};
///
/// let out = compile("{T-CONV:/hello/upper/}", &CompileContext::default());
/// assert_eq!(out, "HELLO");
/// ```
pub fn compile(text: &str, ctx: &CompileContext<'_>) -> String {
    Engine::default().compile(text, ctx)
}

/// Compile `text` with a default [`Engine`] and return the per-pass trace.
pub fn compile_verbose(text: &str, ctx: &CompileContext<'_>) -> CompileResultVerbose {
    Engine::default().compile_verbose(text, ctx)
}
