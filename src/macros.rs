/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Used for the fixed patterns of the pipeline (comment spans).
/// User supplied patterns (`{T-REPLACE-RX:...}`) are compiled per use instead.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
