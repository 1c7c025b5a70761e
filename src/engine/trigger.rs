//! Trigger scanning (input pre-classification).
//!
//! Before running the pipeline the compiler looks at the raw text once. Every
//! placeholder family starts with `{`, environment variables need `%`, and
//! the auto-type newline pass needs a line break. Text with none of those can
//! only be changed by plugin filters, so it is returned untouched.
//!
//! The scan is a heuristic gate: a hit says "some pass *may* apply", never that
//! one will.

use super::flags::CompileFlags;
use crate::api::CompileContext;

bitflags::bitflags! {
    /// Coarse features of a working string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TriggerMask: u8 {
        const HAS_BRACE      = 1 << 0;
        const HAS_PERCENT    = 1 << 1;
        const HAS_LINE_BREAK = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerInfo {
    pub mask: TriggerMask,
}

impl TriggerInfo {
    pub fn scan(input: &str) -> Self {
        let mut mask = TriggerMask::empty();
        for b in input.bytes() {
            match b {
                b'{' => mask |= TriggerMask::HAS_BRACE,
                b'%' => mask |= TriggerMask::HAS_PERCENT,
                b'\r' | b'\n' => mask |= TriggerMask::HAS_LINE_BREAK,
                _ => {}
            }
        }
        TriggerInfo { mask }
    }

    /// Whether any pass could change the text under `ctx`.
    pub fn may_change(&self, ctx: &CompileContext<'_>) -> bool {
        if ctx.flags.runs_filters() {
            return true;
        }
        if self.mask.contains(TriggerMask::HAS_BRACE) {
            return true;
        }
        if self.mask.contains(TriggerMask::HAS_PERCENT) && ctx.flags.contains(CompileFlags::ENV_VARS) {
            return true;
        }
        self.mask.contains(TriggerMask::HAS_LINE_BREAK) && ctx.encode_as_auto_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_detects_each_trigger() {
        assert_eq!(TriggerInfo::scan("plain").mask, TriggerMask::empty());
        assert_eq!(TriggerInfo::scan("{X}").mask, TriggerMask::HAS_BRACE);
        assert_eq!(TriggerInfo::scan("50%\r\n").mask, TriggerMask::HAS_PERCENT | TriggerMask::HAS_LINE_BREAK);
    }

    #[test]
    fn line_breaks_only_matter_for_auto_type() {
        let ctx = CompileContext::default().with_flags(CompileFlags::deref());
        let info = TriggerInfo::scan("a\nb");
        assert!(!info.may_change(&ctx));
        assert!(info.may_change(&ctx.encode_as_auto_type(true)));
    }

    #[test]
    fn percent_needs_env_vars_flag() {
        let info = TriggerInfo::scan("100%");
        assert!(!info.may_change(&CompileContext::default().with_flags(CompileFlags::deref())));
        assert!(info.may_change(&CompileContext::default().with_flags(CompileFlags::ENV_VARS)));
    }
}
