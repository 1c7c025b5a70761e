//! Placeholder family flags.
//!
//! Every pass of the pipeline is gated by one bit of [`CompileFlags`]. Callers
//! pick the families they want: a title shown in a list typically compiles
//! with [`CompileFlags::deref`] only, while auto-type uses everything.
//!
//! ## Composite masks
//!
//! The composites (`active`, `non_active`, `state_changing`, ...) are *not*
//! flag constants. They are computed from their constituents on every call so
//! that adding or removing a family never leaves a stale composite behind.

bitflags::bitflags! {
    /// Enabled placeholder families.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompileFlags: u32 {
        /// `{PICKCHARS}` (and, when enabled on the context, `{PICKPASSWORDCHARS}`).
        const PICK_CHARS            = 1 << 0;
        /// `{TITLE}`, `{USERNAME}`, ..., `{S:Custom}`.
        const ENTRY_STRINGS         = 1 << 1;
        /// `{URL:HOST}`, `{URL:RMVSCM}`, ...
        const ENTRY_STRINGS_SPECIAL = 1 << 2;
        /// `{PASSWORD_ENC}`.
        const PASSWORD_ENC          = 1 << 3;
        /// `{GROUP}`, `{GROUPPATH}`.
        const GROUP                 = 1 << 4;
        /// `{DB_PATH}`, `{DB_DIR}`, `{DOCDIR}`, ...
        const PATHS                 = 1 << 5;
        /// `{CLEARFIELD}`.
        const AUTO_TYPE             = 1 << 6;
        /// `{DT_SIMPLE}`, `{DT_UTC_YEAR}`, ...
        const DATE_TIME             = 1 << 7;
        /// `{REF:...}`.
        const REFERENCES            = 1 << 8;
        /// `%NAME%`.
        const ENV_VARS              = 1 << 9;
        /// `{NEWPASSWORD}`.
        const NEW_PASSWORD          = 1 << 10;
        /// `{HMACOTP}`.
        const HMAC_OTP              = 1 << 11;
        /// `{C:...}` comments.
        const COMMENTS              = 1 << 12;
        /// Active transformations provided by filters.
        const EXT_ACTIVE            = 1 << 13;
        /// Non-active transformations provided by filters.
        const EXT_NON_ACTIVE        = 1 << 14;
        /// `{T-REPLACE-RX:...}`, `{T-CONV:...}`.
        const TEXT_TRANSFORMS       = 1 << 15;
        /// `{BASE}` and its components.
        const ENV                   = 1 << 16;
    }
}

impl CompileFlags {
    /// Families that need user interaction.
    pub const fn ui_interactive() -> Self {
        Self::PICK_CHARS
    }

    /// Families that mutate the record or store.
    pub const fn state_changing() -> Self {
        Self::NEW_PASSWORD.union(Self::HMAC_OTP)
    }

    /// Families that interact with the user or change state.
    pub const fn active() -> Self {
        Self::ui_interactive().union(Self::state_changing()).union(Self::EXT_ACTIVE)
    }

    /// Everything that is safe to run for display purposes.
    pub const fn non_active() -> Self {
        Self::all().difference(Self::active())
    }

    /// Field dereferencing only.
    pub const fn deref() -> Self {
        Self::ENTRY_STRINGS.union(Self::ENTRY_STRINGS_SPECIAL).union(Self::REFERENCES)
    }

    /// Whether plugin filters should run at all.
    pub const fn runs_filters(self) -> bool {
        self.intersects(Self::EXT_ACTIVE.union(Self::EXT_NON_ACTIVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_partition_all() {
        assert_eq!(CompileFlags::active() | CompileFlags::non_active(), CompileFlags::all());
        assert!((CompileFlags::active() & CompileFlags::non_active()).is_empty());
    }

    #[test]
    fn active_contains_constituents() {
        let active = CompileFlags::active();
        assert!(active.contains(CompileFlags::PICK_CHARS));
        assert!(active.contains(CompileFlags::HMAC_OTP | CompileFlags::NEW_PASSWORD));
        assert!(active.contains(CompileFlags::EXT_ACTIVE));
        assert!(!active.contains(CompileFlags::EXT_NON_ACTIVE));
    }

    #[test]
    fn deref_is_field_and_reference_families() {
        let deref = CompileFlags::deref();
        assert!(deref.contains(CompileFlags::ENTRY_STRINGS | CompileFlags::ENTRY_STRINGS_SPECIAL));
        assert!(deref.contains(CompileFlags::REFERENCES));
        assert!(!deref.contains(CompileFlags::ENV_VARS));
    }

    #[test]
    fn filters_need_an_extension_bit() {
        assert!(CompileFlags::all().runs_filters());
        assert!(CompileFlags::EXT_NON_ACTIVE.runs_filters());
        assert!(!CompileFlags::deref().runs_filters());
    }
}
