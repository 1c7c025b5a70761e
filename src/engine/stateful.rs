//! Placeholders that change the record: `{NEWPASSWORD}` and `{HMACOTP}`.
//!
//! Both need a record and a store. Whenever they fire, the store is flagged
//! as modified, even when the compiled text is thrown away afterwards.

use super::encoding::transform_content;
use super::fill::fill_placeholder;
use super::otp::{COUNTER_FIELD, OTP_DIGITS, hotp, read_counter, read_secret};
use super::pipeline::Compiler;
use super::text::contains_ci;
use crate::api::CompileContext;
use crate::record::PASSWORD_FIELD;
use once_cell::unsync::OnceCell;
use tracing::debug;

const NEW_PASSWORD_START: &str = "{NEWPASSWORD";
const NEW_PASSWORD_WITH_PROFILE: &str = "{NEWPASSWORD:";
const NEW_PASSWORD: &str = "{NEWPASSWORD}";
const HMAC_OTP: &str = "{HMACOTP}";

impl Compiler<'_> {
    /// `{NEWPASSWORD}` / `{NEWPASSWORD:/profile/}`.
    ///
    /// One password is generated per pass (with the profile of the first
    /// token that needs it) and substituted for every token. It then becomes
    /// the record's password, after a backup.
    pub(super) fn new_password(&self, text: String, ctx: &CompileContext<'_>, depth: usize) -> String {
        let (Some(record), Some(store)) = (ctx.record, ctx.store) else {
            return text;
        };
        if !contains_ci(&text, NEW_PASSWORD_START) {
            return text;
        }

        let generated: OnceCell<Option<String>> = OnceCell::new();
        let mut text = text;

        while let Some(found) = self.take_placeholder(&mut text, NEW_PASSWORD_WITH_PROFILE, ctx, depth) {
            let profile = found.params.first().map(String::as_str).filter(|p| !p.is_empty());
            let password = generated.get_or_init(|| self.generate_password(profile));
            text.insert_str(found.start, &transform_content(password.as_deref().unwrap_or_default(), ctx));
        }

        if contains_ci(&text, NEW_PASSWORD) {
            let password = generated.get_or_init(|| self.generate_password(None));
            text = fill_placeholder(&text, NEW_PASSWORD, password.as_deref().unwrap_or_default(), ctx);
        }

        if let Some(Some(password)) = generated.into_inner() {
            record.create_backup();
            record.set(PASSWORD_FIELD, password);
            record.touch();
            store.set_modified();
        }
        text
    }

    fn generate_password(&self, profile: Option<&str>) -> Option<String> {
        let Some(generator) = &self.engine.generator else {
            debug!("no password generator configured");
            return None;
        };
        generator
            .generate(profile)
            .inspect_err(|err| debug!(?profile, error = %err, "password generation failed"))
            .ok()
    }

    /// `{HMACOTP}`: the code for the stored counter; the counter is then
    /// incremented and written back.
    pub(super) fn hmac_otp(&self, text: String, ctx: &CompileContext<'_>) -> String {
        let (Some(record), Some(store)) = (ctx.record, ctx.store) else {
            return text;
        };
        if !contains_ci(&text, HMAC_OTP) {
            return text;
        }

        let counter = read_counter(record);
        let code = hotp(&read_secret(record), counter, OTP_DIGITS);

        record.set(COUNTER_FIELD, counter.saturating_add(1).to_string());
        store.set_modified();

        fill_placeholder(&text, HMAC_OTP, &code, ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{CompileContext, Engine};
    use crate::error::{Result, SprError};
    use crate::memory::{MemoryRecord, MemoryStore};
    use crate::record::{PASSWORD_FIELD, Record};
    use crate::services::PasswordGenerator;
    use std::cell::Cell;

    struct Counting(Cell<usize>);

    impl PasswordGenerator for Counting {
        fn generate(&self, profile: Option<&str>) -> Result<String> {
            self.0.set(self.0.get() + 1);
            Ok(format!("gen{}-{}", self.0.get(), profile.unwrap_or("default")))
        }
    }

    struct Failing;

    impl PasswordGenerator for Failing {
        fn generate(&self, _profile: Option<&str>) -> Result<String> {
            Err(SprError::capability("password generator", "entropy pool empty"))
        }
    }

    #[test]
    fn one_password_per_pass_and_it_is_stored() {
        let mut store = MemoryStore::new("db.kdbx");
        let idx = store.add(MemoryRecord::new().field(PASSWORD_FIELD, "old"));
        let record = store.record(idx);
        let ctx = CompileContext::for_record(record, &store);

        let engine = Engine::new().with_generator(Counting(Cell::new(0)));
        let out = engine.compile("{NEWPASSWORD:/Strong/}|{newpassword}|{NEWPASSWORD:/Other/}", &ctx);

        assert_eq!(out, "gen1-Strong|gen1-Strong|gen1-Strong");
        assert_eq!(record.get(PASSWORD_FIELD).as_deref(), Some("gen1-Strong"));
        assert_eq!(record.history().len(), 1);
        assert_eq!(record.touch_count(), 1);
        assert!(store.is_modified());
    }

    #[test]
    fn failing_or_missing_generator_changes_nothing() {
        for engine in [Engine::new().with_generator(Failing), Engine::new()] {
            let mut store = MemoryStore::new("db.kdbx");
            let idx = store.add(MemoryRecord::new().field(PASSWORD_FIELD, "old"));
            let record = store.record(idx);

            let out = engine.compile("[{NEWPASSWORD}]", &CompileContext::for_record(record, &store));
            assert_eq!(out, "[]");
            assert_eq!(record.get(PASSWORD_FIELD).as_deref(), Some("old"));
            assert!(record.history().is_empty());
            assert!(!store.is_modified());
        }
    }

    #[test]
    fn hmac_otp_needs_a_store() {
        let record = MemoryRecord::new();
        let ctx = CompileContext::default().with_record(&record);
        assert_eq!(Engine::new().compile("{HMACOTP}", &ctx), "{HMACOTP}");
    }
}
