mod common;

use common::{FirstChars, RFC_SECRET};
use pretty_assertions::assert_eq;
use sprengine::{
    CompileContext, CompileFlags, Engine, HMAC_OTP_COUNTER_FIELD, HMAC_OTP_SECRET_BASE32_FIELD,
    HMAC_OTP_SECRET_FIELD, MemoryRecord, MemoryStore, PasswordGenerator, Record,
};

#[test]
fn hmac_otp_increments_and_persists_the_counter() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field(HMAC_OTP_SECRET_FIELD, RFC_SECRET));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let engine = Engine::new();

    let codes: Vec<String> = (0..3).map(|_| engine.compile("{HMACOTP}", &ctx)).collect();
    assert_eq!(codes, vec!["755224", "287082", "359152"]);
    assert_eq!(record.get(HMAC_OTP_COUNTER_FIELD).as_deref(), Some("3"));
    assert!(store.is_modified());
}

#[test]
fn one_code_per_compile() {
    let mut store = MemoryStore::new("");
    let idx = store.add(
        MemoryRecord::new()
            .field(HMAC_OTP_SECRET_BASE32_FIELD, "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ")
            .field(HMAC_OTP_COUNTER_FIELD, "9"),
    );
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);

    assert_eq!(Engine::new().compile("{HMACOTP} {hmacotp}", &ctx), "520489 520489");
    assert_eq!(record.get(HMAC_OTP_COUNTER_FIELD).as_deref(), Some("10"));
}

#[test]
fn display_flags_leave_state_alone() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field(HMAC_OTP_SECRET_FIELD, RFC_SECRET));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store).with_flags(CompileFlags::non_active());

    assert_eq!(Engine::new().compile("{HMACOTP}", &ctx), "{HMACOTP}");
    assert_eq!(record.get(HMAC_OTP_COUNTER_FIELD), None);
    assert!(!store.is_modified());
}

struct Fixed(&'static str);

impl PasswordGenerator for Fixed {
    fn generate(&self, profile: Option<&str>) -> sprengine::Result<String> {
        Ok(match profile {
            Some(profile) => format!("{}-{profile}", self.0),
            None => self.0.to_string(),
        })
    }
}

#[test]
fn new_password_replaces_the_record_password() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "old"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store).encode_as_auto_type(true);

    let out = Engine::new().with_generator(Fixed("n+w")).compile("{PASSWORD}{TAB}{NEWPASSWORD}", &ctx);
    assert_eq!(out, "old{TAB}n{+}w");
    assert_eq!(record.get("Password").as_deref(), Some("n+w"));
    assert_eq!(record.history().len(), 1);
    assert!(store.is_modified());
}

#[test]
fn new_password_profile_is_compiled() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Profile", "Pin"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);

    let out = Engine::new().with_generator(Fixed("x")).compile("{NEWPASSWORD:/{S:Profile}/}", &ctx);
    assert_eq!(out, "x-Pin");
}

#[test]
fn pick_chars_from_the_password() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "secret"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let picker = FirstChars::default();

    let out = Engine::new().with_picker(picker.clone()).compile("[{PICKCHARS}]", &ctx);
    assert_eq!(out, "[secret]");
    assert_eq!(picker.requests.borrow().as_slice(), &[("secret".to_string(), 0, None)]);
}

#[test]
fn pick_chars_with_options_and_memo() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "secret").field("Pin", "1234"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let picker = FirstChars::default();
    let engine = Engine::new().with_picker(picker.clone());

    let out = engine.compile("{PICKCHARS:Pin:c=2,id=p,hide=false}-{PICKCHARS:Password:id=p,conv=d}", &ctx);
    assert_eq!(out, "12-{DOWN}{DOWN}{DOWN}");
    assert_eq!(picker.requests.borrow().as_slice(), &[("1234".to_string(), 2, Some(false))]);

    // The memo does not outlive the call.
    let out = engine.compile("{PICKCHARS:Password:id=p}", &ctx);
    assert_eq!(out, "secret");
    assert_eq!(picker.requests.borrow().len(), 2);
}

#[test]
fn pick_chars_edge_cases() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "pw"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let picker = FirstChars::default();
    let engine = Engine::new().with_picker(picker.clone());

    assert_eq!(engine.compile("[{PICKCHARS:Missing}]", &ctx), "[]");
    assert_eq!(engine.compile("[{PICKCHARSX}]", &ctx), "[]");
    assert_eq!(engine.compile("a{PICKCHARS", &ctx), "a{PICKCHARS");
    assert!(picker.requests.borrow().is_empty());
}

#[test]
fn huge_down_arrow_offset_is_clamped() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "b"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let engine = Engine::new().with_picker(FirstChars::default());

    let out = engine.compile("{PICKCHARS:Password:conv=d,conv-offset=9223372036854775807}", &ctx);
    assert_eq!(out, "{DOWN}".repeat(256));
    let out = engine.compile("{PICKCHARS:Password:conv=d,conv-offset=-99}", &ctx);
    assert_eq!(out, "");
}

#[test]
fn legacy_pick_needs_opt_in() {
    let mut store = MemoryStore::new("");
    let idx = store.add(MemoryRecord::new().field("Password", "secret"));
    let record = store.record(idx);
    let ctx = CompileContext::for_record(record, &store);
    let engine = Engine::new().with_picker(FirstChars::default());

    assert_eq!(engine.compile("{PICKPASSWORDCHARS:3}", &ctx), "{PICKPASSWORDCHARS:3}");
    assert_eq!(engine.compile("{PICKPASSWORDCHARS:3}", &ctx.legacy_pick_password(true)), "sec");
    assert_eq!(engine.compile("{PICKPASSWORDCHARS}", &ctx.legacy_pick_password(true)), "secret");
}
