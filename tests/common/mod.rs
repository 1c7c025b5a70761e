#![allow(dead_code)]

use chrono::NaiveDate;
use sprengine::{CharPicker, FixedClock, PickRequest, SprError, StringProtector, Timestamp};
use std::cell::RefCell;
use std::rc::Rc;

/// RFC 4226 appendix D secret.
pub const RFC_SECRET: &str = "12345678901234567890";

/// 2024-03-09 14:05:07 local, 13:05:07 UTC.
pub fn fixed_clock() -> FixedClock {
    let local = NaiveDate::from_ymd_opt(2024, 3, 9).and_then(|d| d.and_hms_opt(14, 5, 7)).unwrap();
    let utc = NaiveDate::from_ymd_opt(2024, 3, 9).and_then(|d| d.and_hms_opt(13, 5, 7)).unwrap();
    FixedClock(Timestamp { local, utc })
}

/// Picks the first `count` characters (all of them for `count == 0`) and
/// records every request it sees.
#[derive(Clone, Default)]
pub struct FirstChars {
    pub requests: Rc<RefCell<Vec<(String, usize, Option<bool>)>>>,
}

impl CharPicker for FirstChars {
    fn pick(&self, request: &PickRequest<'_>) -> String {
        self.requests.borrow_mut().push((request.text.to_string(), request.count, request.initially_hidden));
        let take = if request.count == 0 { usize::MAX } else { request.count };
        request.text.chars().take(take).collect()
    }
}

/// "Encrypts" by reversing the text; fails on empty input.
pub struct Reverse;

impl StringProtector for Reverse {
    fn encrypt(&self, plain: &str) -> sprengine::Result<String> {
        if plain.is_empty() {
            return Err(SprError::capability("string protector", "nothing to encrypt"));
        }
        Ok(plain.chars().rev().collect())
    }
}
