//! In-memory collaborators.
//!
//! [`MemoryRecord`] and [`MemoryStore`] are small reference implementations of
//! [`Record`] / [`RecordStore`]. They back the `spr` debug binary and the test
//! suite, and are a reasonable starting point for embedders whose entries
//! already live in memory.

use crate::record::{Record, RecordStore, SearchField, is_standard_field};
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// A record holding its fields in insertion order.
#[derive(Debug)]
pub struct MemoryRecord {
    uuid: Uuid,
    fields: RefCell<Vec<(String, String)>>,
    group: Option<(String, String)>,
    history: RefCell<Vec<Vec<(String, String)>>>,
    touched: Cell<usize>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::with_uuid(Uuid::new_v4())
    }

    pub fn with_uuid(uuid: Uuid) -> Self {
        MemoryRecord {
            uuid,
            fields: RefCell::new(Vec::new()),
            group: None,
            history: RefCell::new(Vec::new()),
            touched: Cell::new(0),
        }
    }

    /// Builder-style field setter.
    pub fn field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(&name.into(), value.into());
        self
    }

    /// Place the record in a group; `path` is the full group path.
    pub fn in_group(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.group = Some((name.into(), path.into()));
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Field snapshots taken by [`Record::create_backup`], oldest first.
    pub fn history(&self) -> Vec<Vec<(String, String)>> {
        self.history.borrow().clone()
    }

    /// How many times [`Record::touch`] was called.
    pub fn touch_count(&self) -> usize {
        self.touched.get()
    }
}

impl Default for MemoryRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for MemoryRecord {
    fn uuid_hex(&self) -> String {
        hex::encode_upper(self.uuid.as_bytes())
    }

    fn get(&self, field: &str) -> Option<String> {
        self.fields.borrow().iter().find(|(name, _)| name == field).map(|(_, value)| value.clone())
    }

    fn set(&self, field: &str, value: String) {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value,
            None => fields.push((field.to_string(), value)),
        }
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.borrow().iter().map(|(name, _)| name.clone()).collect()
    }

    fn group_name(&self) -> Option<String> {
        self.group.as_ref().map(|(name, _)| name.clone())
    }

    fn group_path(&self) -> Option<String> {
        self.group.as_ref().map(|(_, path)| path.clone())
    }

    fn create_backup(&self) {
        let snapshot = self.fields.borrow().clone();
        self.history.borrow_mut().push(snapshot);
    }

    fn touch(&self) {
        self.touched.set(self.touched.get() + 1);
    }
}

/// A flat list of records searched in insertion order.
///
/// Matching is a case-insensitive substring test, except for
/// [`SearchField::Uuid`] which compares the full hex identifier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    location: String,
    records: Vec<MemoryRecord>,
    modified: Cell<bool>,
}

impl MemoryStore {
    pub fn new(location: impl Into<String>) -> Self {
        MemoryStore { location: location.into(), records: Vec::new(), modified: Cell::new(false) }
    }

    /// Add a record and return its index.
    pub fn add(&mut self, record: MemoryRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn record(&self, index: usize) -> &MemoryRecord {
        &self.records[index]
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    fn matches(record: &MemoryRecord, field: SearchField, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
        match field {
            SearchField::Uuid => record.uuid_hex().eq_ignore_ascii_case(needle),
            SearchField::Other => record
                .field_names()
                .iter()
                .filter(|name| !is_standard_field(name))
                .any(|name| contains(&record.get_or_empty(name))),
            standard => standard.standard_field().is_some_and(|name| contains(&record.get_or_empty(name))),
        }
    }
}

impl RecordStore for MemoryStore {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn find_first(&self, field: SearchField, text: &str) -> Option<&dyn Record> {
        let needle = text.to_lowercase();
        self.records.iter().find(|r| Self::matches(r, field, &needle)).map(|r| r as &dyn Record)
    }

    fn set_modified(&self) {
        self.modified.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place() {
        let record = MemoryRecord::new().field("Title", "a").field("UserName", "u");
        record.set("Title", "b".to_string());
        assert_eq!(record.get("Title").as_deref(), Some("b"));
        assert_eq!(record.field_names(), vec!["Title".to_string(), "UserName".to_string()]);
    }

    #[test]
    fn uuid_hex_is_32_uppercase_digits() {
        let record = MemoryRecord::new();
        let hex = record.uuid_hex();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn find_first_returns_first_match_in_order() {
        let mut store = MemoryStore::new("/tmp/db.kdbx");
        store.add(MemoryRecord::new().field("Title", "Mail work"));
        store.add(MemoryRecord::new().field("Title", "Mail home"));

        let found = store.find_first(SearchField::Title, "MAIL").unwrap();
        assert_eq!(found.get("Title").as_deref(), Some("Mail work"));
        assert!(store.find_first(SearchField::Notes, "mail").is_none());
    }

    #[test]
    fn other_searches_custom_fields_only() {
        let mut store = MemoryStore::new("");
        store.add(MemoryRecord::new().field("Title", "pin").field("Pin", "1234"));

        assert!(store.find_first(SearchField::Other, "pin").is_none());
        assert!(store.find_first(SearchField::Other, "123").is_some());
    }
}
