//! Record and store collaborators.
//!
//! The engine never owns entries. It reads and writes fields through [`Record`]
//! and finds other entries through [`RecordStore`]. Both traits take `&self`
//! for writes as well: a compile run holds shared references to the record it
//! compiles *and* to records reached through `{REF:...}`, so implementations
//! are expected to use interior mutability (see [`crate::MemoryRecord`]).

pub const TITLE_FIELD: &str = "Title";
pub const USER_NAME_FIELD: &str = "UserName";
pub const PASSWORD_FIELD: &str = "Password";
pub const URL_FIELD: &str = "URL";
pub const NOTES_FIELD: &str = "Notes";

/// The five fields every record is assumed to have.
pub const STANDARD_FIELDS: [&str; 5] = [TITLE_FIELD, USER_NAME_FIELD, PASSWORD_FIELD, URL_FIELD, NOTES_FIELD];

/// Prefix of custom field placeholders, as in `{S:Pin}`.
pub const CUSTOM_FIELD_PREFIX: &str = "S:";

/// Substituted for password placeholders when plaintext passwords are not allowed.
pub const HIDDEN_PASSWORD: &str = "********";

/// Return true when `name` is one of [`STANDARD_FIELDS`] (exact, case-sensitive).
pub fn is_standard_field(name: &str) -> bool {
    STANDARD_FIELDS.contains(&name)
}

/// A field-bearing entry.
pub trait Record {
    /// Identifier as 32 uppercase hex digits; resolved by `{REF:I@...}`.
    fn uuid_hex(&self) -> String;

    /// Read a field. Missing fields return `None`.
    fn get(&self, field: &str) -> Option<String>;

    /// Write (create or overwrite) a field.
    fn set(&self, field: &str, value: String);

    /// Names of all fields currently present, in a stable order.
    fn field_names(&self) -> Vec<String>;

    /// Name of the parent group, if the record has one.
    fn group_name(&self) -> Option<String> {
        None
    }

    /// Full path of the parent group (e.g. `Root/Internet/Mail`).
    fn group_path(&self) -> Option<String> {
        None
    }

    /// Snapshot the current state into the record's history before a mutation.
    fn create_backup(&self) {}

    /// Update modification timestamps.
    fn touch(&self) {}

    /// Read a field, treating a missing field as empty.
    fn get_or_empty(&self, field: &str) -> String {
        self.get(field).unwrap_or_default()
    }
}

/// Field class matched by a `{REF:...}` search (the letter after `@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    UserName,
    Url,
    Password,
    Notes,
    Uuid,
    /// Any non-standard field.
    Other,
}

impl SearchField {
    /// Map a reference letter (`T`, `U`, `A`, `P`, `N`, `I`, `O`) to a search class.
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'T' => Some(SearchField::Title),
            'U' => Some(SearchField::UserName),
            'A' => Some(SearchField::Url),
            'P' => Some(SearchField::Password),
            'N' => Some(SearchField::Notes),
            'I' => Some(SearchField::Uuid),
            'O' => Some(SearchField::Other),
            _ => None,
        }
    }

    /// Standard field backing this class, if any.
    pub fn standard_field(self) -> Option<&'static str> {
        match self {
            SearchField::Title => Some(TITLE_FIELD),
            SearchField::UserName => Some(USER_NAME_FIELD),
            SearchField::Url => Some(URL_FIELD),
            SearchField::Password => Some(PASSWORD_FIELD),
            SearchField::Notes => Some(NOTES_FIELD),
            SearchField::Uuid | SearchField::Other => None,
        }
    }
}

/// The hierarchical collection a record belongs to.
pub trait RecordStore {
    /// Backing location (file path or URL) used by `{DB_PATH}` and friends.
    fn location(&self) -> String;

    /// First record, in the store's own traversal order, whose `field` matches `text`.
    fn find_first(&self, field: SearchField, text: &str) -> Option<&dyn Record>;

    /// Flag the store as having unsaved changes.
    fn set_modified(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_field_names_are_case_sensitive() {
        assert!(is_standard_field("UserName"));
        assert!(!is_standard_field("username"));
        assert!(!is_standard_field("Pin"));
    }

    #[test]
    fn search_codes_accept_lowercase() {
        assert_eq!(SearchField::from_code('i'), Some(SearchField::Uuid));
        assert_eq!(SearchField::from_code('O'), Some(SearchField::Other));
        assert_eq!(SearchField::from_code('X'), None);
        assert_eq!(SearchField::Other.standard_field(), None);
    }
}
