//! Stable identifier wrappers for clauses, contradictions, documents, and
//! comparison sessions.
//!
//! Every identifier is a UUID under the hood but carries a distinct Rust
//! type so a `ClauseId` can never be passed where a `DocumentId` is expected.

use std::fmt;
use uuid::Uuid;

/// Error returned when parsing a UUID-backed identifier fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    message: String,
}

impl IdParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdParseError {}

macro_rules! define_uuid_id {
    ($name:ident, $label:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form.
            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value)
                    .map($name)
                    .map_err(|e| IdParseError::new(format!("invalid {}: {e}", $label)))
            }

            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_uuid_id!(DocumentId, "document id");
define_uuid_id!(ClauseId, "clause id");
define_uuid_id!(ContradictionId, "contradiction id");
define_uuid_id!(ComparisonSessionId, "comparison session id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display_and_parse() {
        let id = ClauseId::new();
        let parsed = ClauseId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_ids_are_not_equal() {
        assert_ne!(ClauseId::new(), ClauseId::new());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DocumentId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn types_are_distinct_even_with_same_uuid() {
        let u = Uuid::new_v4();
        let doc_id = DocumentId::from(u);
        let clause_id = ClauseId::from(u);
        assert_eq!(doc_id.as_uuid(), clause_id.as_uuid());
    }
}
