use thiserror::Error;

/// Convenient result alias for the catalog library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Raised when a collection is built with two entries sharing an id.
    #[error("duplicate id {id} in {collection} catalog")]
    DuplicateId { collection: String, id: i64 },

    /// Raised when a path identifier is not an integer.
    #[error("identifier '{raw}' is not a valid integer")]
    InvalidId { raw: String },

    /// Raised when no entry exists for a parsed identifier.
    #[error("no {collection} entry with id {id}")]
    EntryNotFound { collection: String, id: i64 },

    /// Raised when a request field is absent or outside its fixed enumeration.
    #[error("{}", format_unsupported(.field, .value.as_deref(), .supported))]
    UnsupportedValue {
        field: &'static str,
        value: Option<String>,
        supported: Vec<&'static str>,
    },

    /// Raised when a required free-form field is missing or blank.
    #[error("the '{field}' field is required and cannot be empty")]
    MissingField { field: &'static str },
}

fn format_unsupported(field: &str, value: Option<&str>, supported: &[&str]) -> String {
    match value {
        Some(value) => format!(
            "'{}' is not a supported {}; expected one of: {}",
            value,
            field,
            supported.join(", ")
        ),
        None => format!(
            "the '{}' field is required; expected one of: {}",
            field,
            supported.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_value_lists_choices() {
        let err = Error::UnsupportedValue {
            field: "analysis_type",
            value: Some("vibes".to_string()),
            supported: vec!["security", "performance"],
        };
        let message = err.to_string();
        assert!(message.contains("'vibes'"));
        assert!(message.contains("security, performance"));
    }

    #[test]
    fn missing_enumerated_value_says_required() {
        let err = Error::UnsupportedValue {
            field: "scope",
            value: None,
            supported: vec!["api"],
        };
        assert!(err.to_string().contains("'scope' field is required"));
    }
}
