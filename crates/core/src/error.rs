//! Error taxonomy of the mapping engine.
//!
//! A build either yields a whole document or fails with the first [`MappingError`] it meets.
//! Section builders turn `NotFound` on optional fields into an absent node; everything else
//! propagates to the caller.

use std::fmt;

/// What kind of lookup failed with [`MappingError::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    Attribute,
    Observation,
    Option,
    Enrollment,
    CompletionDate,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attribute => "attribute",
            Self::Observation => "observation",
            Self::Option => "option",
            Self::Enrollment => "enrollment",
            Self::CompletionDate => "completion date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: LookupKind, id: String },

    #[error("malformed value for {field} ({value:?}): {reason}")]
    MalformedInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("vocabulary set was never preloaded: {0}")]
    ConfigurationDefect(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),

    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),

    #[error("failed to deserialize JSON: {0}")]
    Deserialization(String),

    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

impl MappingError {
    pub(crate) fn not_found(kind: LookupKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn malformed(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::MalformedInput {
            field: field.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for the error a section builder may convert into an absent node.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type MappingResult<T> = std::result::Result<T, MappingError>;

/// Converts `NotFound` into `None`, leaving every other error in place.
///
/// Used where a field is optional but reached through a required accessor.
pub(crate) fn optional<T>(result: MappingResult<T>) -> MappingResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_swallows_only_not_found() {
        let absent: MappingResult<i32> = Err(MappingError::not_found(LookupKind::Attribute, "x"));
        assert!(matches!(optional(absent), Ok(None)));

        let malformed: MappingResult<i32> = Err(MappingError::malformed("horaESAVI", "25:99", "bad"));
        assert!(matches!(
            optional(malformed),
            Err(MappingError::MalformedInput { .. })
        ));
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = MappingError::not_found(LookupKind::CompletionDate, "PQfMcpmXeFE");
        assert_eq!(err.to_string(), "completion date not found: PQfMcpmXeFE");
    }
}
