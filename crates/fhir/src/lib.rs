//! FHIR wire/boundary support for ESAVI case reporting.
//!
//! This crate provides **domain-level document types** and **wire rendering** for the
//! PAHO ESAVI implementation guide:
//! - coded answers ([`CodedConcept`])
//! - the questionnaire-response tree ([`Document`], [`DocumentNode`], [`Answer`])
//! - FHIR R4 JSON rendering of a `QuestionnaireResponse` and of a `batch` `Bundle`
//!
//! This crate focuses on:
//! - FHIR semantic alignment for one fixed schema version
//! - serialisation of the finished document
//! - the prune-if-empty invariant of the document tree
//!
//! It knows nothing about where answers come from. Record mapping lives in `esavi-core`.

pub mod bundle;
pub mod coding;
pub mod questionnaire_response;

// Re-export facades
pub use bundle::Bundle;
pub use questionnaire_response::QuestionnaireResponse;

// Re-export public domain-level types
pub use coding::CodedConcept;
pub use questionnaire_response::{Answer, Document, DocumentNode, DocumentStatus, Identifier};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
