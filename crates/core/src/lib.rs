//! # ESAVI Core
//!
//! Mapping engine that turns a tracker case record into the ESAVI questionnaire response.
//!
//! This crate contains the pure mapping logic and its local collaborators:
//! - the source-record model and its indexed view ([`source`], [`context`])
//! - the shared vocabulary cache ([`vocabulary`])
//! - code resolvers, reference terminologies and pseudonymisation
//! - the declarative field catalog and the document builder
//! - directory-backed record and vocabulary sources, validation and the [`MappingService`]
//!
//! **No wire concerns**: JSON rendering of the finished document belongs in the `fhir` crate.
//! **No process concerns**: binaries resolve environment and files, then pass a
//! [`MappingConfig`] in.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod pseudonym;
pub mod resolvers;
pub mod service;
pub mod source;
pub mod terminology;
pub mod validation;
pub mod vocabulary;

pub use builder::DocumentBuilder;
pub use config::{MappingConfig, TerminologySystems};
pub use context::{MappingContext, RecordView};
pub use error::{LookupKind, MappingError, MappingResult};
pub use service::{JsonDirectorySource, MappingService, RecordSource, VocabularySource};
pub use source::SourceRecord;
pub use terminology::{PassThroughVocabulary, ReferenceVocabulary, Terminology};
pub use validation::{DocumentValidator, Issue, Severity, StructuralValidator, ValidationOutcome};
pub use vocabulary::{VocabularyCache, VocabularySet};
