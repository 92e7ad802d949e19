//! External reference terminologies.
//!
//! MedDRA, WHODrug and the vaccine verification mechanism are published code systems whose
//! lookup tables live outside this crate. The engine only needs
//! `resolve(raw_code, fallback_display) -> CodedConcept` from each.

use crate::config::TerminologySystems;
use fhir::CodedConcept;
use std::sync::Arc;

/// A reference code system able to turn a raw source code into a coded concept.
///
/// Implementations must be total and side-effect free.
pub trait ReferenceVocabulary: Send + Sync {
    fn resolve(&self, raw_code: &str, fallback_display: &str) -> CodedConcept;
}

/// Emits the raw code under a fixed system, labelled with the fallback display.
///
/// Used until the published lookup tables are wired in.
#[derive(Clone, Debug)]
pub struct PassThroughVocabulary {
    system: String,
}

impl PassThroughVocabulary {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }
}

impl ReferenceVocabulary for PassThroughVocabulary {
    fn resolve(&self, raw_code: &str, fallback_display: &str) -> CodedConcept {
        CodedConcept::new(&self.system, raw_code.trim(), fallback_display)
    }
}

/// The reference terminologies a build consults.
#[derive(Clone)]
pub struct Terminology {
    pub meddra: Arc<dyn ReferenceVocabulary>,
    pub whodrug: Arc<dyn ReferenceVocabulary>,
    pub verification: Arc<dyn ReferenceVocabulary>,
}

impl Terminology {
    /// Pass-through resolvers over the configured system URIs.
    pub fn pass_through(systems: &TerminologySystems) -> Self {
        Self {
            meddra: Arc::new(PassThroughVocabulary::new(&systems.meddra)),
            whodrug: Arc::new(PassThroughVocabulary::new(&systems.whodrug)),
            verification: Arc::new(PassThroughVocabulary::new(&systems.verification)),
        }
    }
}

impl std::fmt::Debug for Terminology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminology").finish_non_exhaustive()
    }
}
