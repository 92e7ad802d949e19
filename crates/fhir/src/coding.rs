//! Coded concept carrier.
//!
//! A coded answer in the target schema is always a `(system, code, display)` triple. The
//! engine builds these from fixed tables or from vocabulary lookups; this module only carries
//! them across the wire boundary.

use serde::{Deserialize, Serialize};

/// One coded answer: a code drawn from a named code system, plus its display label.
///
/// Serialises to the FHIR `Coding` shape (`system`, `code`, `display`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedConcept {
    /// Code system URI.
    pub system: String,

    /// Code within the system.
    pub code: String,

    /// Human-readable label for the code.
    pub display: String,
}

impl CodedConcept {
    /// Creates a coded concept from its three parts.
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: display.into(),
        }
    }
}
