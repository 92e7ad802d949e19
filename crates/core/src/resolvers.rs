//! Fixed code resolvers.
//!
//! Small total functions translating raw source codes into coded answers. Each documents its
//! default; only [`ternary`] has none and returns `None` for unrecognised input.

use crate::constants::{
    ADMINISTRATIVE_GENDER_SYSTEM, CAUSALITY_METHOD_SYSTEM, CODING_SYSTEMS_SYSTEM,
    OUTCOME_SYSTEM, PROFESSION_SYSTEM, TERNARY_SYSTEM,
};
use fhir::CodedConcept;

// ============================================================================
// Reporter profession
// ============================================================================

const PROFESSIONS: [(&str, &str); 5] = [
    ("1", "Médico"),
    ("2", "Farmacéutico"),
    ("3", "Otro Profesional de la Salud"),
    ("4", "Abogado"),
    ("5", "Usuario u otro profesional no sanitario"),
];

const PROFESSION_DEFAULT: (&str, &str) = ("6", "No definido por el usuario");

/// Reporter profession. Missing or unknown codes resolve to `6` ("not user-defined").
pub fn profession(code: Option<&str>) -> CodedConcept {
    let (code, display) = code
        .and_then(|c| PROFESSIONS.iter().find(|(known, _)| *known == c.trim()))
        .copied()
        .unwrap_or(PROFESSION_DEFAULT);
    CodedConcept::new(PROFESSION_SYSTEM, code, display)
}

// ============================================================================
// Administrative sex
// ============================================================================

/// Administrative sex. `1` is male, `2` female; anything else is unknown.
pub fn administrative_sex(code: Option<&str>) -> CodedConcept {
    let (code, display) = match code.map(str::trim) {
        Some("1") => ("male", "Male"),
        Some("2") => ("female", "Female"),
        _ => ("unknown", "Unknown"),
    };
    CodedConcept::new(ADMINISTRATIVE_GENDER_SYSTEM, code, display)
}

// ============================================================================
// Yes / No / Unknown
// ============================================================================

/// Three-valued questionnaire answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ternary {
    Yes,
    No,
    Unknown,
}

impl Ternary {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn coding(self) -> CodedConcept {
        let (code, display) = match self {
            Self::Yes => ("1", "Si"),
            Self::No => ("2", "No"),
            Self::Unknown => ("3", "No sabe"),
        };
        CodedConcept::new(TERNARY_SYSTEM, code, display)
    }
}

/// Parses `1`/`2`/`3`. Anything else has no mapping.
pub fn ternary(code: &str) -> Option<Ternary> {
    match code.trim() {
        "1" => Some(Ternary::Yes),
        "2" => Some(Ternary::No),
        "3" => Some(Ternary::Unknown),
        _ => None,
    }
}

/// Lenient boolean text: `true` in any letter case is true, everything else false.
pub fn parse_boolean_text(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Combines the formal and verbal autopsy answers.
///
/// Neither answered is `Unknown`. Otherwise a missing answer counts as false, and the result
/// is `Yes` when either answer is true and `No` when both are false.
pub fn autopsy_requested(formal: Option<&str>, verbal: Option<&str>) -> Ternary {
    if formal.is_none() && verbal.is_none() {
        return Ternary::Unknown;
    }

    let formal = formal.is_some_and(parse_boolean_text);
    let verbal = verbal.is_some_and(parse_boolean_text);
    Ternary::from_bool(formal || verbal)
}

// ============================================================================
// Outcome
// ============================================================================

/// Case outcome classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    RecoveredOrResolved,
    RecoveringOrResolving,
    NotRecoveredOrNotResolved,
    RecoveredOrResolvedWithSequelae,
    Died,
    Unknown,
}

impl Outcome {
    const ALL: [Outcome; 6] = [
        Outcome::RecoveredOrResolved,
        Outcome::RecoveringOrResolving,
        Outcome::NotRecoveredOrNotResolved,
        Outcome::RecoveredOrResolvedWithSequelae,
        Outcome::Died,
        Outcome::Unknown,
    ];

    /// Category name as carried in source observations.
    pub fn name(self) -> &'static str {
        match self {
            Self::RecoveredOrResolved => "RECOVERED_OR_RESOLVED",
            Self::RecoveringOrResolving => "RECOVERING_OR_RESOLVING",
            Self::NotRecoveredOrNotResolved => "NOT_RECOVERED_OR_NOT_RESOLVED",
            Self::RecoveredOrResolvedWithSequelae => "RECOVERED_OR_RESOLVED_WITH_SEQUELAE",
            Self::Died => "DIED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn coding(self) -> CodedConcept {
        let (code, display) = match self {
            Self::RecoveredOrResolved => ("1", "Recuperado Completamente"),
            Self::RecoveringOrResolving => ("2", "En recuperación"),
            Self::NotRecoveredOrNotResolved => ("3", "No recuperado"),
            Self::RecoveredOrResolvedWithSequelae => ("4", "Recuperado con secuelas"),
            Self::Died => ("5", "Muerte"),
            Self::Unknown => ("0", "Desconocido"),
        };
        CodedConcept::new(OUTCOME_SYSTEM, code, display)
    }
}

/// Case-insensitive match on the category name, ignoring surrounding whitespace.
/// Anything unmatched, including a blank value, is `Unknown`.
pub fn outcome(value: Option<&str>) -> Outcome {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Outcome::Unknown;
    };

    Outcome::ALL
        .into_iter()
        .find(|candidate| candidate.name().eq_ignore_ascii_case(value))
        .unwrap_or(Outcome::Unknown)
}

// ============================================================================
// Causality and coding-system markers
// ============================================================================

/// Classification method companion to every asserted causality category.
pub fn causality_method() -> CodedConcept {
    CodedConcept::new(CAUSALITY_METHOD_SYSTEM, "WHO-AEFI", "WHO-AEFI")
}

/// Marker stating that normalised vaccine names are WHODrug names.
pub fn whodrug_coding_system() -> CodedConcept {
    CodedConcept::new(CODING_SYSTEMS_SYSTEM, "2", "WHODrug")
}
