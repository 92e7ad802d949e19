//! Constants used throughout the ESAVI core crate.
//!
//! Canonical URLs, code-system URIs and the vocabulary-set ids the mapping depends on.
//! Field ids of repeating slots live with their tables in [`crate::catalog`].

// ============================================================================
// Document metadata
// ============================================================================

/// Structure-definition profile the document claims conformance to.
pub const PROFILE_URL: &str =
    "https://paho.org/fhir/esavi/StructureDefinition/ESAVIQuestionnaireResponse";

/// Questionnaire the document answers.
pub const QUESTIONNAIRE_URL: &str = "https://paho.org/fhir/esavi/Questionnaire/CuestionarioESAVI";

/// Default namespace for the case-number identifier.
pub const DEFAULT_IDENTIFIER_SYSTEM: &str = "http://ops.org/esavi/PRY";

/// Narrative shown in place of the case number when it is missing.
pub const NARRATIVE_PLACEHOLDER: &str = "N/A";

// ============================================================================
// Code systems
// ============================================================================

pub const COUNTRY_SYSTEM: &str = "https://paho.org/fhir/esavi/CodeSystem/codPaisesCS";
pub const TERNARY_SYSTEM: &str = "https://paho.org/fhir/esavi/CodeSystem/RespuestaSiNoNosabeCS";
pub const PROFESSION_SYSTEM: &str =
    "https://paho.org/fhir/esavi/CodeSystem/ProfesionalNotificadorCS";
pub const OUTCOME_SYSTEM: &str = "https://paho.org/fhir/esavi/CodeSystem/ClasificacionDesenlaceCS";
pub const CAUSALITY_SYSTEM: &str =
    "https://paho.org/fhir/esavi/CodeSystem/ClasificacionDesenlaceWHOAEFICS";
pub const CAUSALITY_METHOD_SYSTEM: &str =
    "https://paho.org/fhir/esavi/CodeSystem/SistemaClasfCausalidadCS";
pub const CODING_SYSTEMS_SYSTEM: &str =
    "https://paho.org/fhir/esavi/CodeSystem/SistemasDeCodificacionCS";
pub const ADMINISTRATIVE_GENDER_SYSTEM: &str = "http://hl7.org/fhir/administrative-gender";

/// Default system for MedDRA codes emitted by the pass-through terminology.
pub const DEFAULT_MEDDRA_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/mdr";

/// Default system for WHODrug codes emitted by the pass-through terminology.
pub const DEFAULT_WHODRUG_SYSTEM: &str = "https://paho.org/fhir/esavi/CodeSystem/WHODrugCS";

/// Default system for vaccine verification mechanisms.
pub const DEFAULT_VERIFICATION_SYSTEM: &str =
    "https://paho.org/fhir/esavi/CodeSystem/MecanismoVerificacionCS";

// ============================================================================
// Vocabulary sets
// ============================================================================

pub const VOCAB_PHARMACEUTICAL_FORMS: &str = "qRyur64ZaPK";
pub const VOCAB_ADMINISTRATION_ROUTES: &str = "E9d1xL5jsTJ";
pub const VOCAB_DILUENTS: &str = "NdEeGMVaObK";
pub const VOCAB_WHODRUG: &str = "deNBd8tEIeD";
pub const VOCAB_WHODRUG_COVID: &str = "PrAA7nJPXke";
pub const VOCAB_MEDDRA: &str = "OzARj1D09Dm";
pub const VOCAB_DISTRICTS: &str = "TYYlo7IdrCw";
pub const VOCAB_VACCINATION_SITES: &str = "GUpt2UXm3hR";

/// Vocabulary sets fetched before the first build.
pub const PRELOAD_VOCABULARIES: [&str; 8] = [
    VOCAB_PHARMACEUTICAL_FORMS,
    VOCAB_ADMINISTRATION_ROUTES,
    VOCAB_DILUENTS,
    VOCAB_WHODRUG,
    VOCAB_WHODRUG_COVID,
    VOCAB_MEDDRA,
    VOCAB_DISTRICTS,
    VOCAB_VACCINATION_SITES,
];

// ============================================================================
// Files
// ============================================================================

/// Extension of record and vocabulary files read by the directory source.
pub const JSON_EXTENSION: &str = "json";

/// Suffix of rendered output files.
pub const OUTPUT_SUFFIX: &str = ".fhir.json";
