//! Mapping configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into every build. The engine never reads environment variables itself; binaries
//! resolve them and construct a [`MappingConfig`].

use crate::constants::{
    COUNTRY_SYSTEM, DEFAULT_IDENTIFIER_SYSTEM, DEFAULT_MEDDRA_SYSTEM,
    DEFAULT_VERIFICATION_SYSTEM, DEFAULT_WHODRUG_SYSTEM, PRELOAD_VOCABULARIES,
};
use crate::source::describe_path_error;
use crate::{MappingError, MappingResult};
use fhir::CodedConcept;
use serde::Deserialize;

/// Code-system URIs emitted by the pass-through reference terminologies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminologySystems {
    pub meddra: String,
    pub whodrug: String,
    pub verification: String,
}

impl Default for TerminologySystems {
    fn default() -> Self {
        Self {
            meddra: DEFAULT_MEDDRA_SYSTEM.to_string(),
            whodrug: DEFAULT_WHODRUG_SYSTEM.to_string(),
            verification: DEFAULT_VERIFICATION_SYSTEM.to_string(),
        }
    }
}

/// Mapping configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct MappingConfig {
    target_stage_id: String,
    identifier_system: String,
    country: CodedConcept,
    organisation_address: Option<String>,
    preload_vocabularies: Vec<String>,
    terminology: TerminologySystems,
}

impl MappingConfig {
    /// Create a configuration with default values for everything but the target stage.
    ///
    /// # Arguments
    ///
    /// * `target_stage_id` - Program stage whose event carries the report completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidInput`] if `target_stage_id` is blank.
    pub fn new(target_stage_id: impl Into<String>) -> MappingResult<Self> {
        let target_stage_id = target_stage_id.into();
        if target_stage_id.trim().is_empty() {
            return Err(MappingError::InvalidInput(
                "target_stage_id cannot be empty".into(),
            ));
        }

        Ok(Self {
            target_stage_id,
            identifier_system: DEFAULT_IDENTIFIER_SYSTEM.to_string(),
            country: CodedConcept::new(COUNTRY_SYSTEM, "PRY", "Paraguay"),
            organisation_address: None,
            preload_vocabularies: PRELOAD_VOCABULARIES.iter().map(|id| id.to_string()).collect(),
            terminology: TerminologySystems::default(),
        })
    }

    /// Parse a configuration file.
    ///
    /// Every key is optional and unknown keys are rejected. `stage_override`, when given,
    /// replaces `target_stage_id` from the file.
    ///
    /// # Arguments
    ///
    /// * `yaml_text` - Contents of the YAML configuration file.
    /// * `stage_override` - Stage id supplied outside the file (CLI flag or environment).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if:
    /// - the YAML does not match the configuration schema,
    /// - no non-blank target stage id is available,
    /// - the identifier system or a preload id is blank.
    pub fn from_yaml(yaml_text: &str, stage_override: Option<&str>) -> MappingResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let file: ConfigFile = serde_path_to_error::deserialize(deserializer)
            .map_err(|err| MappingError::YamlDeserialization(describe_path_error(err)))?;

        let stage = stage_override
            .map(str::to_string)
            .or(file.target_stage_id)
            .unwrap_or_default();
        let mut config = Self::new(stage)?;

        if let Some(system) = file.identifier_system {
            if system.trim().is_empty() {
                return Err(MappingError::InvalidInput(
                    "identifier_system cannot be empty".into(),
                ));
            }
            config.identifier_system = system;
        }

        if let Some(country) = file.country {
            config.country = CodedConcept::new(country.system, country.code, country.display);
        }

        config.organisation_address = file
            .organisation_address
            .filter(|address| !address.trim().is_empty());

        if let Some(ids) = file.preload_vocabularies {
            if ids.iter().any(|id| id.trim().is_empty()) {
                return Err(MappingError::InvalidInput(
                    "preload_vocabularies cannot contain empty ids".into(),
                ));
            }
            config.preload_vocabularies = ids;
        }

        if let Some(terminology) = file.terminology {
            let defaults = TerminologySystems::default();
            config.terminology = TerminologySystems {
                meddra: terminology.meddra_system.unwrap_or(defaults.meddra),
                whodrug: terminology.whodrug_system.unwrap_or(defaults.whodrug),
                verification: terminology
                    .verification_system
                    .unwrap_or(defaults.verification),
            };
        }

        Ok(config)
    }

    /// Sets the free-text organisation address reported in `nombreDireccionOrganizacion`.
    pub fn with_organisation_address(mut self, address: Option<String>) -> Self {
        self.organisation_address = address.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn target_stage_id(&self) -> &str {
        &self.target_stage_id
    }

    pub fn identifier_system(&self) -> &str {
        &self.identifier_system
    }

    pub fn country(&self) -> &CodedConcept {
        &self.country
    }

    pub fn organisation_address(&self) -> Option<&str> {
        self.organisation_address.as_deref()
    }

    pub fn preload_vocabularies(&self) -> &[String] {
        &self.preload_vocabularies
    }

    pub fn terminology(&self) -> &TerminologySystems {
        &self.terminology
    }
}

// ============================================================================
// File format (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    target_stage_id: Option<String>,
    #[serde(default)]
    identifier_system: Option<String>,
    #[serde(default)]
    country: Option<CountryFile>,
    #[serde(default)]
    organisation_address: Option<String>,
    #[serde(default)]
    preload_vocabularies: Option<Vec<String>>,
    #[serde(default)]
    terminology: Option<TerminologyFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountryFile {
    system: String,
    code: String,
    display: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TerminologyFile {
    #[serde(default)]
    meddra_system: Option<String>,
    #[serde(default)]
    whodrug_system: Option<String>,
    #[serde(default)]
    verification_system: Option<String>,
}
