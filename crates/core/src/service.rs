//! Collaborators and the mapping service.
//!
//! The engine reads records and vocabulary sets through the [`RecordSource`] and
//! [`VocabularySource`] traits. [`JsonDirectorySource`] implements both over a directory of
//! `<id>.json` files; remote tracker clients plug in the same way.
//!
//! [`MappingService`] ties the shared vocabulary cache, the configuration and the reference
//! terminologies together. It is cheap to clone, so one instance can be handed to every
//! worker of a batch run.

use crate::builder::DocumentBuilder;
use crate::config::MappingConfig;
use crate::constants::{JSON_EXTENSION, OUTPUT_SUFFIX};
use crate::context::MappingContext;
use crate::source::SourceRecord;
use crate::terminology::Terminology;
use crate::vocabulary::{VocabularyCache, VocabularySet};
use crate::{MappingError, MappingResult};
use fhir::Document;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Collaborator traits
// ============================================================================

/// Fetches source records by subject id.
pub trait RecordSource: Send + Sync {
    fn fetch_record(&self, subject_id: &str) -> MappingResult<SourceRecord>;
}

/// Fetches vocabulary sets by id.
pub trait VocabularySource: Send + Sync {
    fn fetch_vocabulary(&self, set_id: &str) -> MappingResult<VocabularySet>;
}

// ============================================================================
// Directory-backed source
// ============================================================================

/// Records and vocabulary sets stored as `<dir>/<id>.json`.
#[derive(Clone, Debug)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of every JSON document in the directory, sorted.
    ///
    /// Rendered outputs (`*.fhir.json`) and non-JSON files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::FileRead`] if the directory cannot be listed.
    pub fn ids(&self) -> MappingResult<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir).map_err(MappingError::FileRead)? {
            let path = entry.map_err(MappingError::FileRead)?.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(OUTPUT_SUFFIX) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Path of the document for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidInput`] if `id` is blank or could escape the directory.
    pub fn path_for(&self, id: &str) -> MappingResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{JSON_EXTENSION}")))
    }

    fn read(&self, id: &str) -> MappingResult<String> {
        let path = self.path_for(id)?;
        fs::read_to_string(&path).map_err(MappingError::FileRead)
    }
}

impl RecordSource for JsonDirectorySource {
    fn fetch_record(&self, subject_id: &str) -> MappingResult<SourceRecord> {
        SourceRecord::from_json(&self.read(subject_id)?)
    }
}

impl VocabularySource for JsonDirectorySource {
    fn fetch_vocabulary(&self, set_id: &str) -> MappingResult<VocabularySet> {
        let set = VocabularySet::from_json(&self.read(set_id)?)?;
        if set.id() != set_id {
            return Err(MappingError::InvalidInput(format!(
                "file {set_id}.{JSON_EXTENSION} holds option set {}",
                set.id()
            )));
        }
        Ok(set)
    }
}

/// Ids become file names, so only a conservative ASCII set is accepted.
fn validate_id(id: &str) -> MappingResult<()> {
    if id.trim().is_empty() {
        return Err(MappingError::InvalidInput("id cannot be empty".into()));
    }

    let ok = id
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
    if !ok || id.contains("..") {
        return Err(MappingError::InvalidInput(format!(
            "id {id:?} contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
        )));
    }

    Ok(())
}

// ============================================================================
// Mapping service
// ============================================================================

/// Builds documents against a shared vocabulary cache.
#[derive(Clone, Debug)]
pub struct MappingService {
    cache: Arc<VocabularyCache>,
    config: Arc<MappingConfig>,
    terminology: Terminology,
}

impl MappingService {
    /// Creates a service with an empty cache and pass-through reference terminologies.
    pub fn new(config: Arc<MappingConfig>) -> Self {
        let terminology = Terminology::pass_through(config.terminology());
        Self::with_parts(Arc::new(VocabularyCache::new()), config, terminology)
    }

    pub fn with_parts(
        cache: Arc<VocabularyCache>,
        config: Arc<MappingConfig>,
        terminology: Terminology,
    ) -> Self {
        Self {
            cache,
            config,
            terminology,
        }
    }

    pub fn cache(&self) -> &Arc<VocabularyCache> {
        &self.cache
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Fetch and register one vocabulary set unless it is already cached.
    ///
    /// # Returns
    ///
    /// `true` if this call registered the set.
    ///
    /// # Errors
    ///
    /// Propagates the source's fetch error.
    pub fn preload_one(&self, source: &dyn VocabularySource, set_id: &str) -> MappingResult<bool> {
        if self.cache.contains(set_id) {
            return Ok(false);
        }
        let set = source.fetch_vocabulary(set_id)?;
        Ok(self.cache.register(set))
    }

    /// Fetch and register every configured vocabulary set.
    ///
    /// # Returns
    ///
    /// The number of sets newly registered.
    ///
    /// # Errors
    ///
    /// Stops at the first set that cannot be fetched.
    pub fn preload(&self, source: &dyn VocabularySource) -> MappingResult<usize> {
        let mut registered = 0;
        for set_id in self.config.preload_vocabularies() {
            if self.preload_one(source, set_id)? {
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// Build the document for a record already in hand.
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] the build meets; there is no partial document.
    pub fn build(&self, record: &SourceRecord) -> MappingResult<Document> {
        let context = MappingContext::new(record, &self.cache, self.config.target_stage_id())?;
        DocumentBuilder::new(&self.config, &self.terminology).build(&context)
    }

    /// Fetch a record and build its document.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors as well as build errors.
    pub fn convert(&self, source: &dyn RecordSource, subject_id: &str) -> MappingResult<Document> {
        let record = source.fetch_record(subject_id)?;
        self.build(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PRELOAD_VOCABULARIES, VOCAB_DISTRICTS};
    use crate::MappingError;
    use tempfile::TempDir;

    const STAGE: &str = "sdXW2uQOtxG";

    const RECORD: &str = r#"{
        "trackedEntity": "PQfMcpmXeFE",
        "attributes": [
            { "attribute": "KSr2yTdu1AI", "value": "DEM_2023_11_09_000002" },
            { "attribute": "eISp65Kw0Z7", "value": "1101" }
        ],
        "enrollments": [{
            "orgUnitName": "Hospital Central",
            "events": [{
                "programStage": "sdXW2uQOtxG",
                "completedAt": "2023-11-13T16:04:26.573",
                "dataValues": []
            }]
        }]
    }"#;

    fn option_set(id: &str, options: &str) -> String {
        format!(r#"{{ "id": "{id}", "options": [{options}] }}"#)
    }

    fn vocabulary_dir() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for id in PRELOAD_VOCABULARIES {
            let options = if id == VOCAB_DISTRICTS {
                r#"{ "code": "1101", "name": "Asunción" }"#
            } else {
                ""
            };
            fs::write(dir.path().join(format!("{id}.json")), option_set(id, options))
                .expect("write option set");
        }
        dir
    }

    fn service() -> MappingService {
        let config = MappingConfig::new(STAGE).expect("config");
        MappingService::new(Arc::new(config))
    }

    #[test]
    fn preload_registers_every_configured_set_once() {
        let dir = vocabulary_dir();
        let source = JsonDirectorySource::new(dir.path());
        let service = service();

        assert_eq!(service.preload(&source).expect("preload"), PRELOAD_VOCABULARIES.len());
        assert_eq!(service.preload(&source).expect("second preload"), 0);
        assert_eq!(
            service.cache().lookup(VOCAB_DISTRICTS, "1101").as_deref(),
            Some("Asunción")
        );
    }

    #[test]
    fn preload_fails_on_missing_set() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = JsonDirectorySource::new(dir.path());

        let err = service().preload(&source).expect_err("no sets on disk");
        assert!(matches!(err, MappingError::FileRead(_)));
    }

    #[test]
    fn set_id_must_match_file_name() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("A.json"), option_set("B", "")).expect("write");

        let err = JsonDirectorySource::new(dir.path())
            .fetch_vocabulary("A")
            .expect_err("mismatched id");
        assert!(matches!(err, MappingError::InvalidInput(_)));
    }

    #[test]
    fn convert_reads_and_builds_record() {
        let vocabularies = vocabulary_dir();
        let records = TempDir::new().expect("Failed to create temp dir");
        fs::write(records.path().join("PQfMcpmXeFE.json"), RECORD).expect("write record");

        let service = service();
        service
            .preload(&JsonDirectorySource::new(vocabularies.path()))
            .expect("preload");

        let document = service
            .convert(&JsonDirectorySource::new(records.path()), "PQfMcpmXeFE")
            .expect("convert");

        assert_eq!(document.subject_id, "PQfMcpmXeFE");
        assert_eq!(document.authored, "2023-11-13");
        assert!(document.find("nombreResidenciaHabitual").is_some());
    }

    #[test]
    fn build_without_preload_is_a_configuration_defect() {
        let record = SourceRecord::from_json(RECORD).expect("parse");
        let err = service().build(&record).expect_err("vocabularies missing");
        assert!(matches!(err, MappingError::ConfigurationDefect(_)));
    }

    #[test]
    fn ids_skip_outputs_and_other_files() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for name in ["b.json", "a.json", "a.fhir.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").expect("write");
        }
        fs::create_dir(dir.path().join("nested.json")).expect("mkdir");

        let ids = JsonDirectorySource::new(dir.path()).ids().expect("list");
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn ids_that_could_escape_the_directory_are_rejected() {
        let source = JsonDirectorySource::new("/tmp");
        for id in ["", "../etc/passwd", "a/b", ".."] {
            assert!(
                matches!(source.path_for(id), Err(MappingError::InvalidInput(_))),
                "{id:?} should be rejected"
            );
        }
        assert!(source.path_for("PQfMcpmXeFE").is_ok());
    }
}
