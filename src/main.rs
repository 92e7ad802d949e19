use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use esavi_core::constants::OUTPUT_SUFFIX;
use esavi_core::{
    DocumentValidator, JsonDirectorySource, MappingConfig, MappingService, StructuralValidator,
};
use fhir::QuestionnaireResponse;

/// Default log levels, applied on top of `RUST_LOG`.
const LOG_DIRECTIVES: [&str; 2] = ["esavi_run=info", "esavi_core=info"];

/// Locations and overrides resolved from the environment at startup.
#[derive(Clone, Debug)]
struct RunSettings {
    config_file: Option<PathBuf>,
    stage_id: Option<String>,
    input_dir: PathBuf,
    vocabulary_dir: PathBuf,
    output_dir: PathBuf,
}

impl RunSettings {
    fn from_env() -> Self {
        let path = |name: &str, default: &str| {
            PathBuf::from(std::env::var(name).unwrap_or_else(|_| default.into()))
        };

        Self {
            config_file: std::env::var("ESAVI_CONFIG").ok().map(PathBuf::from),
            stage_id: std::env::var("ESAVI_STAGE_ID").ok(),
            input_dir: path("ESAVI_INPUT_DIR", "records"),
            vocabulary_dir: path("ESAVI_VOCABULARY_DIR", "vocabularies"),
            output_dir: path("ESAVI_OUTPUT_DIR", "out"),
        }
    }

    fn mapping_config(&self) -> anyhow::Result<MappingConfig> {
        let config = match &self.config_file {
            Some(file) => {
                let yaml = std::fs::read_to_string(file)
                    .with_context(|| format!("reading {}", file.display()))?;
                MappingConfig::from_yaml(&yaml, self.stage_id.as_deref())?
            }
            None => MappingConfig::new(self.stage_id.clone().unwrap_or_default())
                .context("ESAVI_STAGE_ID or ESAVI_CONFIG must be set")?,
        };
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct FailedRecord {
    subject_id: String,
    error: String,
}

/// Printed as JSON once every record has been processed.
#[derive(Debug, Serialize)]
struct RunSummary {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    converted: usize,
    validation_issues: usize,
    failed: Vec<FailedRecord>,
}

/// Batch entry point for ESAVI conversion.
///
/// Converts every `*.json` tracker record in the input directory into a FHIR
/// `QuestionnaireResponse` written as `<id>.fhir.json` in the output directory.
///
/// # Environment Variables
/// - `ESAVI_CONFIG`: YAML mapping configuration (optional)
/// - `ESAVI_STAGE_ID`: program stage carrying the completion timestamp (overrides the file)
/// - `ESAVI_INPUT_DIR`: directory of tracker records (default: "records")
/// - `ESAVI_VOCABULARY_DIR`: directory of option sets (default: "vocabularies")
/// - `ESAVI_OUTPUT_DIR`: directory for rendered responses (default: "out")
///
/// # Returns
/// * `Ok(())` - If the run completed, even when individual records failed
/// * `Err(anyhow::Error)` - If configuration, preload or directory access fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = RunSettings::from_env();
    tracing::info!("++ Reading records from {}", settings.input_dir.display());
    tracing::info!("++ Writing responses to {}", settings.output_dir.display());

    let summary = run(&settings).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn run(settings: &RunSettings) -> anyhow::Result<RunSummary> {
    let started_at = Utc::now();
    let service = MappingService::new(Arc::new(settings.mapping_config()?));

    preload(&service, &settings.vocabulary_dir).await?;

    let records = Arc::new(JsonDirectorySource::new(&settings.input_dir));
    let ids = records
        .ids()
        .with_context(|| format!("listing {}", settings.input_dir.display()))?;

    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating {}", settings.output_dir.display()))?;

    let tasks: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = service.clone();
            let records = Arc::clone(&records);
            let output_dir = settings.output_dir.clone();
            let handle = tokio::task::spawn_blocking({
                let id = id.clone();
                move || convert_one(&service, &records, &output_dir, &id)
            });
            (id, handle)
        })
        .collect();

    let mut converted = 0;
    let mut validation_issues = 0;
    let mut failed = Vec::new();

    for (subject_id, handle) in tasks {
        match handle.await? {
            Ok(issues) => {
                converted += 1;
                validation_issues += issues;
            }
            Err(e) => {
                tracing::error!("Conversion of {} failed: {:#}", subject_id, e);
                failed.push(FailedRecord {
                    subject_id,
                    error: format!("{e:#}"),
                });
            }
        }
    }

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        converted,
        validation_issues,
        failed,
    })
}

/// Fetch every configured vocabulary set concurrently into the shared cache.
async fn preload(service: &MappingService, dir: &Path) -> anyhow::Result<()> {
    let source = Arc::new(JsonDirectorySource::new(dir));

    let tasks: Vec<_> = service
        .config()
        .preload_vocabularies()
        .iter()
        .cloned()
        .map(|set_id| {
            let service = service.clone();
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || {
                service
                    .preload_one(source.as_ref(), &set_id)
                    .with_context(|| format!("preloading vocabulary set {set_id}"))
            })
        })
        .collect();

    for task in tasks {
        task.await??;
    }

    tracing::info!("++ Preloaded {} vocabulary sets", service.cache().ids().len());
    Ok(())
}

/// Convert one record and write its response. Nothing is written when the build fails.
///
/// # Returns
/// The number of validation issues reported for the document.
fn convert_one(
    service: &MappingService,
    records: &JsonDirectorySource,
    output_dir: &Path,
    subject_id: &str,
) -> anyhow::Result<usize> {
    let document = service.convert(records, subject_id)?;
    let outcome = StructuralValidator.validate(&document);
    let json = QuestionnaireResponse::render(&document)?;

    let path = output_dir.join(format!("{subject_id}{OUTPUT_SUFFIX}"));
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;

    Ok(outcome.issues().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esavi_core::constants::PRELOAD_VOCABULARIES;
    use tempfile::TempDir;

    const STAGE: &str = "sdXW2uQOtxG";

    fn record(subject_id: &str, completed_at: Option<&str>) -> String {
        let completed_at = completed_at
            .map(|ts| format!(r#", "completedAt": "{ts}""#))
            .unwrap_or_default();
        format!(
            r#"{{
                "trackedEntity": "{subject_id}",
                "attributes": [{{ "attribute": "KSr2yTdu1AI", "value": "DEM_{subject_id}" }}],
                "enrollments": [{{
                    "orgUnitName": "Hospital Central",
                    "events": [{{ "programStage": "{STAGE}"{completed_at}, "dataValues": [] }}]
                }}]
            }}"#
        )
    }

    fn settings(root: &Path) -> RunSettings {
        RunSettings {
            config_file: None,
            stage_id: Some(STAGE.into()),
            input_dir: root.join("records"),
            vocabulary_dir: root.join("vocabularies"),
            output_dir: root.join("out"),
        }
    }

    fn seed(root: &Path) {
        let vocabularies = root.join("vocabularies");
        let records = root.join("records");
        std::fs::create_dir_all(&vocabularies).expect("mkdir vocabularies");
        std::fs::create_dir_all(&records).expect("mkdir records");

        for id in PRELOAD_VOCABULARIES {
            std::fs::write(
                vocabularies.join(format!("{id}.json")),
                format!(r#"{{ "id": "{id}", "options": [] }}"#),
            )
            .expect("write option set");
        }

        std::fs::write(
            records.join("good.json"),
            record("good", Some("2023-11-13T16:04:26.573")),
        )
        .expect("write record");
        std::fs::write(records.join("undated.json"), record("undated", None))
            .expect("write record");
    }

    #[tokio::test]
    async fn converts_good_records_and_reports_failures() {
        let root = TempDir::new().expect("Failed to create temp dir");
        seed(root.path());

        let summary = run(&settings(root.path())).await.expect("run");

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].subject_id, "undated");

        let out = root.path().join("out");
        let json = std::fs::read_to_string(out.join("good.fhir.json")).expect("output");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        assert_eq!(value["resourceType"], "QuestionnaireResponse");
        assert_eq!(value["authored"], "2023-11-13");
        assert!(!out.join("undated.fhir.json").exists());
    }

    #[tokio::test]
    async fn missing_vocabulary_aborts_the_run() {
        let root = TempDir::new().expect("Failed to create temp dir");
        seed(root.path());
        std::fs::remove_file(
            root.path()
                .join("vocabularies")
                .join(format!("{}.json", PRELOAD_VOCABULARIES[0])),
        )
        .expect("remove option set");

        assert!(run(&settings(root.path())).await.is_err());
    }

    #[test]
    fn log_directives_target_this_workspace() {
        let targets: Vec<&str> = LOG_DIRECTIVES
            .iter()
            .map(|directive| {
                directive
                    .parse::<tracing_subscriber::filter::Directive>()
                    .expect("valid directive");
                directive.split('=').next().expect("target")
            })
            .collect();

        assert!(targets.contains(&env!("CARGO_CRATE_NAME")));
        assert!(targets.contains(&"esavi_core"));
    }

    #[test]
    fn stage_is_required_without_config_file() {
        let settings = RunSettings {
            stage_id: None,
            ..settings(Path::new("/tmp"))
        };
        assert!(settings.mapping_config().is_err());
    }
}
