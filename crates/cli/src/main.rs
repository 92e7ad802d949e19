use clap::{Parser, Subcommand};
use esavi_core::{
    DocumentValidator, JsonDirectorySource, MappingConfig, MappingService, SourceRecord,
    StructuralValidator, VocabularySource,
};
use fhir::{Bundle, QuestionnaireResponse};
use std::path::PathBuf;
use std::sync::Arc;

/// Default log level for the mapping engine, applied on top of `RUST_LOG`.
const LOG_DIRECTIVE: &str = "esavi_core=warn";

#[derive(Parser)]
#[command(name = "esavi")]
#[command(about = "ESAVI case record to FHIR QuestionnaireResponse converter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one tracker record file and print the FHIR JSON
    Convert {
        /// Tracker record JSON file
        record: PathBuf,
        /// Directory holding one `<id>.json` option set per vocabulary
        #[arg(long)]
        vocabularies: PathBuf,
        /// Program stage carrying the completion timestamp (overrides the config file)
        #[arg(long)]
        stage: Option<String>,
        /// YAML mapping configuration (optional)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Wrap the response in a batch Bundle
        #[arg(long)]
        bundle: bool,
    },
    /// List the vocabulary sets found in a directory
    Vocabularies {
        /// Directory holding `<id>.json` option sets
        dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            record,
            vocabularies,
            stage,
            config,
            bundle,
        }) => {
            let config = match config {
                Some(path) => {
                    MappingConfig::from_yaml(&std::fs::read_to_string(path)?, stage.as_deref())?
                }
                None => match stage {
                    Some(stage) => MappingConfig::new(stage)?,
                    None => {
                        eprintln!("Error: either --stage or --config is required");
                        std::process::exit(2);
                    }
                },
            };

            let service = MappingService::new(Arc::new(config));
            service.preload(&JsonDirectorySource::new(vocabularies))?;

            let record = SourceRecord::from_json(&std::fs::read_to_string(&record)?)?;
            let document = match service.build(&record) {
                Ok(document) => document,
                Err(e) => {
                    eprintln!("Error converting {}: {}", record.subject_id, e);
                    std::process::exit(1);
                }
            };

            for issue in StructuralValidator.validate(&document).issues() {
                eprintln!("{}", issue);
            }

            if bundle {
                let value = Bundle::batch([&document])?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", QuestionnaireResponse::render(&document)?);
            }
        }
        Some(Commands::Vocabularies { dir }) => {
            let source = JsonDirectorySource::new(dir);
            let ids = source.ids()?;
            if ids.is_empty() {
                println!("No vocabulary sets found.");
            } else {
                for id in ids {
                    match source.fetch_vocabulary(&id) {
                        Ok(set) => println!("ID: {}, Options: {}", set.id(), set.len()),
                        Err(e) => eprintln!("Error reading {}: {}", id, e),
                    }
                }
            }
        }
        None => {
            println!("Use 'esavi --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directive_targets_the_engine_crate() {
        LOG_DIRECTIVE
            .parse::<tracing_subscriber::filter::Directive>()
            .expect("valid directive");
        assert_eq!(LOG_DIRECTIVE.split('=').next(), Some("esavi_core"));
    }

    #[test]
    fn convert_requires_vocabulary_directory() {
        assert!(Cli::try_parse_from(["esavi", "convert", "record.json"]).is_err());

        let cli = Cli::try_parse_from([
            "esavi",
            "convert",
            "record.json",
            "--vocabularies",
            "vocab",
            "--stage",
            "sdXW2uQOtxG",
            "--bundle",
        ])
        .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Convert { bundle: true, .. })
        ));
    }
}
