//! Document builder.
//!
//! Assembles the ESAVI questionnaire response from a [`RecordView`]. Each top-level section
//! has its own module; all of them share the leaf evaluator and grouping helpers defined here.
//!
//! Every builder returns `MappingResult<Option<DocumentNode>>`:
//! - `Ok(None)` means the node is absent (source value missing, or a section with no children),
//! - `Err(_)` aborts the whole build; there is no partial document.

mod medical_history;
mod medication;
mod notification;
mod patient;
mod registration;

use crate::catalog::{LeafKind, LeafRule, Source, CASE_NUMBER};
use crate::config::MappingConfig;
use crate::constants::{NARRATIVE_PLACEHOLDER, PROFILE_URL, QUESTIONNAIRE_URL};
use crate::context::RecordView;
use crate::error::{optional, LookupKind};
use crate::pseudonym::pseudonymise;
use crate::resolvers::{self, Ternary};
use crate::terminology::Terminology;
use crate::{MappingError, MappingResult};
use chrono::NaiveTime;
use fhir::{Answer, CodedConcept, Document, DocumentNode, DocumentStatus, Identifier};

/// Input layouts accepted for times of day.
const TIME_INPUT_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// ISO local-time layout before trailing fractional zeros are dropped.
const TIME_OUTPUT_FORMAT: &str = "%H:%M:%S%.9f";

/// Builds documents against one configuration and terminology.
#[derive(Clone, Copy, Debug)]
pub struct DocumentBuilder<'a> {
    config: &'a MappingConfig,
    terminology: &'a Terminology,
}

/// Everything a section builder reads.
pub(crate) struct Inputs<'a> {
    pub view: &'a dyn RecordView,
    pub config: &'a MappingConfig,
    pub terminology: &'a Terminology,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(config: &'a MappingConfig, terminology: &'a Terminology) -> Self {
        Self {
            config,
            terminology,
        }
    }

    /// Build the questionnaire response for one record.
    ///
    /// # Arguments
    ///
    /// * `view` - Indexed view of the source record.
    ///
    /// # Returns
    ///
    /// The complete document, with every empty branch pruned.
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] met:
    /// - `NotFound` when the completion date, the enrollment, or a required label is missing,
    /// - `MalformedInput` when a time of day or integer cannot be parsed,
    /// - `ConfigurationDefect` when a required vocabulary set was never preloaded.
    pub fn build(&self, view: &dyn RecordView) -> MappingResult<Document> {
        let inputs = Inputs {
            view,
            config: self.config,
            terminology: self.terminology,
        };

        let authored = view
            .completion_date()
            .ok_or_else(|| MappingError::not_found(LookupKind::CompletionDate, view.subject_id()))?
            .to_string();

        let case_number = optional(view.attribute(CASE_NUMBER))?;
        let identifier = case_number.map(|value| Identifier {
            system: self.config.identifier_system().to_string(),
            value: value.to_string(),
        });

        let items = [
            notification::section(&inputs)?,
            patient::section(&inputs)?,
            medical_history::section(&inputs)?,
            medication::section(&inputs)?,
            registration::section(&inputs)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        tracing::info!("built questionnaire response for {}", view.subject_id());

        Ok(Document {
            subject_id: view.subject_id().to_string(),
            authored,
            status: DocumentStatus::Completed,
            identifier,
            narrative: narrative(case_number),
            profile: PROFILE_URL.to_string(),
            questionnaire: QUESTIONNAIRE_URL.to_string(),
            items,
        })
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Section node from optional children; `None` (and a debug log) when all are absent.
pub(crate) fn group(
    link_id: &str,
    children: impl IntoIterator<Item = Option<DocumentNode>>,
) -> Option<DocumentNode> {
    let node = DocumentNode::group(link_id, children);
    if node.is_none() {
        tracing::debug!("pruned empty section {link_id}");
    }
    node
}

pub(crate) fn coded(link_id: &str, concept: CodedConcept) -> DocumentNode {
    DocumentNode::answered(link_id, Answer::Coding(concept))
}

pub(crate) fn text(link_id: &str, value: impl Into<String>) -> DocumentNode {
    DocumentNode::answered(link_id, Answer::String(value.into()))
}

/// Evaluate one presence-gated leaf.
///
/// # Errors
///
/// Propagates label lookups that fail and time or integer values that do not parse.
pub(crate) fn leaf(inputs: &Inputs<'_>, rule: &LeafRule) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let raw = match rule.source {
        Source::Attribute(id) => optional(view.attribute(id))?,
        Source::Observation(id) => optional(view.observation(id))?,
    };
    let Some(raw) = raw else {
        return Ok(None);
    };

    let answer = match rule.kind {
        LeafKind::Text => Answer::String(raw.to_string()),
        LeafKind::Date => Answer::Date(raw.to_string()),
        LeafKind::Time => Answer::Time(normalise_time(rule.link_id, raw)?),
        LeafKind::Integer => Answer::Integer(parse_integer(rule.link_id, raw)?),
        LeafKind::Ternary => match resolvers::ternary(raw) {
            Some(ternary) => Answer::Coding(ternary.coding()),
            None => {
                tracing::debug!("no yes/no/unknown mapping for {} = {raw:?}", rule.link_id);
                return Ok(None);
            }
        },
        LeafKind::BooleanTernary => {
            Answer::Coding(Ternary::from_bool(resolvers::parse_boolean_text(raw)).coding())
        }
        LeafKind::Label(set_id) => Answer::String(view.option(set_id, raw)?),
        LeafKind::LabelOrCode(set_id) => Answer::String(view.option_or(set_id, raw, raw)),
        LeafKind::Pseudonym => Answer::String(pseudonymise(raw)),
    };

    Ok(Some(DocumentNode::answered(rule.link_id, answer)))
}

/// Evaluate a run of leaves in order, keeping absent ones as `None`.
pub(crate) fn leaves(
    inputs: &Inputs<'_>,
    rules: &[LeafRule],
) -> MappingResult<Vec<Option<DocumentNode>>> {
    rules.iter().map(|rule| leaf(inputs, rule)).collect()
}

/// Parse a time of day and render it as canonical ISO local time.
///
/// Fractional seconds keep only their significant digits (`08:05:09.250` becomes
/// `08:05:09.25`) and are omitted when zero.
///
/// # Errors
///
/// Returns [`MappingError::MalformedInput`] when no accepted layout matches.
pub(crate) fn normalise_time(field: &str, raw: &str) -> MappingResult<String> {
    let trimmed = raw.trim();
    TIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .map(|time| {
            time.format(TIME_OUTPUT_FORMAT)
                .to_string()
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        })
        .ok_or_else(|| MappingError::malformed(field, raw, "expected HH:MM or HH:MM:SS[.fff]"))
}

fn parse_integer(field: &str, raw: &str) -> MappingResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| MappingError::malformed(field, raw, e))
}

fn narrative(case_number: Option<&str>) -> String {
    let id = case_number.unwrap_or(NARRATIVE_PLACEHOLDER);
    format!("<div>RESPUESTA A CUESTIONARIO ID {}</div>", escape_xhtml(id))
}

fn escape_xhtml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the section builder tests.

    use crate::config::MappingConfig;
    use crate::constants::PRELOAD_VOCABULARIES;
    use crate::context::MappingContext;
    use crate::source::{Attribute, Enrollment, Event, Observation, SourceRecord};
    use crate::terminology::Terminology;
    use crate::vocabulary::{VocabularyCache, VocabularySet};

    pub const STAGE: &str = "sdXW2uQOtxG";

    /// Record with one enrollment and one target-stage event.
    pub fn record(attributes: &[(&str, &str)], observations: &[(&str, &str)]) -> SourceRecord {
        SourceRecord {
            subject_id: "PQfMcpmXeFE".into(),
            attributes: attributes
                .iter()
                .map(|(id, v)| Attribute {
                    field_id: id.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            enrollments: vec![Enrollment {
                org_unit_name: Some("Hospital Central".into()),
                events: vec![Event {
                    stage_id: STAGE.into(),
                    completed_at: Some("2023-11-13T16:04:26.573".into()),
                    observations: observations
                        .iter()
                        .map(|(id, v)| Observation {
                            field_id: id.to_string(),
                            value: v.to_string(),
                        })
                        .collect(),
                }],
            }],
        }
    }

    /// Cache with every preload set registered, each holding `entries`.
    pub fn cache(entries: &[(&str, &str)]) -> VocabularyCache {
        let cache = VocabularyCache::new();
        for id in PRELOAD_VOCABULARIES {
            cache.register(VocabularySet::new(
                id,
                entries
                    .iter()
                    .map(|(code, label)| (code.to_string(), label.to_string())),
            ));
        }
        cache
    }

    pub fn config() -> MappingConfig {
        MappingConfig::new(STAGE).expect("valid config")
    }

    pub fn terminology(config: &MappingConfig) -> Terminology {
        Terminology::pass_through(config.terminology())
    }

    pub fn context<'a>(record: &'a SourceRecord, cache: &'a VocabularyCache) -> MappingContext<'a> {
        MappingContext::new(record, cache, STAGE).expect("context")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::catalog::PATIENT_IDENTIFIER;

    fn build(record: &crate::source::SourceRecord) -> MappingResult<Document> {
        let cache = cache(&[]);
        let config = config();
        let terminology = terminology(&config);
        let ctx = context(record, &cache);
        DocumentBuilder::new(&config, &terminology).build(&ctx)
    }

    #[test]
    fn minimal_record_yields_dates_and_no_optional_sections() {
        let document = build(&record(&[], &[])).expect("build");

        assert_eq!(document.authored, "2023-11-13");
        for link_id in ["fechaNotificacion", "fechaLlenadoFicha", "fechaRepoNacional"] {
            let node = document.find(link_id).expect("report date present");
            assert_eq!(node.answer(), Some(&Answer::Date("2023-11-13".into())));
        }

        assert!(document.find("antecedentesMedicos").is_none());
        assert!(document.find("antecedentesFarmacosVacunas").is_none());
        assert!(document.find("causalidadESAVI").is_none());
        assert!(document.find("sistemaClasfcausalidad").is_none());
        assert!(document.find("gravMuerte").is_none());
        assert!(document.find("fechaConsulta").is_none());
        assert!(document.identifier.is_none());
        assert_eq!(
            document.narrative,
            "<div>RESPUESTA A CUESTIONARIO ID N/A</div>"
        );
    }

    #[test]
    fn no_node_in_the_tree_is_empty() {
        let document = build(&record(&[], &[])).expect("build");
        for item in &document.items {
            item.walk(&mut |node| {
                assert!(
                    node.answer().is_some() || !node.items().is_empty(),
                    "empty node {}",
                    node.link_id()
                );
            });
        }
    }

    #[test]
    fn missing_completion_date_fails_build() {
        let mut rec = record(&[], &[]);
        rec.enrollments[0].events[0].completed_at = None;

        let err = build(&rec).expect_err("no authored date");
        assert!(matches!(
            err,
            MappingError::NotFound {
                kind: LookupKind::CompletionDate,
                ..
            }
        ));
    }

    #[test]
    fn case_number_sets_identifier_and_narrative() {
        let document = build(&record(&[(CASE_NUMBER, "DEM_2023_11_09_000002")], &[]))
            .expect("build");

        let identifier = document.identifier.as_ref().expect("identifier");
        assert_eq!(identifier.system, "http://ops.org/esavi/PRY");
        assert_eq!(identifier.value, "DEM_2023_11_09_000002");
        assert_eq!(
            document.narrative,
            "<div>RESPUESTA A CUESTIONARIO ID DEM_2023_11_09_000002</div>"
        );
    }

    #[test]
    fn patient_identifier_is_never_emitted_verbatim() {
        let document = build(&record(&[(PATIENT_IDENTIFIER, "ABC123")], &[])).expect("build");

        let node = document.find("idPaciente").expect("idPaciente");
        assert_eq!(
            node.answer(),
            Some(&Answer::String("bbf2dead374654cbb32a917afd236656".into()))
        );

        let json = fhir::QuestionnaireResponse::render(&document).expect("render");
        assert!(!json.contains("ABC123"));
    }

    #[test]
    fn times_are_normalised() {
        assert_eq!(normalise_time("t", "10:30").expect("hh:mm"), "10:30:00");
        assert_eq!(normalise_time("t", "08:05:09").expect("hh:mm:ss"), "08:05:09");
        assert_eq!(
            normalise_time("t", "08:05:09.250").expect("fraction"),
            "08:05:09.25"
        );
        assert_eq!(normalise_time("t", "08:05:09.100").expect("tenths"), "08:05:09.1");
        assert_eq!(normalise_time("t", "08:05:10.000").expect("zero"), "08:05:10");
        assert_eq!(normalise_time("t", "00:00").expect("midnight"), "00:00:00");
        assert!(matches!(
            normalise_time("horaVacunacion", "25:99"),
            Err(MappingError::MalformedInput { .. })
        ));
    }

    #[test]
    fn narrative_escapes_markup() {
        assert_eq!(
            narrative(Some("A<B&C")),
            "<div>RESPUESTA A CUESTIONARIO ID A&lt;B&amp;C</div>"
        );
    }
}
