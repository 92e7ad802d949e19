//! Per-record lookup context.
//!
//! [`MappingContext`] flattens one [`SourceRecord`] into attribute and observation maps and
//! resolves the report completion date. Builders read it through the [`RecordView`] trait,
//! the single adapter between a record shape and the document builder.
//!
//! Presence is "key exists and value is non-blank" throughout: a blank value is treated
//! exactly like a missing one.

use crate::error::LookupKind;
use crate::source::{Enrollment, SourceRecord};
use crate::vocabulary::VocabularyCache;
use crate::{MappingError, MappingResult};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Accepted layout of event completion timestamps.
const COMPLETED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Layout of the derived report completion date.
const COMPLETION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Read-only view of one case record, as consumed by the document builder.
pub trait RecordView {
    /// Id of the subject (tracked entity) being mapped.
    fn subject_id(&self) -> &str;

    fn has_attribute(&self, id: &str) -> bool;

    /// Returns the attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NotFound`] when the attribute is absent or blank.
    fn attribute(&self, id: &str) -> MappingResult<&str>;

    fn has_observation(&self, id: &str) -> bool;

    /// Returns the latest observed value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NotFound`] when the observation is absent or blank.
    fn observation(&self, id: &str) -> MappingResult<&str>;

    /// Returns true when `set_id` is loaded and contains `code`.
    fn has_option(&self, set_id: &str, code: &str) -> bool;

    /// Returns the display label of `code` in `set_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ConfigurationDefect`] when the set was never preloaded and
    /// [`MappingError::NotFound`] when the set lacks the code.
    fn option(&self, set_id: &str, code: &str) -> MappingResult<String>;

    /// Name of the first enrollment's organisation unit. `Ok(None)` when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NotFound`] when the record has no enrollment.
    fn enrollment_org_unit_name(&self) -> MappingResult<Option<&str>>;

    /// Report completion date (`YYYY-MM-DD`), when the target-stage event was found.
    fn completion_date(&self) -> Option<&str>;

    fn attribute_or<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        self.attribute(id).unwrap_or(default)
    }

    fn observation_or<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        self.observation(id).unwrap_or(default)
    }

    /// Returns the label of `code`, or `default` when the set or code is unknown.
    fn option_or(&self, set_id: &str, code: &str, default: &str) -> String {
        self.option(set_id, code)
            .unwrap_or_else(|_| default.to_string())
    }

    /// Boolean observation as text: `"true"` only for the exact value `true`.
    fn observation_as_boolean(&self, id: &str) -> &'static str {
        match self.observation(id) {
            Ok("true") => "true",
            _ => "false",
        }
    }

    fn observation_is_true(&self, id: &str) -> bool {
        self.observation_as_boolean(id) == "true"
    }
}

/// Indexed view over one [`SourceRecord`].
///
/// Built once per document build and never mutated afterwards.
#[derive(Debug)]
pub struct MappingContext<'a> {
    record: &'a SourceRecord,
    vocabularies: &'a VocabularyCache,
    attributes: HashMap<&'a str, &'a str>,
    observations: HashMap<&'a str, &'a str>,
    completion_date: Option<String>,
}

impl<'a> MappingContext<'a> {
    /// Index a record.
    ///
    /// Observations come from every event of the first enrollment; later events override
    /// earlier ones on the same field. The completion date comes from the last event whose
    /// stage equals `target_stage_id` and that carries a timestamp.
    ///
    /// # Arguments
    ///
    /// * `record` - Source case record.
    /// * `vocabularies` - Shared vocabulary cache used for option lookups.
    /// * `target_stage_id` - Program stage carrying the completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MalformedInput`] if the target-stage timestamp cannot be parsed.
    pub fn new(
        record: &'a SourceRecord,
        vocabularies: &'a VocabularyCache,
        target_stage_id: &str,
    ) -> MappingResult<Self> {
        let attributes = record
            .attributes
            .iter()
            .map(|a| (a.field_id.as_str(), a.value.as_str()))
            .collect();

        let mut observations = HashMap::new();
        let mut completion_date = None;

        if let Some(enrollment) = record.enrollments.first() {
            for event in &enrollment.events {
                if event.stage_id == target_stage_id {
                    match event.completed_at.as_deref() {
                        Some(completed_at) => {
                            completion_date = Some(parse_completion_date(completed_at)?);
                        }
                        None => tracing::debug!(
                            "{}: stage {} event has no completion timestamp; skipped",
                            record.subject_id,
                            target_stage_id
                        ),
                    }
                }

                for observation in &event.observations {
                    observations.insert(observation.field_id.as_str(), observation.value.as_str());
                }
            }
        }

        Ok(Self {
            record,
            vocabularies,
            attributes,
            observations,
            completion_date,
        })
    }

    /// The first enrollment of the record.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NotFound`] when the record has no enrollment.
    pub fn enrollment(&self) -> MappingResult<&'a Enrollment> {
        self.record
            .enrollments
            .first()
            .ok_or_else(|| MappingError::not_found(LookupKind::Enrollment, &self.record.subject_id))
    }
}

impl RecordView for MappingContext<'_> {
    fn subject_id(&self) -> &str {
        &self.record.subject_id
    }

    fn has_attribute(&self, id: &str) -> bool {
        has_text(self.attributes.get(id).copied())
    }

    fn attribute(&self, id: &str) -> MappingResult<&str> {
        present(self.attributes.get(id).copied())
            .ok_or_else(|| MappingError::not_found(LookupKind::Attribute, id))
    }

    fn has_observation(&self, id: &str) -> bool {
        has_text(self.observations.get(id).copied())
    }

    fn observation(&self, id: &str) -> MappingResult<&str> {
        present(self.observations.get(id).copied())
            .ok_or_else(|| MappingError::not_found(LookupKind::Observation, id))
    }

    fn has_option(&self, set_id: &str, code: &str) -> bool {
        self.vocabularies
            .get(set_id)
            .is_some_and(|set| set.contains(code))
    }

    fn option(&self, set_id: &str, code: &str) -> MappingResult<String> {
        let set = self
            .vocabularies
            .get(set_id)
            .ok_or_else(|| MappingError::ConfigurationDefect(set_id.to_string()))?;

        set.label(code)
            .map(str::to_string)
            .ok_or_else(|| MappingError::not_found(LookupKind::Option, format!("{set_id}/{code}")))
    }

    fn enrollment_org_unit_name(&self) -> MappingResult<Option<&str>> {
        let enrollment = self.enrollment()?;
        Ok(present(enrollment.org_unit_name.as_deref()))
    }

    fn completion_date(&self) -> Option<&str> {
        self.completion_date.as_deref()
    }
}

fn has_text(value: Option<&str>) -> bool {
    present(value).is_some()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_completion_date(completed_at: &str) -> MappingResult<String> {
    NaiveDateTime::parse_from_str(completed_at, COMPLETED_AT_FORMAT)
        .map(|ts| ts.format(COMPLETION_DATE_FORMAT).to_string())
        .map_err(|e| MappingError::malformed("completedAt", completed_at, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Attribute, Event, Observation};
    use crate::vocabulary::VocabularySet;

    const STAGE: &str = "sdXW2uQOtxG";

    fn event(stage: &str, completed_at: Option<&str>, values: &[(&str, &str)]) -> Event {
        Event {
            stage_id: stage.into(),
            completed_at: completed_at.map(str::to_string),
            observations: values
                .iter()
                .map(|(id, v)| Observation {
                    field_id: id.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    fn record(events: Vec<Event>) -> SourceRecord {
        SourceRecord {
            subject_id: "PQfMcpmXeFE".into(),
            attributes: vec![
                Attribute {
                    field_id: "KSr2yTdu1AI".into(),
                    value: "DEM_2023_11_09_000002".into(),
                },
                Attribute {
                    field_id: "eISp65Kw0Z7".into(),
                    value: "   ".into(),
                },
            ],
            enrollments: vec![Enrollment {
                org_unit_name: Some("Hospital Central".into()),
                events,
            }],
        }
    }

    #[test]
    fn blank_values_are_absent() {
        let cache = VocabularyCache::new();
        let rec = record(vec![]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert!(ctx.has_attribute("KSr2yTdu1AI"));
        assert!(!ctx.has_attribute("eISp65Kw0Z7"));
        assert!(ctx.attribute("eISp65Kw0Z7").is_err());
        assert_eq!(ctx.attribute_or("eISp65Kw0Z7", "default"), "default");
    }

    #[test]
    fn later_events_override_earlier_observations() {
        let cache = VocabularyCache::new();
        let rec = record(vec![
            event("other", None, &[("Tgi4xP5DCzr", "1"), ("IdCrdz34ZBK", "2")]),
            event(STAGE, None, &[("Tgi4xP5DCzr", "3")]),
        ]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert_eq!(ctx.observation("Tgi4xP5DCzr").expect("present"), "3");
        assert_eq!(ctx.observation("IdCrdz34ZBK").expect("present"), "2");
    }

    #[test]
    fn completion_date_comes_from_target_stage() {
        let cache = VocabularyCache::new();
        let rec = record(vec![
            event("other", Some("2022-01-01T00:00:00.000"), &[]),
            event(STAGE, Some("2023-11-13T16:04:26.573"), &[]),
        ]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert_eq!(ctx.completion_date(), Some("2023-11-13"));
    }

    #[test]
    fn target_stage_event_without_timestamp_is_skipped() {
        let cache = VocabularyCache::new();

        let rec = record(vec![
            event(STAGE, Some("2023-11-13T16:04:26.573"), &[]),
            event(STAGE, None, &[("Tgi4xP5DCzr", "1")]),
        ]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");
        assert_eq!(ctx.completion_date(), Some("2023-11-13"));
        assert_eq!(ctx.observation("Tgi4xP5DCzr").expect("present"), "1");

        let rec = record(vec![event(STAGE, None, &[])]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");
        assert_eq!(ctx.completion_date(), None);
    }

    #[test]
    fn malformed_completion_timestamp_is_fatal() {
        let cache = VocabularyCache::new();
        let rec = record(vec![event(STAGE, Some("13/11/2023"), &[])]);

        let err = MappingContext::new(&rec, &cache, STAGE).expect_err("should fail");
        assert!(matches!(err, MappingError::MalformedInput { .. }));
    }

    #[test]
    fn record_without_enrollment_fails_lazily() {
        let cache = VocabularyCache::new();
        let rec = SourceRecord {
            subject_id: "X".into(),
            ..SourceRecord::default()
        };
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert!(ctx.completion_date().is_none());
        let err = ctx.enrollment_org_unit_name().expect_err("no enrollment");
        assert!(matches!(
            err,
            MappingError::NotFound {
                kind: LookupKind::Enrollment,
                ..
            }
        ));
    }

    #[test]
    fn boolean_observations_are_exact_text() {
        let cache = VocabularyCache::new();
        let rec = record(vec![event(
            STAGE,
            None,
            &[("a", "true"), ("b", "TRUE"), ("c", "false")],
        )]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert_eq!(ctx.observation_as_boolean("a"), "true");
        assert_eq!(ctx.observation_as_boolean("b"), "false");
        assert_eq!(ctx.observation_as_boolean("c"), "false");
        assert_eq!(ctx.observation_as_boolean("missing"), "false");
        assert!(ctx.observation_is_true("a"));
    }

    #[test]
    fn option_lookup_distinguishes_missing_set_from_missing_code() {
        let cache = VocabularyCache::new();
        cache.register(VocabularySet::new(
            "TYYlo7IdrCw",
            [("1".to_string(), "Asunción".to_string())],
        ));
        let rec = record(vec![]);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        assert_eq!(ctx.option("TYYlo7IdrCw", "1").expect("label"), "Asunción");
        assert!(matches!(
            ctx.option("TYYlo7IdrCw", "9"),
            Err(MappingError::NotFound {
                kind: LookupKind::Option,
                ..
            })
        ));
        assert!(matches!(
            ctx.option("GUpt2UXm3hR", "1"),
            Err(MappingError::ConfigurationDefect(_))
        ));
        assert!(!ctx.has_option("GUpt2UXm3hR", "1"));
        assert_eq!(ctx.option_or("GUpt2UXm3hR", "1", "1"), "1");
    }
}
