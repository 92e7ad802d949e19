//! Source case record.
//!
//! Records arrive as DHIS2 tracker JSON: a tracked entity with attribute values and
//! enrollments, each enrollment holding the events of the ESAVI program stage. Only the
//! members read by the mapping are modelled; tracker payloads carry many more, which are
//! ignored.

use crate::{MappingError, MappingResult};
use serde::{Deserialize, Serialize};

/// One tracked entity (a reported case).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Tracked-entity id; becomes the document id.
    #[serde(rename = "trackedEntity")]
    pub subject_id: String,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

/// A tracked-entity attribute value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "attribute")]
    pub field_id: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Display name of the reporting organisation unit.
    #[serde(default)]
    pub org_unit_name: Option<String>,

    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "programStage", default)]
    pub stage_id: String,

    /// Completion timestamp, `YYYY-MM-DDTHH:MM:SS.fff` in local time.
    #[serde(default, alias = "completedDate")]
    pub completed_at: Option<String>,

    #[serde(rename = "dataValues", default)]
    pub observations: Vec<Observation>,
}

/// A data value captured on an event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "dataElement")]
    pub field_id: String,

    #[serde(default)]
    pub value: String,
}

impl SourceRecord {
    /// Parse a record from tracker JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Deserialization`] naming the failing path when the JSON does not
    /// match the tracker shape.
    pub fn from_json(json_text: &str) -> MappingResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| MappingError::Deserialization(describe_path_error(err)))
    }
}

/// Formats a `serde_path_to_error` failure as `"<path>: <reason>"`.
pub(crate) fn describe_path_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> String {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    format!("schema mismatch at {path}: {source}")
}
