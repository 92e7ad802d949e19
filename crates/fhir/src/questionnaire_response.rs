//! FHIR-aligned questionnaire-response models and rendering helpers.
//!
//! This module provides both domain-level types and wire models for the ESAVI
//! questionnaire response, the document produced for each reported case.
//!
//! Responsibilities:
//! - Define public domain-level types for the document tree
//! - Enforce the prune-if-empty invariant at construction time
//! - Define a strict wire model for serialisation
//! - Render the domain document as FHIR R4 JSON
//!
//! Notes:
//! - Nodes are immutable once built; builders compose them bottom-up
//! - A node is never empty: it carries an answer, children, or both

use crate::{CodedConcept, FhirError, FhirResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A single typed answer attached to a document node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Free text.
    String(String),
    /// Date-only value (`YYYY-MM-DD`), passed through as supplied.
    Date(String),
    /// Canonical ISO local time (`HH:MM:SS[.fff]`).
    Time(String),
    /// Whole number.
    Integer(i64),
    /// Native boolean.
    Boolean(bool),
    /// Coded value.
    Coding(CodedConcept),
}

/// One item of the questionnaire-response tree.
///
/// Construct with [`DocumentNode::answered`] for leaves and [`DocumentNode::group`] for
/// sections. `group` discards absent children and returns `None` when nothing is left, so
/// an empty branch can never be attached to its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentNode {
    link_id: String,
    answer: Option<Answer>,
    items: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Creates a leaf carrying exactly one answer.
    pub fn answered(link_id: impl Into<String>, answer: Answer) -> Self {
        Self {
            link_id: link_id.into(),
            answer: Some(answer),
            items: Vec::new(),
        }
    }

    /// Creates a section from optional children.
    ///
    /// # Arguments
    ///
    /// * `link_id` - Identifier of the section in the questionnaire.
    /// * `children` - Child builders' results, in questionnaire order.
    ///
    /// # Returns
    ///
    /// `Some(node)` holding the present children, or `None` when every child is absent.
    pub fn group(
        link_id: impl Into<String>,
        children: impl IntoIterator<Item = Option<DocumentNode>>,
    ) -> Option<Self> {
        let items: Vec<DocumentNode> = children.into_iter().flatten().collect();
        if items.is_empty() {
            return None;
        }

        Some(Self {
            link_id: link_id.into(),
            answer: None,
            items,
        })
    }

    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    pub fn items(&self) -> &[DocumentNode] {
        &self.items
    }

    /// Returns the first node with `link_id` in depth-first order, including `self`.
    pub fn find(&self, link_id: &str) -> Option<&DocumentNode> {
        if self.link_id == link_id {
            return Some(self);
        }
        self.items.iter().find_map(|child| child.find(link_id))
    }

    /// Collects every node with `link_id` in depth-first order, including `self`.
    pub fn find_all<'a>(&'a self, link_id: &str, out: &mut Vec<&'a DocumentNode>) {
        if self.link_id == link_id {
            out.push(self);
        }
        for child in &self.items {
            child.find_all(link_id, out);
        }
    }

    /// Visits every node of this subtree in depth-first order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DocumentNode)) {
        visit(self);
        for child in &self.items {
            child.walk(visit);
        }
    }
}

/// Lifecycle status of a questionnaire response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    /// All answers have been supplied.
    Completed,
}

/// Business identifier of the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Namespace of the identifier value.
    pub system: String,

    /// The identifier value itself.
    pub value: String,
}

/// The finished ESAVI questionnaire response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Subject (case) id; also used as the resource id.
    pub subject_id: String,

    /// Authored date (`YYYY-MM-DD`).
    pub authored: String,

    /// Document status; always completed for mapped cases.
    pub status: DocumentStatus,

    /// External case identifier, when the case number is known.
    pub identifier: Option<Identifier>,

    /// Generated XHTML narrative (a single `<div>`).
    pub narrative: String,

    /// Canonical URL of the structure-definition profile.
    pub profile: String,

    /// Canonical URL of the questionnaire answered.
    pub questionnaire: String,

    /// Top-level sections, in questionnaire order.
    pub items: Vec<DocumentNode>,
}

impl Document {
    /// Returns the first node with `link_id` anywhere in the document.
    pub fn find(&self, link_id: &str) -> Option<&DocumentNode> {
        self.items.iter().find_map(|item| item.find(link_id))
    }

    /// Returns every node with `link_id` anywhere in the document.
    pub fn find_all(&self, link_id: &str) -> Vec<&DocumentNode> {
        let mut out = Vec::new();
        for item in &self.items {
            item.find_all(link_id, &mut out);
        }
        out
    }
}

// ============================================================================
// Public QuestionnaireResponse operations
// ============================================================================

/// Questionnaire-response rendering operations.
///
/// This is a zero-sized type used for namespacing rendering operations.
/// All methods are associated functions.
pub struct QuestionnaireResponse;

impl QuestionnaireResponse {
    /// Resource type name on the wire.
    pub const RESOURCE_TYPE: &'static str = "QuestionnaireResponse";

    /// Render a document as pretty-printed FHIR R4 JSON.
    ///
    /// # Arguments
    ///
    /// * `document` - The finished document.
    ///
    /// # Returns
    ///
    /// Returns the JSON text of a `QuestionnaireResponse` resource.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the subject id or authored date is blank,
    /// - serialisation fails.
    pub fn render(document: &Document) -> FhirResult<String> {
        let wire = domain_to_wire(document)?;
        serde_json::to_string_pretty(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise response: {e}")))
    }

    /// Convert a document into a JSON value, for embedding in other resources.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] under the same conditions as [`QuestionnaireResponse::render`].
    pub fn to_value(document: &Document) -> FhirResult<serde_json::Value> {
        let wire = domain_to_wire(document)?;
        Ok(serde_json::to_value(&wire)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a `QuestionnaireResponse` resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct QuestionnaireResponseWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    pub meta: MetaWire,

    pub text: NarrativeWire,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    pub questionnaire: String,

    pub status: DocumentStatus,

    pub authored: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<ItemWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct MetaWire {
    pub profile: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct NarrativeWire {
    pub status: String,
    pub div: String,
}

/// Wire representation of one response item.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ItemWire {
    #[serde(rename = "linkId")]
    pub link_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer: Vec<AnswerWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<ItemWire>,
}

/// Wire representation of an answer: exactly one `value[x]` member.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
enum AnswerWire {
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueDate")]
    Date(String),
    #[serde(rename = "valueTime")]
    Time(String),
    #[serde(rename = "valueInteger")]
    Integer(i64),
    #[serde(rename = "valueBoolean")]
    Boolean(bool),
    #[serde(rename = "valueCoding")]
    Coding(CodedConcept),
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn answer_to_wire(answer: &Answer) -> AnswerWire {
    match answer {
        Answer::String(v) => AnswerWire::String(v.clone()),
        Answer::Date(v) => AnswerWire::Date(v.clone()),
        Answer::Time(v) => AnswerWire::Time(v.clone()),
        Answer::Integer(v) => AnswerWire::Integer(*v),
        Answer::Boolean(v) => AnswerWire::Boolean(*v),
        Answer::Coding(c) => AnswerWire::Coding(c.clone()),
    }
}

fn node_to_wire(node: &DocumentNode) -> ItemWire {
    ItemWire {
        link_id: node.link_id.clone(),
        answer: node.answer.iter().map(answer_to_wire).collect(),
        item: node.items.iter().map(node_to_wire).collect(),
    }
}

/// Convert the domain document to its wire form, validating required metadata.
fn domain_to_wire(document: &Document) -> FhirResult<QuestionnaireResponseWire> {
    if document.subject_id.trim().is_empty() {
        return Err(FhirError::InvalidInput(
            "questionnaire response requires a subject id".into(),
        ));
    }

    if document.authored.trim().is_empty() {
        return Err(FhirError::InvalidInput(
            "questionnaire response requires an authored date".into(),
        ));
    }

    Ok(QuestionnaireResponseWire {
        resource_type: QuestionnaireResponse::RESOURCE_TYPE.to_string(),
        id: document.subject_id.clone(),
        meta: MetaWire {
            profile: vec![document.profile.clone()],
        },
        text: NarrativeWire {
            status: "generated".to_string(),
            div: document.narrative.clone(),
        },
        identifier: document.identifier.clone(),
        questionnaire: document.questionnaire.clone(),
        status: document.status,
        authored: document.authored.clone(),
        item: document.items.iter().map(node_to_wire).collect(),
    })
}
