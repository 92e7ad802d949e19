//! Document validation.
//!
//! A validator inspects a finished [`Document`] and reports what it finds. It never mutates the
//! document and never fails the build; the caller decides what to do with the issues.

use chrono::NaiveDate;
use fhir::{Document, DocumentNode};
use std::fmt;

/// How serious a validation finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Everything a validator found in one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    issues: Vec<Issue>,
}

impl ValidationOutcome {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// True when no finding has [`Severity::Error`].
    pub fn is_valid(&self) -> bool {
        self.issues
            .iter()
            .all(|issue| issue.severity < Severity::Error)
    }
}

/// Checks a document before it is handed on.
pub trait DocumentValidator: Send + Sync {
    fn validate(&self, document: &Document) -> ValidationOutcome;
}

/// Local checks that need no remote validation service.
///
/// Errors:
/// - blank subject id,
/// - `authored` that is not a calendar date,
/// - any node with neither an answer nor children.
///
/// Warnings: a document without a business identifier, or without any section.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralValidator;

impl DocumentValidator for StructuralValidator {
    fn validate(&self, document: &Document) -> ValidationOutcome {
        let mut issues = Vec::new();

        if document.subject_id.trim().is_empty() {
            issues.push(Issue::error("subject id is empty"));
        }

        if NaiveDate::parse_from_str(&document.authored, "%Y-%m-%d").is_err() {
            issues.push(Issue::error(format!(
                "authored {:?} is not a YYYY-MM-DD date",
                document.authored
            )));
        }

        if document.identifier.is_none() {
            issues.push(Issue::warning("document has no case number identifier"));
        }

        if document.items.is_empty() {
            issues.push(Issue::warning("document has no sections"));
        }

        let mut empty = Vec::new();
        for item in &document.items {
            item.walk(&mut |node: &DocumentNode| {
                if node.answer().is_none() && node.items().is_empty() {
                    empty.push(node.link_id().to_string());
                }
            });
        }
        issues.extend(
            empty
                .into_iter()
                .map(|link_id| Issue::error(format!("node {link_id} is empty"))),
        );

        for issue in &issues {
            tracing::warn!("{} failed validation: {issue}", document.subject_id);
        }

        ValidationOutcome { issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{Answer, DocumentStatus, Identifier};

    fn document(authored: &str, items: Vec<DocumentNode>) -> Document {
        Document {
            subject_id: "PQfMcpmXeFE".into(),
            authored: authored.into(),
            status: DocumentStatus::Completed,
            identifier: Some(Identifier {
                system: "http://ops.org/esavi/PRY".into(),
                value: "DEM_2023_11_09_000002".into(),
            }),
            narrative: "<div>RESPUESTA A CUESTIONARIO ID DEM_2023_11_09_000002</div>".into(),
            profile: "profile".into(),
            questionnaire: "questionnaire".into(),
            items,
        }
    }

    fn section() -> DocumentNode {
        DocumentNode::group(
            "fechas",
            [Some(DocumentNode::answered(
                "fechaNotificacion",
                Answer::Date("2023-11-13".into()),
            ))],
        )
        .expect("non-empty group")
    }

    #[test]
    fn well_formed_document_passes() {
        let outcome = StructuralValidator.validate(&document("2023-11-13", vec![section()]));
        assert!(outcome.is_valid());
        assert!(outcome.issues().is_empty());
    }

    #[test]
    fn bad_authored_date_is_an_error() {
        let outcome = StructuralValidator.validate(&document("13/11/2023", vec![section()]));
        assert!(!outcome.is_valid());
        assert!(outcome.issues()[0].message.contains("13/11/2023"));
    }

    #[test]
    fn missing_identifier_and_sections_are_warnings() {
        let mut doc = document("2023-11-13", Vec::new());
        doc.identifier = None;

        let outcome = StructuralValidator.validate(&doc);
        assert!(outcome.is_valid());
        assert_eq!(outcome.issues().len(), 2);
        assert!(outcome
            .issues()
            .iter()
            .all(|issue| issue.severity == Severity::Warning));
    }
}
