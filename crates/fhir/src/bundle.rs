//! Transaction envelope for submitting questionnaire responses.
//!
//! Responses are submitted to the FHIR server as a `batch` bundle with one conditional
//! `PUT` per response, keyed on the subject id. Re-submitting the same case updates the
//! existing resource instead of creating a duplicate.

use crate::{Document, FhirResult, QuestionnaireResponse};
use serde::{Deserialize, Serialize};

/// Bundle rendering operations.
///
/// This is a zero-sized type used for namespacing rendering operations.
pub struct Bundle;

impl Bundle {
    /// Render documents as a FHIR `batch` bundle.
    ///
    /// Each entry receives a fresh `urn:uuid:` full URL and a conditional `PUT` request
    /// `QuestionnaireResponse?identifier={subject_id}`.
    ///
    /// # Arguments
    ///
    /// * `documents` - Finished documents to submit, in output order.
    ///
    /// # Returns
    ///
    /// Returns the bundle as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if any document fails to render.
    pub fn batch<'a>(
        documents: impl IntoIterator<Item = &'a Document>,
    ) -> FhirResult<serde_json::Value> {
        let entry = documents
            .into_iter()
            .map(|document| {
                Ok(EntryWire {
                    full_url: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
                    resource: QuestionnaireResponse::to_value(document)?,
                    request: RequestWire {
                        method: "PUT".to_string(),
                        url: format!(
                            "{}?identifier={}",
                            QuestionnaireResponse::RESOURCE_TYPE,
                            document.subject_id
                        ),
                    },
                })
            })
            .collect::<FhirResult<Vec<_>>>()?;

        let wire = BundleWire {
            resource_type: "Bundle".to_string(),
            bundle_type: "batch".to_string(),
            entry,
        };

        Ok(serde_json::to_value(&wire)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: String,

    #[serde(default)]
    pub entry: Vec<EntryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct EntryWire {
    #[serde(rename = "fullUrl")]
    pub full_url: String,

    pub resource: serde_json::Value,

    pub request: RequestWire,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct RequestWire {
    pub method: String,
    pub url: String,
}
