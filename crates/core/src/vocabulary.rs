//! Vocabulary sets and the shared vocabulary cache.
//!
//! A vocabulary set maps raw option codes to display labels. Sets are fetched once, before
//! any build needs them, and then read concurrently by every build.
//!
//! The cache is an owned value passed by handle (`Arc<VocabularyCache>`). Registration is
//! idempotent per set id: the first registration wins and later ones are ignored, so
//! concurrent preloads may finish in any order.

use crate::source::describe_path_error;
use crate::{MappingError, MappingResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// An immutable code → label mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VocabularySet {
    id: String,
    entries: HashMap<String, String>,
}

impl VocabularySet {
    /// Creates a set from `(code, label)` pairs. A repeated code keeps its last label.
    pub fn new(
        id: impl Into<String>,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            id: id.into(),
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a DHIS2 option set (`{ "id", "options": [{ "code", "name" }] }`).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Deserialization`] when the JSON is not an option set, or
    /// [`MappingError::InvalidInput`] when the id is blank.
    pub fn from_json(json_text: &str) -> MappingResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire: OptionSetWire = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| MappingError::Deserialization(describe_path_error(err)))?;

        if wire.id.trim().is_empty() {
            return Err(MappingError::InvalidInput(
                "option set id cannot be empty".into(),
            ));
        }

        Ok(Self::new(
            wire.id,
            wire.options
                .into_iter()
                .map(|option| (option.code, option.name)),
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wire shape of a DHIS2 option set.
#[derive(Debug, Deserialize, Serialize)]
struct OptionSetWire {
    id: String,
    #[serde(default)]
    options: Vec<OptionWire>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OptionWire {
    code: String,
    name: String,
}

/// Shared, write-once-per-id store of vocabulary sets.
#[derive(Debug, Default)]
pub struct VocabularyCache {
    sets: RwLock<HashMap<String, Arc<VocabularySet>>>,
}

impl VocabularyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vocabulary set unless one with the same id is already present.
    ///
    /// # Returns
    ///
    /// `true` if the set was stored, `false` if an earlier registration is kept.
    pub fn register(&self, set: VocabularySet) -> bool {
        // A panicking writer can only have left a fully inserted entry or none.
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);

        if sets.contains_key(set.id()) {
            tracing::debug!("vocabulary set {} already registered; ignoring", set.id());
            return false;
        }

        tracing::info!(
            "registered vocabulary set {} ({} entries)",
            set.id(),
            set.len()
        );
        sets.insert(set.id().to_string(), Arc::new(set));
        true
    }

    /// Returns the set registered under `set_id`.
    pub fn get(&self, set_id: &str) -> Option<Arc<VocabularySet>> {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        sets.get(set_id).cloned()
    }

    pub fn contains(&self, set_id: &str) -> bool {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        sets.contains_key(set_id)
    }

    /// Returns the label of `code` in `set_id`, or `None` if either is unknown.
    pub fn lookup(&self, set_id: &str, code: &str) -> Option<String> {
        self.get(set_id)
            .and_then(|set| set.label(code).map(str::to_string))
    }

    /// Ids of every registered set, sorted.
    pub fn ids(&self) -> Vec<String> {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = sets.keys().cloned().collect();
        ids.sort();
        ids
    }
}
