//! Parsed theme documents kept by name so repeated exports skip re-reading them.

use crate::theme::read_theme_document;
use deck_core::{Result, ThemeDocument};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Theme documents keyed by the name they were uploaded under.
///
/// The first document stored under a name is kept; later inserts under the
/// same name return the cached one.
#[derive(Debug, Default)]
pub struct TemplateCache {
    documents: RwLock<HashMap<String, Arc<ThemeDocument>>>,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a parsed document, returning whichever one the name now refers to.
    pub fn insert(&self, doc: ThemeDocument) -> Arc<ThemeDocument> {
        let mut documents = match self.documents.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        documents
            .entry(doc.name.clone())
            .or_insert_with(|| Arc::new(doc))
            .clone()
    }

    /// Return the cached document for `name`, parsing `data` on a miss.
    pub fn get_or_load(&self, name: &str, data: Vec<u8>) -> Result<Arc<ThemeDocument>> {
        if let Some(doc) = self.get(name) {
            log::debug!("Theme '{}' served from cache", name);
            return Ok(doc);
        }
        let doc = read_theme_document(name, data)?;
        Ok(self.insert(doc))
    }

    /// Look up a document by name.
    pub fn get(&self, name: &str) -> Option<Arc<ThemeDocument>> {
        let documents = match self.documents.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        documents.get(name).cloned()
    }

    /// Names of cached documents, sorted.
    pub fn names(&self) -> Vec<String> {
        let documents = match self.documents.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut names: Vec<String> = documents.keys().cloned().collect();
        names.sort();
        names
    }
}
