//! Query text resolution.
//!
//! Maps an item's method key to statement text. A miss is a deliberate
//! no-op for the item, never an error, so catalogs can be rolled out
//! incrementally without breaking callers.

use std::collections::{BTreeMap, HashMap};

/// Resolves a method key to query text.
///
/// Key convention: an optional `"Section,"` prefix followed by a name, e.g.
/// `"Orders,GetAll"`. A key without a section scans all sections for the
/// first match.
pub trait QueryCatalog: Send + Sync {
    /// Returns the statement text for the key, or `None` if unknown.
    fn resolve(&self, key: &str) -> Option<String>;
}

/// An in-memory catalog of section/name → statement text.
///
/// Sections are kept sorted so sectionless lookups scan deterministically.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    sections: BTreeMap<String, HashMap<String, String>>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a statement under a section and name, replacing any previous
    /// entry.
    pub fn insert(
        &mut self,
        section: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(name.into(), text.into());
    }

    /// Builder-style insert.
    pub fn with_entry(
        mut self,
        section: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(section, name, text);
        self
    }

    /// Returns the number of entries across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(|names| names.len()).sum()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryCatalog for StaticCatalog {
    fn resolve(&self, key: &str) -> Option<String> {
        match key.split_once(',') {
            Some((section, name)) => self
                .sections
                .get(section.trim())
                .and_then(|names| names.get(name.trim()))
                .cloned(),
            None => {
                let name = key.trim();
                self.sections
                    .values()
                    .find_map(|names| names.get(name).cloned())
            }
        }
    }
}
