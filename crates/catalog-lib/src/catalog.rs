//! Catalog entries and the read-only store that serves them.
//!
//! A [`CatalogStore`] is built once at start-up from a static table and never
//! mutated afterwards. Entry ids are checked for uniqueness when the store is
//! constructed; lookups by id, by category and the derived category list all
//! preserve the table's original order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a catalog entry.
pub type EntryId = i64;

/// Fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Development,
    Ai,
    Cloud,
    Security,
    Data,
    Consulting,
}

impl Category {
    /// Every category, in presentation order.
    pub const ALL: &'static [Category] = &[
        Category::Development,
        Category::Ai,
        Category::Cloud,
        Category::Security,
        Category::Data,
        Category::Consulting,
    ];

    /// Wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Development => "development",
            Category::Ai => "ai",
            Category::Cloud => "cloud",
            Category::Security => "security",
            Category::Data => "data",
            Category::Consulting => "consulting",
        }
    }

    /// Case-insensitive lookup. Returns `None` for names outside the enumeration.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One static service or software description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    pub description: String,
    /// Free-form price label, e.g. "From $5,000".
    pub price: String,
    pub category: Category,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    pub icon: String,
    pub color: String,
    pub delivery_time: String,
}

/// Parse a path identifier into an [`EntryId`].
///
/// Anything that is not a plain base-10 integer is rejected.
pub fn parse_entry_id(raw: &str) -> Result<EntryId> {
    raw.parse::<EntryId>().map_err(|_| Error::InvalidId {
        raw: raw.to_string(),
    })
}

/// Read-only, ordered collection of catalog entries keyed by id.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    collection: String,
    entries: Vec<CatalogEntry>,
    by_id: HashMap<EntryId, usize>,
}

impl CatalogStore {
    /// Build a store, rejecting duplicate ids.
    pub fn new(collection: impl Into<String>, entries: Vec<CatalogEntry>) -> Result<Self> {
        let collection = collection.into();
        let mut by_id = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.id, index).is_some() {
                return Err(Error::DuplicateId {
                    collection,
                    id: entry.id,
                });
            }
        }

        tracing::debug!(collection = %collection, entries = entries.len(), "catalog store built");

        Ok(Self {
            collection,
            entries,
            by_id,
        })
    }

    /// Name of the collection ("services", "software").
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// All entries in definition order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&CatalogEntry> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    /// Look up an entry by id, failing with [`Error::EntryNotFound`].
    pub fn require(&self, id: EntryId) -> Result<&CatalogEntry> {
        self.get(id).ok_or_else(|| Error::EntryNotFound {
            collection: self.collection.clone(),
            id,
        })
    }

    /// Entries belonging to `category`, in definition order.
    pub fn by_category(&self, category: Category) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect()
    }

    /// Entries whose category matches `name` case-insensitively.
    ///
    /// Unknown category names yield an empty list rather than an error.
    pub fn by_category_name(&self, name: &str) -> Vec<&CatalogEntry> {
        Category::parse(name)
            .map(|category| self.by_category(category))
            .unwrap_or_default()
    }

    /// Distinct categories present in the store, in first-seen order.
    pub fn categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category) {
                seen.push(entry.category);
            }
        }
        seen
    }

    /// Id a newly created entry would receive. Nothing is reserved.
    pub fn next_id(&self) -> EntryId {
        self.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }
}

/// Both catalog collections served by the API.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub services: CatalogStore,
    pub software: CatalogStore,
}

impl Catalog {
    /// Build the catalog from the bundled static tables.
    pub fn load() -> Result<Self> {
        Ok(Self {
            services: CatalogStore::new("services", crate::data::services())?,
            software: CatalogStore::new("software", crate::data::software())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: EntryId, category: Category) -> CatalogEntry {
        CatalogEntry {
            id,
            name: format!("Entry {id}"),
            description: String::new(),
            price: "Contact us".to_string(),
            category,
            features: vec![],
            technologies: vec![],
            icon: "box".to_string(),
            color: "#000000".to_string(),
            delivery_time: "1 week".to_string(),
        }
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse("AI"), Some(Category::Ai));
        assert_eq!(Category::parse("Cloud"), Some(Category::Cloud));
        assert_eq!(Category::parse(" security "), Some(Category::Security));
        assert_eq!(Category::parse("gardening"), None);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Development).unwrap();
        assert_eq!(json, "\"development\"");
    }

    #[test]
    fn store_rejects_duplicate_ids() {
        let err = CatalogStore::new(
            "services",
            vec![entry(1, Category::Ai), entry(1, Category::Cloud)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateId {
                collection: "services".to_string(),
                id: 1
            }
        );
    }

    #[test]
    fn store_lookups() {
        let store = CatalogStore::new(
            "services",
            vec![
                entry(3, Category::Ai),
                entry(7, Category::Cloud),
                entry(5, Category::Ai),
            ],
        )
        .unwrap();

        assert_eq!(store.get(7).map(|e| e.category), Some(Category::Cloud));
        assert!(store.get(4).is_none());
        assert!(matches!(
            store.require(4),
            Err(Error::EntryNotFound { id: 4, .. })
        ));

        let ai: Vec<EntryId> = store.by_category_name("Ai").iter().map(|e| e.id).collect();
        assert_eq!(ai, vec![3, 5]);
        assert!(store.by_category_name("unknown").is_empty());

        assert_eq!(store.categories(), vec![Category::Ai, Category::Cloud]);
        assert_eq!(store.next_id(), 8);
    }

    #[test]
    fn parse_entry_id_rejects_non_integers() {
        assert_eq!(parse_entry_id("42"), Ok(42));
        assert_eq!(parse_entry_id("-1"), Ok(-1));
        assert!(matches!(parse_entry_id("abc"), Err(Error::InvalidId { .. })));
        assert!(matches!(parse_entry_id("4.5"), Err(Error::InvalidId { .. })));
        assert!(matches!(parse_entry_id(""), Err(Error::InvalidId { .. })));
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_value(entry(1, Category::Data)).unwrap();
        assert_eq!(json["deliveryTime"], "1 week");
        assert_eq!(json["category"], "data");
    }
}
