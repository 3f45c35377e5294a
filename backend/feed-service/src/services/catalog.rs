//! Known category names, used to validate category feed lookups.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Technology",
    "Travel",
    "Food",
    "Art",
    "Sports",
    "News",
    "Lifestyle",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: BTreeSet<String>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }
}

impl CategoryCatalog {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a JSON array of category names, falling back to the built-in list.
    pub fn load_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<Vec<String>>(&raw).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(categories) if !categories.is_empty() => {
                info!(path = %path.display(), count = categories.len(), "Loaded category catalogue");
                Self::new(categories)
            }
            Ok(_) => {
                error!(path = %path.display(), "Category catalogue is empty, using defaults");
                Self::default()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load category catalogue, using defaults");
                Self::default()
            }
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }
}
