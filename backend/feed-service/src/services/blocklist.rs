//! Category blocklist loaded once at startup.
//!
//! Posts classified into any blocked category are removed from a feed page
//! after windowing. Removed posts are not backfilled.

use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info};

use crate::models::PostRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBlocklist {
    categories: HashSet<String>,
}

impl CategoryBlocklist {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a JSON array of category names.
    ///
    /// A missing or malformed file yields an empty blocklist.
    pub fn load_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read category blocklist");
                return Self::empty();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(categories) => {
                let blocklist = Self::new(categories);
                info!(
                    path = %path.display(),
                    count = blocklist.len(),
                    "Loaded category blocklist"
                );
                blocklist
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Invalid category blocklist file");
                Self::empty()
            }
        }
    }

    pub fn is_blocked(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn blocks_post(&self, post: &PostRecord) -> bool {
        !self.categories.is_empty()
            && post.category_scores.keys().any(|c| self.is_blocked(c))
    }

    /// Drop blocked posts, preserving order. Returns the kept posts and the
    /// number dropped.
    pub fn apply(&self, posts: Vec<PostRecord>) -> (Vec<PostRecord>, usize) {
        let before = posts.len();
        let kept: Vec<PostRecord> = posts.into_iter().filter(|p| !self.blocks_post(p)).collect();
        let dropped = before - kept.len();
        (kept, dropped)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
