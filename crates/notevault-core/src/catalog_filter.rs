//! Category selection and free-text search over the note catalog.
//!
//! Every visible result set is computed by [`filter_notes`], a pure function
//! of the note set, the query, the category selector, and the bookmark-id
//! set. Precedence is fixed:
//!
//! 1. A non-empty query matches `title` or `subject` (case-insensitive
//!    substring) and ignores the category.
//! 2. `BOOKMARKED` keeps notes whose id is bookmarked.
//! 3. `COMMUNITY` keeps community contributions only.
//! 4. `ALL` keeps everything except community contributions.
//! 5. Any other value is a branch name; contributions stay hidden.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::{CATEGORY_ALL, CATEGORY_BOOKMARKED, CATEGORY_COMMUNITY};
use crate::models::Note;

/// Discrete category selector chosen independently of the search box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    #[default]
    All,
    Bookmarked,
    Community,
    Branch(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::All => CATEGORY_ALL,
            Category::Bookmarked => CATEGORY_BOOKMARKED,
            Category::Community => CATEGORY_COMMUNITY,
            Category::Branch(name) => name,
        }
    }

    /// Exact, case-sensitive parse; unknown values are branch names.
    pub fn parse(value: &str) -> Self {
        match value {
            CATEGORY_ALL => Category::All,
            CATEGORY_BOOKMARKED => Category::Bookmarked,
            CATEGORY_COMMUNITY => Category::Community,
            other => Category::Branch(other.to_string()),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::parse(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// Case-insensitive substring test against `title` and `subject`.
///
/// `needle_lower` must already be lowercased.
pub fn matches_query(note: &Note, needle_lower: &str) -> bool {
    note.title.to_lowercase().contains(needle_lower)
        || note.subject.to_lowercase().contains(needle_lower)
}

fn matches_category(note: &Note, category: &Category, bookmarks: &HashSet<String>) -> bool {
    match category {
        Category::Bookmarked => bookmarks.contains(&note.id),
        Category::Community => note.is_contribution(),
        Category::All => !note.is_contribution(),
        Category::Branch(name) => note.branch_bucket() == name && !note.is_contribution(),
    }
}

/// Narrow `notes` to the visible result set, preserving input order.
pub fn filter_notes<'a>(
    notes: &'a [Note],
    query: &str,
    category: &Category,
    bookmarks: &HashSet<String>,
) -> Vec<&'a Note> {
    let results: Vec<&Note> = if query.is_empty() {
        notes
            .iter()
            .filter(|n| matches_category(n, category, bookmarks))
            .collect()
    } else {
        let needle = query.to_lowercase();
        notes.iter().filter(|n| matches_query(n, &needle)).collect()
    };

    tracing::trace!(
        subsystem = "catalog",
        component = "filter",
        query_len = query.len(),
        category = %category,
        input_count = notes.len(),
        result_count = results.len(),
        "Filtered catalog"
    );
    results
}
