//! Category domain model.
//!
//! # Responsibility
//! - Define reusable labels attachable to many questionnaires.
//! - Normalize category names before uniqueness checks.
//!
//! # Invariants
//! - Names are trimmed, inner whitespace is collapsed, and blank names are
//!   rejected.
//! - Name uniqueness is case-insensitive and enforced by the store.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier of a category.
pub type CategoryId = Uuid;

/// Reusable label for questionnaires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Category {
    /// Creates a category from an already normalized name.
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Normalizes one category name.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_category_name(name: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}
