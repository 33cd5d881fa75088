//! Title substring search over the questionnaire registry.
//!
//! # Responsibility
//! - Filter questionnaires by case-insensitive title substring.
//!
//! # Invariants
//! - No separate index is persisted; every search reads live rows.
//! - Results keep the registry listing order (pin first, then recency).
//! - Query text has no reserved characters; `%`, `_` and quotes match
//!   literally.

use crate::model::questionnaire::Questionnaire;
use crate::repo::questionnaire_repo::{QuestionnaireListQuery, QuestionnaireRepository};
use crate::repo::RepoResult;

/// Options for title search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleQuery {
    /// Substring to look for, whitespace included. Only the empty string
    /// matches every questionnaire.
    pub text: String,
    /// Maximum number of results. `None` returns every match.
    pub limit: Option<usize>,
}

impl TitleQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
        }
    }
}

/// Returns questionnaires whose title contains `query.text`, ignoring case.
pub fn search_by_title<R: QuestionnaireRepository>(
    repo: &R,
    query: &TitleQuery,
) -> RepoResult<Vec<Questionnaire>> {
    let needle = query.text.to_lowercase();
    let limit = query.limit.unwrap_or(usize::MAX);

    let hits = repo
        .list_questionnaires(&QuestionnaireListQuery::default())?
        .into_iter()
        .filter(|questionnaire| title_matches(&questionnaire.title, &needle))
        .take(limit)
        .collect();
    Ok(hits)
}

fn title_matches(title: &str, lowercase_needle: &str) -> bool {
    lowercase_needle.is_empty() || title.to_lowercase().contains(lowercase_needle)
}

#[cfg(test)]
mod tests {
    use super::title_matches;

    #[test]
    fn matching_ignores_case() {
        assert!(title_matches("Customer Feedback", "feedback"));
        assert!(title_matches("ÉTÉ Survey", "été"));
        assert!(!title_matches("Customer Feedback", "pulse"));
    }

    #[test]
    fn wildcard_characters_match_literally() {
        assert!(!title_matches("Customer Feedback", "%"));
        assert!(title_matches("100% satisfied", "0%"));
    }

    #[test]
    fn empty_needle_matches_everything() {
        assert!(title_matches("anything", ""));
    }

    #[test]
    fn whitespace_is_part_of_the_needle() {
        assert!(title_matches("Customer Feedback", " feedback"));
        assert!(!title_matches("Feedback form", " feedback"));
        assert!(!title_matches("Untitled", " "));
    }
}
