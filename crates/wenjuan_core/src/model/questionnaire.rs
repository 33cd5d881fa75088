//! Questionnaire domain model.
//!
//! # Responsibility
//! - Define the survey definition record and its pin state.
//! - Validate title and pin invariants before persistence.
//!
//! # Invariants
//! - `title` is never blank.
//! - `pinned_at.is_some() == pinned`.
//! - `category_ids` holds references only; categories are owned elsewhere.

use super::category::CategoryId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a questionnaire.
pub type QuestionnaireId = Uuid;

/// Survey definition with ordering/visibility state and category tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub title: String,
    /// Caller-owned question content, stored verbatim.
    pub body: Value,
    pub pinned: bool,
    /// Pin ordering key; set exactly when `pinned` is true.
    pub pinned_at: Option<i64>,
    pub category_ids: BTreeSet<CategoryId>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for [`Questionnaire`] content.
///
/// `None` fields keep their stored value. In JSON an absent `body` key keeps
/// the body, while `"body": null` replaces it with `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionnairePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub body: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Validation failures for questionnaire records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionnaireValidationError {
    BlankTitle,
    PinStateMismatch { pinned: bool, has_pinned_at: bool },
}

impl Display for QuestionnaireValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "questionnaire title must not be blank"),
            Self::PinStateMismatch {
                pinned,
                has_pinned_at,
            } => write!(
                f,
                "pin state mismatch: pinned={pinned} but pinned_at present={has_pinned_at}"
            ),
        }
    }
}

impl Error for QuestionnaireValidationError {}

impl Questionnaire {
    /// Creates an unpinned questionnaire with a generated ID.
    ///
    /// The title is trimmed; blank titles are rejected.
    pub fn new(
        title: impl Into<String>,
        body: Value,
        now_ms: i64,
    ) -> Result<Self, QuestionnaireValidationError> {
        let title = normalize_title(title.into())?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            body,
            pinned: false,
            pinned_at: None,
            category_ids: BTreeSet::new(),
            created_at: now_ms,
            updated_at: now_ms,
        })
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), QuestionnaireValidationError> {
        if self.title.trim().is_empty() {
            return Err(QuestionnaireValidationError::BlankTitle);
        }
        if self.pinned != self.pinned_at.is_some() {
            return Err(QuestionnaireValidationError::PinStateMismatch {
                pinned: self.pinned,
                has_pinned_at: self.pinned_at.is_some(),
            });
        }
        Ok(())
    }
}

/// Trims a title and rejects blank values.
pub fn normalize_title(value: String) -> Result<String, QuestionnaireValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(QuestionnaireValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Questionnaire, QuestionnairePatch, QuestionnaireValidationError};
    use serde_json::{json, Value};

    #[test]
    fn patch_distinguishes_null_body_from_missing_body() {
        let missing: QuestionnairePatch = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(missing.body, None);

        let null: QuestionnairePatch = serde_json::from_value(json!({"body": null})).unwrap();
        assert_eq!(null.body, Some(Value::Null));
        assert_eq!(null.title, None);
        assert_eq!(serde_json::to_value(&null).unwrap(), json!({"body": null}));
    }

    #[test]
    fn new_trims_title_and_starts_unpinned() {
        let questionnaire = Questionnaire::new("  Weekly pulse ", json!({}), 42).unwrap();
        assert_eq!(questionnaire.title, "Weekly pulse");
        assert!(!questionnaire.pinned);
        assert_eq!(questionnaire.pinned_at, None);
        assert_eq!(questionnaire.created_at, 42);
        assert_eq!(questionnaire.updated_at, 42);
        assert!(questionnaire.category_ids.is_empty());
    }

    #[test]
    fn new_rejects_blank_title() {
        let err = Questionnaire::new(" \t", json!(null), 0).unwrap_err();
        assert_eq!(err, QuestionnaireValidationError::BlankTitle);
    }

    #[test]
    fn validate_rejects_pinned_without_timestamp() {
        let mut questionnaire = Questionnaire::new("pin check", json!({}), 0).unwrap();
        questionnaire.pinned = true;
        assert!(matches!(
            questionnaire.validate(),
            Err(QuestionnaireValidationError::PinStateMismatch { .. })
        ));

        questionnaire.pinned_at = Some(5);
        assert!(questionnaire.validate().is_ok());
    }
}
