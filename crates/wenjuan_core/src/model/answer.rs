//! Answer domain model.

use super::questionnaire::QuestionnaireId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier of an answer. Lookups always pair it with the owning
/// questionnaire ID.
pub type AnswerId = Uuid;

/// One respondent's submission against one questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    /// Weak back-reference used for scoped lookup only.
    pub questionnaire_id: QuestionnaireId,
    /// Caller-owned content; not validated against the question schema.
    pub payload: Value,
    pub submitted_at: i64,
    pub updated_at: i64,
}

impl Answer {
    pub fn new(questionnaire_id: QuestionnaireId, payload: Value, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            questionnaire_id,
            payload,
            submitted_at: now_ms,
            updated_at: now_ms,
        }
    }
}
