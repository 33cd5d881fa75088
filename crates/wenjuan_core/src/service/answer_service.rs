//! Answer store use-case service.
//!
//! # Responsibility
//! - Submit, read, edit, delete and list answers of one questionnaire.
//!
//! # Invariants
//! - Every operation first checks the owning questionnaire inside the same
//!   transaction, so answers of a concurrently deleted questionnaire are
//!   either fully visible (before the delete) or `NotFound` (after it).
//! - Lookups are scoped by `(questionnaire_id, answer_id)`.

use super::error::{observe, SurveyError, SurveyResult};
use super::questionnaire_service::ensure_questionnaire_exists;
use crate::db::Database;
use crate::model::answer::{Answer, AnswerId};
use crate::model::now_epoch_ms;
use crate::model::questionnaire::QuestionnaireId;
use crate::repo::answer_repo::{AnswerRepository, SqliteAnswerRepository};
use crate::repo::EntityKind;
use log::info;
use rusqlite::Connection;
use serde_json::Value;

/// Answer store facade.
#[derive(Clone)]
pub struct AnswerService {
    db: Database,
}

impl AnswerService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stores a new answer for an existing questionnaire.
    pub fn submit(
        &self,
        questionnaire_id: QuestionnaireId,
        payload: Value,
    ) -> SurveyResult<Answer> {
        let result = self.db.write(|conn| {
            ensure_questionnaire_exists(conn, questionnaire_id)?;
            let answer = Answer::new(questionnaire_id, payload, now_epoch_ms());
            SqliteAnswerRepository::new(conn).insert_answer(&answer)?;
            Ok(answer)
        });
        if let Ok(answer) = &result {
            info!(
                "event=answer_submit module=answers status=ok questionnaire_id={questionnaire_id} id={}",
                answer.id
            );
        }
        observe("answer_submit", result)
    }

    pub fn get(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> SurveyResult<Answer> {
        observe(
            "answer_get",
            self.db.read(|conn| {
                ensure_questionnaire_exists(conn, questionnaire_id)?;
                load_answer(conn, questionnaire_id, answer_id)
            }),
        )
    }

    /// Replaces the payload of one answer and stamps `updated_at`.
    pub fn update(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
        payload: Value,
    ) -> SurveyResult<Answer> {
        let result = self.db.write(|conn| {
            ensure_questionnaire_exists(conn, questionnaire_id)?;
            SqliteAnswerRepository::new(conn).update_payload(
                questionnaire_id,
                answer_id,
                &payload,
                now_epoch_ms(),
            )?;
            load_answer(conn, questionnaire_id, answer_id)
        });
        if result.is_ok() {
            info!(
                "event=answer_update module=answers status=ok questionnaire_id={questionnaire_id} id={answer_id}"
            );
        }
        observe("answer_update", result)
    }

    pub fn delete(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> SurveyResult<()> {
        let result = self.db.write(|conn| {
            ensure_questionnaire_exists(conn, questionnaire_id)?;
            SqliteAnswerRepository::new(conn)
                .delete_answer(questionnaire_id, answer_id)
                .map_err(SurveyError::from)
        });
        if result.is_ok() {
            info!(
                "event=answer_delete module=answers status=ok questionnaire_id={questionnaire_id} id={answer_id}"
            );
        }
        observe("answer_delete", result)
    }

    /// Lists answers of one questionnaire, oldest submission first.
    pub fn list(&self, questionnaire_id: QuestionnaireId) -> SurveyResult<Vec<Answer>> {
        observe(
            "answer_list",
            self.db.read(|conn| {
                ensure_questionnaire_exists(conn, questionnaire_id)?;
                SqliteAnswerRepository::new(conn)
                    .list_answers(questionnaire_id)
                    .map_err(Into::into)
            }),
        )
    }
}

fn load_answer(
    conn: &Connection,
    questionnaire_id: QuestionnaireId,
    answer_id: AnswerId,
) -> SurveyResult<Answer> {
    SqliteAnswerRepository::new(conn)
        .get_answer(questionnaire_id, answer_id)?
        .ok_or_else(|| SurveyError::not_found(EntityKind::Answer, answer_id))
}
