//! Answer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist answer submissions keyed by owning questionnaire.
//!
//! # Invariants
//! - Every lookup, update and delete filters on both `questionnaire_id` and
//!   `id`; an answer ID never resolves under a different questionnaire.
//! - Lists are ordered by `submitted_at ASC`, ties by insertion order.

use super::row::{encode_json, parse_json, parse_uuid};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::answer::{Answer, AnswerId};
use crate::model::questionnaire::QuestionnaireId;
use rusqlite::{params, Connection, Row};
use serde_json::Value;

const ANSWER_SELECT_SQL: &str = "SELECT
    id,
    questionnaire_id,
    payload,
    submitted_at,
    updated_at
FROM answers";

/// Repository interface for answer persistence.
pub trait AnswerRepository {
    fn insert_answer(&self, answer: &Answer) -> RepoResult<()>;
    fn get_answer(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> RepoResult<Option<Answer>>;
    fn list_answers(&self, questionnaire_id: QuestionnaireId) -> RepoResult<Vec<Answer>>;
    fn update_payload(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
        payload: &Value,
        updated_at: i64,
    ) -> RepoResult<()>;
    fn delete_answer(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> RepoResult<()>;
}

/// SQLite-backed answer repository.
pub struct SqliteAnswerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnswerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AnswerRepository for SqliteAnswerRepository<'_> {
    fn insert_answer(&self, answer: &Answer) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO answers (
                id,
                questionnaire_id,
                payload,
                submitted_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                answer.id.to_string(),
                answer.questionnaire_id.to_string(),
                encode_json(&answer.payload)?,
                answer.submitted_at,
                answer.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_answer(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> RepoResult<Option<Answer>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ANSWER_SELECT_SQL}
             WHERE questionnaire_id = ?1
               AND id = ?2;"
        ))?;
        let mut rows = stmt.query(params![
            questionnaire_id.to_string(),
            answer_id.to_string()
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_answer_row(row)?));
        }
        Ok(None)
    }

    fn list_answers(&self, questionnaire_id: QuestionnaireId) -> RepoResult<Vec<Answer>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ANSWER_SELECT_SQL}
             WHERE questionnaire_id = ?1
             ORDER BY submitted_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([questionnaire_id.to_string()])?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(parse_answer_row(row)?);
        }
        Ok(answers)
    }

    fn update_payload(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
        payload: &Value,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE answers
             SET
                payload = ?3,
                updated_at = ?4
             WHERE questionnaire_id = ?1
               AND id = ?2;",
            params![
                questionnaire_id.to_string(),
                answer_id.to_string(),
                encode_json(payload)?,
                updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(not_found(answer_id));
        }
        Ok(())
    }

    fn delete_answer(
        &self,
        questionnaire_id: QuestionnaireId,
        answer_id: AnswerId,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM answers
             WHERE questionnaire_id = ?1
               AND id = ?2;",
            params![questionnaire_id.to_string(), answer_id.to_string()],
        )?;

        if changed == 0 {
            return Err(not_found(answer_id));
        }
        Ok(())
    }
}

fn parse_answer_row(row: &Row<'_>) -> RepoResult<Answer> {
    let id_text: String = row.get("id")?;
    let questionnaire_text: String = row.get("questionnaire_id")?;
    let payload_text: String = row.get("payload")?;
    Ok(Answer {
        id: parse_uuid(&id_text, "answers.id")?,
        questionnaire_id: parse_uuid(&questionnaire_text, "answers.questionnaire_id")?,
        payload: parse_json(&payload_text, "answers.payload")?,
        submitted_at: row.get("submitted_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn not_found(id: AnswerId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::Answer,
        id,
    }
}
