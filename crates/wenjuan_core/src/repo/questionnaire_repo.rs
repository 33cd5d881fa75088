//! Questionnaire repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, pin and category-edge APIs over `questionnaires`.
//! - Own the listing order used by every questionnaire sequence.
//!
//! # Invariants
//! - Listing order is `pinned DESC, pin_seq DESC, created_at DESC,
//!   rowid DESC`; it is total, so repeated reads without writes are stable.
//! - Every pin assigns a fresh `pin_seq`, so re-pinning promotes regardless
//!   of what the clock reports.
//! - Re-pinning never moves `pinned_at` backwards.
//! - Deleting a questionnaire removes its answers and category edges in the
//!   caller's transaction.

use super::row::{bool_to_int, encode_json, parse_bool, parse_json, parse_uuid};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::category::CategoryId;
use crate::model::questionnaire::{Questionnaire, QuestionnaireId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::Value;
use std::collections::BTreeSet;

const QUESTIONNAIRE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    pinned,
    pinned_at,
    created_at,
    updated_at
FROM questionnaires";

const QUESTIONNAIRE_ORDER_SQL: &str =
    " ORDER BY pinned DESC, pin_seq DESC, created_at DESC, rowid DESC";

/// Filter options for listing questionnaires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionnaireListQuery {
    /// Restrict to questionnaires attached to this category.
    pub category_id: Option<CategoryId>,
}

/// Repository interface for questionnaire persistence.
pub trait QuestionnaireRepository {
    fn insert_questionnaire(&self, questionnaire: &Questionnaire) -> RepoResult<()>;
    fn get_questionnaire(&self, id: QuestionnaireId) -> RepoResult<Option<Questionnaire>>;
    fn questionnaire_exists(&self, id: QuestionnaireId) -> RepoResult<bool>;
    fn list_questionnaires(&self, query: &QuestionnaireListQuery)
        -> RepoResult<Vec<Questionnaire>>;
    /// Replaces title and body, stamping `updated_at`.
    fn update_content(
        &self,
        id: QuestionnaireId,
        title: &str,
        body: &Value,
        updated_at: i64,
    ) -> RepoResult<()>;
    /// Deletes the questionnaire with its answers and category edges.
    ///
    /// Returns the number of answers removed by the cascade.
    fn delete_questionnaire(&self, id: QuestionnaireId) -> RepoResult<usize>;
    /// Pins (`Some(ts)`) or unpins (`None`) one questionnaire.
    fn set_pin(&self, id: QuestionnaireId, pinned_at: Option<i64>) -> RepoResult<()>;
    /// Adds an edge. Returns `false` when the edge already existed.
    fn attach_category(
        &self,
        id: QuestionnaireId,
        category_id: CategoryId,
        attached_at: i64,
    ) -> RepoResult<bool>;
    /// Removes an edge. Returns `false` when no edge existed.
    fn detach_category(&self, id: QuestionnaireId, category_id: CategoryId) -> RepoResult<bool>;
}

/// SQLite-backed questionnaire repository.
pub struct SqliteQuestionnaireRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionnaireRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<Questionnaire> {
        let id_text: String = row.get("id")?;
        let id = parse_uuid(&id_text, "questionnaires.id")?;
        let body_text: String = row.get("body")?;
        let questionnaire = Questionnaire {
            id,
            title: row.get("title")?,
            body: parse_json(&body_text, "questionnaires.body")?,
            pinned: parse_bool(row.get("pinned")?, "questionnaires.pinned")?,
            pinned_at: row.get("pinned_at")?,
            category_ids: load_category_ids(self.conn, &id_text)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        questionnaire.validate()?;
        Ok(questionnaire)
    }
}

impl QuestionnaireRepository for SqliteQuestionnaireRepository<'_> {
    fn insert_questionnaire(&self, questionnaire: &Questionnaire) -> RepoResult<()> {
        questionnaire.validate()?;

        self.conn.execute(
            "INSERT INTO questionnaires (
                id,
                title,
                body,
                pinned,
                pinned_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                questionnaire.id.to_string(),
                questionnaire.title.as_str(),
                encode_json(&questionnaire.body)?,
                bool_to_int(questionnaire.pinned),
                questionnaire.pinned_at,
                questionnaire.created_at,
                questionnaire.updated_at,
            ],
        )?;

        for category_id in &questionnaire.category_ids {
            self.attach_category(questionnaire.id, *category_id, questionnaire.created_at)?;
        }

        Ok(())
    }

    fn get_questionnaire(&self, id: QuestionnaireId) -> RepoResult<Option<Questionnaire>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QUESTIONNAIRE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    fn questionnaire_exists(&self, id: QuestionnaireId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM questionnaires WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_questionnaires(
        &self,
        query: &QuestionnaireListQuery,
    ) -> RepoResult<Vec<Questionnaire>> {
        let mut sql = format!("{QUESTIONNAIRE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<SqlValue> = Vec::new();

        if let Some(category_id) = query.category_id {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM questionnaire_categories qc
                    WHERE qc.questionnaire_id = questionnaires.id
                      AND qc.category_id = ?
                )",
            );
            bind_values.push(SqlValue::Text(category_id.to_string()));
        }

        sql.push_str(QUESTIONNAIRE_ORDER_SQL);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut questionnaires = Vec::new();
        while let Some(row) = rows.next()? {
            questionnaires.push(self.parse_row(row)?);
        }
        Ok(questionnaires)
    }

    fn update_content(
        &self,
        id: QuestionnaireId,
        title: &str,
        body: &Value,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE questionnaires
             SET
                title = ?2,
                body = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![id.to_string(), title, encode_json(body)?, updated_at],
        )?;

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn delete_questionnaire(&self, id: QuestionnaireId) -> RepoResult<usize> {
        let id_text = id.to_string();
        let removed_answers = self.conn.execute(
            "DELETE FROM answers WHERE questionnaire_id = ?1;",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM questionnaire_categories WHERE questionnaire_id = ?1;",
            [id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM questionnaires WHERE id = ?1;", [id_text.as_str()])?;

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(removed_answers)
    }

    fn set_pin(&self, id: QuestionnaireId, pinned_at: Option<i64>) -> RepoResult<()> {
        let changed = match pinned_at {
            Some(pinned_at) => self.conn.execute(
                "UPDATE questionnaires
                 SET
                    pinned = 1,
                    pinned_at = MAX(?2, COALESCE(pinned_at, ?2)),
                    pin_seq = (SELECT COALESCE(MAX(pin_seq), 0) + 1 FROM questionnaires)
                 WHERE id = ?1;",
                params![id.to_string(), pinned_at],
            )?,
            None => self.conn.execute(
                "UPDATE questionnaires
                 SET
                    pinned = 0,
                    pinned_at = NULL,
                    pin_seq = NULL
                 WHERE id = ?1;",
                [id.to_string()],
            )?,
        };

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn attach_category(
        &self,
        id: QuestionnaireId,
        category_id: CategoryId,
        attached_at: i64,
    ) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO questionnaire_categories (
                questionnaire_id,
                category_id,
                attached_at
            ) VALUES (?1, ?2, ?3);",
            params![id.to_string(), category_id.to_string(), attached_at],
        )?;
        Ok(inserted > 0)
    }

    fn detach_category(&self, id: QuestionnaireId, category_id: CategoryId) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM questionnaire_categories
             WHERE questionnaire_id = ?1
               AND category_id = ?2;",
            params![id.to_string(), category_id.to_string()],
        )?;
        Ok(removed > 0)
    }
}

fn load_category_ids(
    conn: &Connection,
    questionnaire_id: &str,
) -> RepoResult<BTreeSet<CategoryId>> {
    let mut stmt = conn.prepare(
        "SELECT category_id
         FROM questionnaire_categories
         WHERE questionnaire_id = ?1;",
    )?;
    let mut rows = stmt.query([questionnaire_id])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, "questionnaire_categories.category_id")?);
    }
    Ok(ids)
}

fn not_found(id: QuestionnaireId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::Questionnaire,
        id,
    }
}
