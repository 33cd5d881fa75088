//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist reusable category labels.
//! - Resolve category sets for questionnaires.
//!
//! # Invariants
//! - Names are unique case-insensitively (`idx_categories_name`); a unique
//!   violation surfaces as `RepoError::Conflict`.
//! - Lists follow insertion order (`rowid ASC`); renames keep position.
//! - Deleting a category removes its questionnaire edges, never the
//!   questionnaires.

use super::row::{is_unique_violation, parse_uuid};
use super::{EntityKind, RepoError, RepoResult};
use crate::model::category::{Category, CategoryId};
use crate::model::questionnaire::QuestionnaireId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    created_at,
    updated_at
FROM categories";

/// Repository interface for category persistence.
pub trait CategoryRepository {
    fn insert_category(&self, category: &Category) -> RepoResult<()>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Case-insensitive exact name lookup.
    fn find_category_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn rename_category(&self, id: CategoryId, name: &str, updated_at: i64) -> RepoResult<()>;
    /// Deletes the category and its edges. Returns the number of detached
    /// questionnaires.
    fn delete_category(&self, id: CategoryId) -> RepoResult<usize>;
    /// Number of questionnaires currently attached to the category.
    fn usage_count(&self, id: CategoryId) -> RepoResult<u64>;
    /// Categories attached to one questionnaire, in insertion order.
    fn categories_for_questionnaire(
        &self,
        questionnaire_id: QuestionnaireId,
    ) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn collect(&self, sql: &str, param: Option<String>) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match param {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn insert_category(&self, category: &Category) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO categories (id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    category.id.to_string(),
                    category.name.as_str(),
                    category.created_at,
                    category.updated_at,
                ],
            )
            .map_err(|err| map_name_conflict(err, &category.name))?;
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn find_category_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1 COLLATE NOCASE;",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        match id_text {
            Some(value) => self.get_category(parse_uuid(&value, "categories.id")?),
            None => Ok(None),
        }
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        self.collect(&format!("{CATEGORY_SELECT_SQL} ORDER BY rowid ASC;"), None)
    }

    fn rename_category(&self, id: CategoryId, name: &str, updated_at: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE categories
                 SET
                    name = ?2,
                    updated_at = ?3
                 WHERE id = ?1;",
                params![id.to_string(), name, updated_at],
            )
            .map_err(|err| map_name_conflict(err, name))?;

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<usize> {
        let id_text = id.to_string();
        let detached = self.conn.execute(
            "DELETE FROM questionnaire_categories WHERE category_id = ?1;",
            [id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id_text.as_str()])?;

        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(detached)
    }

    fn usage_count(&self, id: CategoryId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM questionnaire_categories WHERE category_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative usage count `{count}`")))
    }

    fn categories_for_questionnaire(
        &self,
        questionnaire_id: QuestionnaireId,
    ) -> RepoResult<Vec<Category>> {
        self.collect(
            "SELECT
                c.id AS id,
                c.name AS name,
                c.created_at AS created_at,
                c.updated_at AS updated_at
             FROM categories c
             INNER JOIN questionnaire_categories qc ON qc.category_id = c.id
             WHERE qc.questionnaire_id = ?1
             ORDER BY c.rowid ASC;",
            Some(questionnaire_id.to_string()),
        )
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id_text: String = row.get("id")?;
    Ok(Category {
        id: parse_uuid(&id_text, "categories.id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_name_conflict(err: rusqlite::Error, name: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Conflict(format!("category name `{name}` already exists"));
    }
    err.into()
}

fn not_found(id: CategoryId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::Category,
        id,
    }
}
