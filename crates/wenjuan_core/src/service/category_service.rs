//! Category store use-case service.
//!
//! # Responsibility
//! - Create, rename, list and delete reusable category labels.
//!
//! # Invariants
//! - The name-uniqueness check and the write run in one IMMEDIATE
//!   transaction, so concurrent creates/renames of the same name cannot both
//!   succeed.
//! - Deletion either cascade-detaches edges or is rejected while the category
//!   is in use, per [`CategoryDeleteMode`].

use super::error::{observe, SurveyError, SurveyResult};
use crate::config::CategoryDeleteMode;
use crate::db::Database;
use crate::model::category::{normalize_category_name, Category, CategoryId};
use crate::model::now_epoch_ms;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::EntityKind;
use log::info;
use rusqlite::Connection;

/// Category store facade.
#[derive(Clone)]
pub struct CategoryService {
    db: Database,
    delete_mode: CategoryDeleteMode,
}

impl CategoryService {
    pub fn new(db: Database, delete_mode: CategoryDeleteMode) -> Self {
        Self { db, delete_mode }
    }

    pub fn delete_mode(&self) -> CategoryDeleteMode {
        self.delete_mode
    }

    /// Creates a category. Fails `Conflict` when the name is taken.
    pub fn create(&self, name: &str) -> SurveyResult<Category> {
        let result = normalize_name(name).and_then(|name| {
            self.db.write(|conn| {
                let repo = SqliteCategoryRepository::new(conn);
                ensure_name_available(&repo, &name, None)?;
                let category = Category::new(name, now_epoch_ms());
                repo.insert_category(&category)?;
                Ok(category)
            })
        });
        if let Ok(category) = &result {
            info!(
                "event=category_create module=categories status=ok id={}",
                category.id
            );
        }
        observe("category_create", result)
    }

    pub fn get(&self, id: CategoryId) -> SurveyResult<Category> {
        observe(
            "category_get",
            self.db.read(|conn| load_category(conn, id)),
        )
    }

    /// Lists categories in insertion order.
    pub fn list(&self) -> SurveyResult<Vec<Category>> {
        observe(
            "category_list",
            self.db.read(|conn| {
                SqliteCategoryRepository::new(conn)
                    .list_categories()
                    .map_err(Into::into)
            }),
        )
    }

    /// Renames a category. Renaming to its own name (any casing) succeeds.
    pub fn update(&self, id: CategoryId, name: &str) -> SurveyResult<Category> {
        let result = normalize_name(name).and_then(|name| {
            self.db.write(|conn| {
                load_category(conn, id)?;
                let repo = SqliteCategoryRepository::new(conn);
                ensure_name_available(&repo, &name, Some(id))?;
                repo.rename_category(id, &name, now_epoch_ms())?;
                load_category(conn, id)
            })
        });
        if result.is_ok() {
            info!("event=category_update module=categories status=ok id={id}");
        }
        observe("category_update", result)
    }

    /// Deletes a category according to the configured delete mode.
    pub fn delete(&self, id: CategoryId) -> SurveyResult<()> {
        let delete_mode = self.delete_mode;
        let result = self.db.write(|conn| {
            load_category(conn, id)?;
            let repo = SqliteCategoryRepository::new(conn);
            if delete_mode == CategoryDeleteMode::Reject {
                let in_use = repo.usage_count(id)?;
                if in_use > 0 {
                    return Err(SurveyError::Conflict(format!(
                        "category {id} is attached to {in_use} questionnaire(s)"
                    )));
                }
            }
            repo.delete_category(id).map_err(SurveyError::from)
        });
        if let Ok(detached) = &result {
            info!(
                "event=category_delete module=categories status=ok id={id} detached={detached}"
            );
        }
        observe("category_delete", result.map(|_| ()))
    }
}

fn normalize_name(name: &str) -> SurveyResult<String> {
    normalize_category_name(name)
        .ok_or_else(|| SurveyError::Validation("category name must not be blank".to_string()))
}

fn load_category(conn: &Connection, id: CategoryId) -> SurveyResult<Category> {
    SqliteCategoryRepository::new(conn)
        .get_category(id)?
        .ok_or_else(|| SurveyError::not_found(EntityKind::Category, id))
}

fn ensure_name_available<R: CategoryRepository>(
    repo: &R,
    name: &str,
    owner: Option<CategoryId>,
) -> SurveyResult<()> {
    match repo.find_category_by_name(name)? {
        Some(existing) if Some(existing.id) != owner => Err(SurveyError::Conflict(format!(
            "category name `{name}` already exists"
        ))),
        _ => Ok(()),
    }
}
