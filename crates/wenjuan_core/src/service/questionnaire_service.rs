//! Questionnaire registry use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete for questionnaires.
//! - Own pin state and questionnaire/category association edges.
//! - Expose title search as a derived view over live registry contents.
//!
//! # Invariants
//! - Each operation is a single transaction on the shared [`Database`].
//! - Delete cascades to answers and edges atomically; a second delete of the
//!   same ID fails `NotFound`.
//! - Pin always promotes, including re-pins; `pinned_at` never decreases.
//!   Unpin is idempotent.
//! - Pin/unpin and edge changes do not touch `updated_at`.

use super::error::{observe, SurveyError, SurveyResult};
use crate::db::Database;
use crate::model::category::{Category, CategoryId};
use crate::model::now_epoch_ms;
use crate::model::questionnaire::{
    normalize_title, Questionnaire, QuestionnaireId, QuestionnairePatch,
};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::questionnaire_repo::{
    QuestionnaireListQuery, QuestionnaireRepository, SqliteQuestionnaireRepository,
};
use crate::repo::EntityKind;
use crate::search::title::{search_by_title, TitleQuery};
use log::info;
use rusqlite::Connection;
use serde_json::Value;

/// Registry facade over questionnaire storage.
#[derive(Clone)]
pub struct QuestionnaireService {
    db: Database,
}

impl QuestionnaireService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an unpinned questionnaire.
    ///
    /// Fails `Validation` when `title` is blank.
    pub fn create(&self, title: impl Into<String>, body: Value) -> SurveyResult<Questionnaire> {
        let result = Questionnaire::new(title, body, now_epoch_ms())
            .map_err(SurveyError::from)
            .and_then(|questionnaire| {
                self.db.write(|conn| {
                    SqliteQuestionnaireRepository::new(conn)
                        .insert_questionnaire(&questionnaire)?;
                    Ok(questionnaire)
                })
            });
        if let Ok(questionnaire) = &result {
            info!(
                "event=questionnaire_create module=registry status=ok id={}",
                questionnaire.id
            );
        }
        observe("questionnaire_create", result)
    }

    pub fn get(&self, id: QuestionnaireId) -> SurveyResult<Questionnaire> {
        observe(
            "questionnaire_get",
            self.db.read(|conn| load_questionnaire(conn, id)),
        )
    }

    /// Lists questionnaires: pinned first by most recent pin, then unpinned
    /// by most recent creation.
    pub fn list(&self) -> SurveyResult<Vec<Questionnaire>> {
        observe(
            "questionnaire_list",
            self.db.read(|conn| {
                SqliteQuestionnaireRepository::new(conn)
                    .list_questionnaires(&QuestionnaireListQuery::default())
                    .map_err(Into::into)
            }),
        )
    }

    /// Lists questionnaires tagged with one category, in listing order.
    pub fn list_by_category(&self, category_id: CategoryId) -> SurveyResult<Vec<Questionnaire>> {
        observe(
            "questionnaire_list_by_category",
            self.db.read(|conn| {
                ensure_category_exists(conn, category_id)?;
                let query = QuestionnaireListQuery {
                    category_id: Some(category_id),
                };
                SqliteQuestionnaireRepository::new(conn)
                    .list_questionnaires(&query)
                    .map_err(Into::into)
            }),
        )
    }

    /// Case-insensitive title substring search.
    ///
    /// A blank query returns the same sequence as [`Self::list`].
    pub fn search_by_title(&self, query: &TitleQuery) -> SurveyResult<Vec<Questionnaire>> {
        observe(
            "questionnaire_search",
            self.db.read(|conn| {
                search_by_title(&SqliteQuestionnaireRepository::new(conn), query)
                    .map_err(Into::into)
            }),
        )
    }

    /// Applies a partial title/body update and stamps `updated_at`.
    pub fn update(
        &self,
        id: QuestionnaireId,
        patch: QuestionnairePatch,
    ) -> SurveyResult<Questionnaire> {
        let title = match patch.title {
            Some(value) => match normalize_title(value) {
                Ok(title) => Some(title),
                Err(err) => return observe("questionnaire_update", Err(err.into())),
            },
            None => None,
        };

        let result = self.db.write(|conn| {
            let existing = load_questionnaire(conn, id)?;
            let repo = SqliteQuestionnaireRepository::new(conn);
            repo.update_content(
                id,
                title.as_deref().unwrap_or(existing.title.as_str()),
                patch.body.as_ref().unwrap_or(&existing.body),
                now_epoch_ms(),
            )?;
            load_questionnaire(conn, id)
        });
        if result.is_ok() {
            info!("event=questionnaire_update module=registry status=ok id={id}");
        }
        observe("questionnaire_update", result)
    }

    /// Deletes a questionnaire, its answers and its category edges.
    pub fn delete(&self, id: QuestionnaireId) -> SurveyResult<()> {
        let result = self.db.write(|conn| {
            SqliteQuestionnaireRepository::new(conn)
                .delete_questionnaire(id)
                .map_err(SurveyError::from)
        });
        if let Ok(removed_answers) = &result {
            info!(
                "event=questionnaire_delete module=registry status=ok id={id} removed_answers={removed_answers}"
            );
        }
        observe("questionnaire_delete", result.map(|_| ()))
    }

    /// Pins a questionnaire, moving it to the front of the pinned block.
    pub fn pin(&self, id: QuestionnaireId) -> SurveyResult<Questionnaire> {
        self.set_pin(id, Some(now_epoch_ms()), "questionnaire_pin")
    }

    /// Unpins a questionnaire. Unpinning an unpinned item succeeds.
    pub fn unpin(&self, id: QuestionnaireId) -> SurveyResult<Questionnaire> {
        self.set_pin(id, None, "questionnaire_unpin")
    }

    /// Attaches a category. Re-attaching an existing edge is a no-op.
    pub fn attach_category(
        &self,
        id: QuestionnaireId,
        category_id: CategoryId,
    ) -> SurveyResult<Questionnaire> {
        let result = self.db.write(|conn| {
            ensure_questionnaire_exists(conn, id)?;
            ensure_category_exists(conn, category_id)?;
            let inserted = SqliteQuestionnaireRepository::new(conn).attach_category(
                id,
                category_id,
                now_epoch_ms(),
            )?;
            load_questionnaire(conn, id).map(|questionnaire| (questionnaire, inserted))
        });
        if let Ok((_, inserted)) = &result {
            info!(
                "event=category_attach module=registry status=ok id={id} category_id={category_id} changed={inserted}"
            );
        }
        observe("category_attach", result.map(|(questionnaire, _)| questionnaire))
    }

    /// Detaches a category. Detaching a missing edge is a no-op; the
    /// questionnaire itself must exist.
    pub fn detach_category(
        &self,
        id: QuestionnaireId,
        category_id: CategoryId,
    ) -> SurveyResult<Questionnaire> {
        let result = self.db.write(|conn| {
            ensure_questionnaire_exists(conn, id)?;
            let removed =
                SqliteQuestionnaireRepository::new(conn).detach_category(id, category_id)?;
            load_questionnaire(conn, id).map(|questionnaire| (questionnaire, removed))
        });
        if let Ok((_, removed)) = &result {
            info!(
                "event=category_detach module=registry status=ok id={id} category_id={category_id} changed={removed}"
            );
        }
        observe("category_detach", result.map(|(questionnaire, _)| questionnaire))
    }

    /// Resolves the categories attached to one questionnaire.
    pub fn categories(&self, id: QuestionnaireId) -> SurveyResult<Vec<Category>> {
        observe(
            "questionnaire_categories",
            self.db.read(|conn| {
                ensure_questionnaire_exists(conn, id)?;
                SqliteCategoryRepository::new(conn)
                    .categories_for_questionnaire(id)
                    .map_err(Into::into)
            }),
        )
    }

    fn set_pin(
        &self,
        id: QuestionnaireId,
        pinned_at: Option<i64>,
        event: &'static str,
    ) -> SurveyResult<Questionnaire> {
        let result = self.db.write(|conn| {
            SqliteQuestionnaireRepository::new(conn).set_pin(id, pinned_at)?;
            load_questionnaire(conn, id)
        });
        if result.is_ok() {
            info!("event={event} module=registry status=ok id={id}");
        }
        observe(event, result)
    }
}

pub(crate) fn load_questionnaire(
    conn: &Connection,
    id: QuestionnaireId,
) -> SurveyResult<Questionnaire> {
    SqliteQuestionnaireRepository::new(conn)
        .get_questionnaire(id)?
        .ok_or_else(|| SurveyError::not_found(EntityKind::Questionnaire, id))
}

pub(crate) fn ensure_questionnaire_exists(
    conn: &Connection,
    id: QuestionnaireId,
) -> SurveyResult<()> {
    if SqliteQuestionnaireRepository::new(conn).questionnaire_exists(id)? {
        Ok(())
    } else {
        Err(SurveyError::not_found(EntityKind::Questionnaire, id))
    }
}

fn ensure_category_exists(conn: &Connection, id: CategoryId) -> SurveyResult<()> {
    match SqliteCategoryRepository::new(conn).get_category(id)? {
        Some(_) => Ok(()),
        None => Err(SurveyError::not_found(EntityKind::Category, id)),
    }
}
