//! Export use-case service.
//!
//! # Responsibility
//! - Capture a read snapshot of one questionnaire and its answers.
//! - Render the snapshot outside of any storage lock.
//!
//! # Invariants
//! - Export never writes questionnaire, answer or category state.
//! - The snapshot is read in one DEFERRED transaction, so it never contains a
//!   partially written answer.

use super::error::{observe, SurveyError, SurveyResult};
use super::questionnaire_service::load_questionnaire;
use crate::db::Database;
use crate::export::render::{render_document, ExportDocument, ExportFormat, ExportSnapshot};
use crate::model::questionnaire::QuestionnaireId;
use crate::repo::answer_repo::{AnswerRepository, SqliteAnswerRepository};
use crate::repo::RepoError;
use log::info;

/// Export renderer facade.
#[derive(Clone)]
pub struct ExportService {
    db: Database,
}

impl ExportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Reads the questionnaire and its answers as one consistent snapshot.
    pub fn snapshot(&self, id: QuestionnaireId) -> SurveyResult<ExportSnapshot> {
        observe(
            "export_snapshot",
            self.db.read(|conn| {
                let questionnaire = load_questionnaire(conn, id)?;
                let answers = SqliteAnswerRepository::new(conn).list_answers(id)?;
                Ok(ExportSnapshot {
                    questionnaire,
                    answers,
                })
            }),
        )
    }

    /// Renders one questionnaire and all of its answers.
    pub fn render(
        &self,
        id: QuestionnaireId,
        format: ExportFormat,
    ) -> SurveyResult<ExportDocument> {
        let snapshot = self.snapshot(id)?;
        let result = render_document(&snapshot, format).map_err(|err| {
            SurveyError::Storage(RepoError::InvalidData(err.to_string()))
        });
        if let Ok(document) = &result {
            info!(
                "event=export_render module=export status=ok id={id} format={} answers={} bytes={}",
                format.extension(),
                snapshot.answers.len(),
                document.bytes.len()
            );
        }
        observe("export_render", result)
    }
}
