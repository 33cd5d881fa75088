//! Survey core composition root.
//!
//! # Responsibility
//! - Initialize logging (when configured) and open storage.
//! - Inject one shared [`Database`] into every survey service.
//! - Control storage teardown.

use crate::config::{CoreConfig, DatabaseLocation};
use crate::db::{Database, DbError, DbResult};
use crate::logging::init_logging;
use crate::service::answer_service::AnswerService;
use crate::service::category_service::CategoryService;
use crate::service::export_service::ExportService;
use crate::service::questionnaire_service::QuestionnaireService;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Startup failure of [`SurveyCore::open`].
#[derive(Debug)]
pub enum StartupError {
    Logging(String),
    Db(DbError),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "storage init failed: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StartupError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Questionnaire registry, category store, answer store and export renderer
/// sharing one storage handle.
pub struct SurveyCore {
    db: Database,
    questionnaires: QuestionnaireService,
    categories: CategoryService,
    answers: AnswerService,
    exports: ExportService,
}

impl SurveyCore {
    /// Builds the core from configuration.
    pub fn open(config: &CoreConfig) -> Result<Self, StartupError> {
        if let Some(logging) = &config.logging {
            init_logging(&logging.level, &logging.log_dir).map_err(StartupError::Logging)?;
        }

        let db = match &config.database {
            DatabaseLocation::Memory => Database::open_in_memory()?,
            DatabaseLocation::File(path) => Database::open(path)?,
        };
        info!(
            "event=survey_core_open module=core status=ok category_delete={:?}",
            config.category_delete
        );
        Ok(Self::with_database(db, config))
    }

    /// Builds the core with an in-memory database and default settings.
    pub fn open_in_memory() -> Result<Self, StartupError> {
        Self::open(&CoreConfig::default())
    }

    /// Builds the core around an existing storage handle.
    pub fn with_database(db: Database, config: &CoreConfig) -> Self {
        Self {
            questionnaires: QuestionnaireService::new(db.clone()),
            categories: CategoryService::new(db.clone(), config.category_delete),
            answers: AnswerService::new(db.clone()),
            exports: ExportService::new(db.clone()),
            db,
        }
    }

    pub fn questionnaires(&self) -> &QuestionnaireService {
        &self.questionnaires
    }

    pub fn categories(&self) -> &CategoryService {
        &self.categories
    }

    pub fn answers(&self) -> &AnswerService {
        &self.answers
    }

    pub fn exports(&self) -> &ExportService {
        &self.exports
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Drops every service and closes storage.
    ///
    /// Fails with [`DbError::HandleInUse`] when a cloned service or
    /// [`Database`] handle is still alive elsewhere.
    pub fn close(self) -> DbResult<()> {
        let Self {
            db,
            questionnaires,
            categories,
            answers,
            exports,
        } = self;
        drop((questionnaires, categories, answers, exports));
        db.close()?;
        info!("event=survey_core_close module=core status=ok");
        Ok(())
    }
}
