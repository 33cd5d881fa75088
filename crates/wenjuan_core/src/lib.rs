//! Survey ("wenjuan") management core.
//! This crate is the single source of truth for questionnaire, category and
//! answer invariants; request gateways only translate to and from it.

pub mod api;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
mod survey;

pub use config::{CategoryDeleteMode, CoreConfig, DatabaseLocation, LoggingConfig};
pub use db::{Database, DbError};
pub use export::render::{ExportDocument, ExportFormat, ExportSnapshot};
pub use logging::{default_log_level, init_logging, logging_status, LoggingStatus};
pub use model::answer::{Answer, AnswerId};
pub use model::category::{Category, CategoryId};
pub use model::questionnaire::{Questionnaire, QuestionnaireId, QuestionnairePatch};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use search::title::TitleQuery;
pub use service::error::{ErrorKind, SurveyError, SurveyResult};
pub use survey::{StartupError, SurveyCore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
