//! Typed route table for the questionnaire API.
//!
//! # Invariants
//! - Reserved literal segments are matched before `:id` captures and can
//!   never be parsed as identifiers, regardless of match-arm order.
//! - A known path with an unsupported verb is `MethodNotAllowed`, not
//!   `UnknownPath`.

use crate::model::answer::AnswerId;
use crate::model::category::CategoryId;
use crate::model::questionnaire::QuestionnaireId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Path prefix every survey route lives under.
pub const ROUTE_PREFIX: &str = "/wenjuans";

const RESERVED_SEGMENTS: [&str; 2] = ["search", "categories"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One resolved survey operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SearchQuestionnaires,
    ListQuestionnaires,
    CreateQuestionnaire,
    GetQuestionnaire(QuestionnaireId),
    UpdateQuestionnaire(QuestionnaireId),
    DeleteQuestionnaire(QuestionnaireId),
    PinQuestionnaire(QuestionnaireId),
    UnpinQuestionnaire(QuestionnaireId),
    SubmitAnswer(QuestionnaireId),
    ListAnswers(QuestionnaireId),
    GetAnswer(QuestionnaireId, AnswerId),
    UpdateAnswer(QuestionnaireId, AnswerId),
    DeleteAnswer(QuestionnaireId, AnswerId),
    ExportQuestionnaire(QuestionnaireId),
    ListCategories,
    CreateCategory,
    GetCategory(CategoryId),
    UpdateCategory(CategoryId),
    DeleteCategory(CategoryId),
    ListQuestionnaireCategories(QuestionnaireId),
    AttachCategory(QuestionnaireId, CategoryId),
    DetachCategory(QuestionnaireId, CategoryId),
}

/// Route resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    UnknownPath(String),
    MethodNotAllowed { method: Method, path: String },
    InvalidId(String),
}

impl RouteError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownPath(_) => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::InvalidId(_) => 400,
        }
    }
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPath(path) => write!(f, "no route for path `{path}`"),
            Self::MethodNotAllowed { method, path } => {
                write!(f, "method {} not allowed for `{path}`", method.as_str())
            }
            Self::InvalidId(segment) => write!(f, "invalid identifier `{segment}`"),
        }
    }
}

impl Error for RouteError {}

/// Resolves a request path (without query string) to a [`Route`].
pub fn resolve_route(method: Method, path: &str) -> Result<Route, RouteError> {
    let unknown = || RouteError::UnknownPath(path.to_string());
    let rest = path.strip_prefix(ROUTE_PREFIX).ok_or_else(unknown)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(unknown());
    }
    let segments: Vec<&str> = rest.split('/').filter(|segment| !segment.is_empty()).collect();

    if let Some(route) = match_route(method, &segments)? {
        return Ok(route);
    }

    for other in Method::ALL {
        if other != method && matches!(match_route(other, &segments), Ok(Some(_))) {
            return Err(RouteError::MethodNotAllowed {
                method,
                path: path.to_string(),
            });
        }
    }
    Err(unknown())
}

fn match_route(method: Method, segments: &[&str]) -> Result<Option<Route>, RouteError> {
    use Method::{Delete, Get, Post, Put};

    let route = match (method, segments) {
        (Get, []) => Route::ListQuestionnaires,
        (Post, []) => Route::CreateQuestionnaire,
        (Get, ["search"]) => Route::SearchQuestionnaires,
        (Get, ["categories"]) => Route::ListCategories,
        (Post, ["categories"]) => Route::CreateCategory,
        (Get, ["categories", id]) => Route::GetCategory(parse_id(id)?),
        (Put, ["categories", id]) => Route::UpdateCategory(parse_id(id)?),
        (Delete, ["categories", id]) => Route::DeleteCategory(parse_id(id)?),
        (_, [id, ..]) if is_reserved(id) => return Ok(None),
        (Get, [id]) => Route::GetQuestionnaire(parse_id(id)?),
        (Put, [id]) => Route::UpdateQuestionnaire(parse_id(id)?),
        (Delete, [id]) => Route::DeleteQuestionnaire(parse_id(id)?),
        (Post, [id, "pin"]) => Route::PinQuestionnaire(parse_id(id)?),
        (Post, [id, "unpin"]) => Route::UnpinQuestionnaire(parse_id(id)?),
        (Post, [id, "submit"]) => Route::SubmitAnswer(parse_id(id)?),
        (Get, [id, "answers"]) => Route::ListAnswers(parse_id(id)?),
        (Get, [id, "answers", answer_id]) => {
            Route::GetAnswer(parse_id(id)?, parse_id(answer_id)?)
        }
        (Put, [id, "answers", answer_id]) => {
            Route::UpdateAnswer(parse_id(id)?, parse_id(answer_id)?)
        }
        (Delete, [id, "answers", answer_id]) => {
            Route::DeleteAnswer(parse_id(id)?, parse_id(answer_id)?)
        }
        (Get, [id, "download"]) => Route::ExportQuestionnaire(parse_id(id)?),
        (Get, [id, "categories"]) => Route::ListQuestionnaireCategories(parse_id(id)?),
        (Post, [id, "categories", category_id]) => {
            Route::AttachCategory(parse_id(id)?, parse_id(category_id)?)
        }
        (Delete, [id, "categories", category_id]) => {
            Route::DetachCategory(parse_id(id)?, parse_id(category_id)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(route))
}

fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS.contains(&segment)
}

fn parse_id(segment: &str) -> Result<Uuid, RouteError> {
    Uuid::parse_str(segment).map_err(|_| RouteError::InvalidId(segment.to_string()))
}
