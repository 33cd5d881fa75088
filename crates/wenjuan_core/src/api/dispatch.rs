//! Request dispatch onto survey services.
//!
//! # Responsibility
//! - Decode request parameters and JSON bodies into service arguments.
//! - Encode service results as JSON (or rendered export bytes).
//!
//! # Invariants
//! - Create/submit answer with `201`, deletes with `204` and an empty body,
//!   everything else that succeeds with `200`.
//! - Failures always carry `{"error":{"kind":..,"message":..}}`.

use super::route::{resolve_route, Method, Route, RouteError};
use crate::export::render::ExportFormat;
use crate::model::category::CategoryId;
use crate::model::questionnaire::QuestionnairePatch;
use crate::repo::RepoError;
use crate::search::title::TitleQuery;
use crate::service::error::{SurveyError, SurveyResult};
use crate::survey::SurveyCore;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport-neutral request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without query string, e.g. `/wenjuans/search`.
    pub path: String,
    /// Query parameters (`query`, `limit`, `format`, `category_id`).
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Suggested download name; set for exports only.
    pub file_name: Option<String>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> SurveyResult<Self> {
        let body = serde_json::to_vec(value).map_err(|err| {
            SurveyError::Storage(RepoError::InvalidData(format!(
                "failed to encode response: {err}"
            )))
        })?;
        Ok(Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body,
            file_name: None,
        })
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            content_type: JSON_CONTENT_TYPE,
            body: Vec::new(),
            file_name: None,
        }
    }

    fn error(status: u16, kind: &str, message: &str) -> Self {
        let body = json!({ "error": { "kind": kind, "message": message } });
        Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body: body.to_string().into_bytes(),
            file_name: None,
        }
    }

    /// Parses the body as JSON. `None` for empty or non-JSON bodies.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

impl From<&SurveyError> for ApiResponse {
    fn from(err: &SurveyError) -> Self {
        let kind = err.kind();
        Self::error(kind.status_code(), kind.as_str(), &err.to_string())
    }
}

impl From<&RouteError> for ApiResponse {
    fn from(err: &RouteError) -> Self {
        let kind = match err {
            RouteError::UnknownPath(_) => "not_found",
            RouteError::MethodNotAllowed { .. } => "method_not_allowed",
            RouteError::InvalidId(_) => "validation",
        };
        Self::error(err.status_code(), kind, &err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CreateQuestionnaireBody {
    title: String,
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    name: String,
}

/// Routes one request and invokes the matching survey operation.
pub fn dispatch(core: &SurveyCore, request: &ApiRequest) -> ApiResponse {
    let response = match resolve_route(request.method, &request.path) {
        Ok(route) => handle(core, route, request).unwrap_or_else(|err| ApiResponse::from(&err)),
        Err(err) => ApiResponse::from(&err),
    };
    debug!(
        "event=api_dispatch module=api status={} method={}",
        response.status,
        request.method.as_str()
    );
    response
}

fn handle(core: &SurveyCore, route: Route, request: &ApiRequest) -> SurveyResult<ApiResponse> {
    let questionnaires = core.questionnaires();
    let categories = core.categories();
    let answers = core.answers();

    match route {
        Route::SearchQuestionnaires => {
            let query = TitleQuery {
                text: request.param("query").unwrap_or_default().to_string(),
                limit: parse_limit(request.param("limit"))?,
            };
            ApiResponse::json(200, &questionnaires.search_by_title(&query)?)
        }
        Route::ListQuestionnaires => match request.param("category_id") {
            Some(raw) => {
                let category_id = parse_param_id(raw, "category_id")?;
                ApiResponse::json(200, &questionnaires.list_by_category(category_id)?)
            }
            None => ApiResponse::json(200, &questionnaires.list()?),
        },
        Route::CreateQuestionnaire => {
            let payload: CreateQuestionnaireBody = decode_body(request)?;
            ApiResponse::json(201, &questionnaires.create(payload.title, payload.body)?)
        }
        Route::GetQuestionnaire(id) => ApiResponse::json(200, &questionnaires.get(id)?),
        Route::UpdateQuestionnaire(id) => {
            let patch: QuestionnairePatch = decode_body(request)?;
            ApiResponse::json(200, &questionnaires.update(id, patch)?)
        }
        Route::DeleteQuestionnaire(id) => {
            questionnaires.delete(id)?;
            Ok(ApiResponse::no_content())
        }
        Route::PinQuestionnaire(id) => ApiResponse::json(200, &questionnaires.pin(id)?),
        Route::UnpinQuestionnaire(id) => ApiResponse::json(200, &questionnaires.unpin(id)?),
        Route::SubmitAnswer(id) => {
            ApiResponse::json(201, &answers.submit(id, require_body(request)?)?)
        }
        Route::ListAnswers(id) => ApiResponse::json(200, &answers.list(id)?),
        Route::GetAnswer(id, answer_id) => ApiResponse::json(200, &answers.get(id, answer_id)?),
        Route::UpdateAnswer(id, answer_id) => ApiResponse::json(
            200,
            &answers.update(id, answer_id, require_body(request)?)?,
        ),
        Route::DeleteAnswer(id, answer_id) => {
            answers.delete(id, answer_id)?;
            Ok(ApiResponse::no_content())
        }
        Route::ExportQuestionnaire(id) => {
            let format = parse_format(request.param("format"))?;
            let document = core.exports().render(id, format)?;
            Ok(ApiResponse {
                status: 200,
                content_type: document.content_type,
                body: document.bytes,
                file_name: Some(document.file_name),
            })
        }
        Route::ListCategories => ApiResponse::json(200, &categories.list()?),
        Route::CreateCategory => {
            let payload: CategoryBody = decode_body(request)?;
            ApiResponse::json(201, &categories.create(&payload.name)?)
        }
        Route::GetCategory(id) => ApiResponse::json(200, &categories.get(id)?),
        Route::UpdateCategory(id) => {
            let payload: CategoryBody = decode_body(request)?;
            ApiResponse::json(200, &categories.update(id, &payload.name)?)
        }
        Route::DeleteCategory(id) => {
            categories.delete(id)?;
            Ok(ApiResponse::no_content())
        }
        Route::ListQuestionnaireCategories(id) => {
            ApiResponse::json(200, &questionnaires.categories(id)?)
        }
        Route::AttachCategory(id, category_id) => {
            ApiResponse::json(200, &questionnaires.attach_category(id, category_id)?)
        }
        Route::DetachCategory(id, category_id) => {
            ApiResponse::json(200, &questionnaires.detach_category(id, category_id)?)
        }
    }
}

fn require_body(request: &ApiRequest) -> SurveyResult<Value> {
    request
        .body
        .clone()
        .ok_or_else(|| SurveyError::Validation("request body is required".to_string()))
}

fn decode_body<T: DeserializeOwned>(request: &ApiRequest) -> SurveyResult<T> {
    serde_json::from_value(require_body(request)?)
        .map_err(|err| SurveyError::Validation(format!("invalid request body: {err}")))
}

fn parse_limit(raw: Option<&str>) -> SurveyResult<Option<usize>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| SurveyError::Validation(format!("invalid limit `{value}`")))
    })
    .transpose()
}

fn parse_format(raw: Option<&str>) -> SurveyResult<ExportFormat> {
    match raw {
        None => Ok(ExportFormat::default()),
        Some(value) => ExportFormat::parse(value)
            .ok_or_else(|| SurveyError::Validation(format!("unsupported export format `{value}`"))),
    }
}

fn parse_param_id(raw: &str, name: &str) -> SurveyResult<CategoryId> {
    uuid::Uuid::parse_str(raw.trim())
        .map_err(|_| SurveyError::Validation(format!("invalid {name} `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::{parse_format, parse_limit};
    use crate::export::render::ExportFormat;
    use crate::service::error::ErrorKind;

    #[test]
    fn limit_must_be_a_non_negative_integer() {
        assert_eq!(parse_limit(None).unwrap(), None);
        assert_eq!(parse_limit(Some(" 3 ")).unwrap(), Some(3));
        assert_eq!(
            parse_limit(Some("-1")).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn format_defaults_to_markdown() {
        assert_eq!(parse_format(None).unwrap(), ExportFormat::Markdown);
        assert_eq!(parse_format(Some("HTML")).unwrap(), ExportFormat::Html);
        assert_eq!(parse_format(Some("pdf")).unwrap(), ExportFormat::Pdf);
        assert!(parse_format(Some("docx")).is_err());
    }
}
