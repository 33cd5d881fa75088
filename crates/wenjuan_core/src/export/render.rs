//! Deterministic document renderer for questionnaire exports.
//!
//! # Responsibility
//! - Render Markdown, HTML, JSON and PDF documents from an [`ExportSnapshot`].
//! - Pair answer payload values with the questions declared in the body.
//!
//! # Invariants
//! - Answers appear in snapshot order (submission order), one block each.
//! - Output contains no wall-clock data; object keys are emitted sorted.
//! - Body schema recognized: `{"questions": [{"id": .., "title"|"text"|"label": ..}]}`.
//!   Any other body shape is rendered as pretty-printed JSON.

use super::pdf::compile_pdf;
use crate::model::answer::Answer;
use crate::model::questionnaire::Questionnaire;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{self, Display, Formatter, Write as _};

const PROMPT_KEYS: [&str; 4] = ["title", "text", "label", "question"];

/// Export document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Pdf,
}

impl ExportFormat {
    /// Parses a user-facing format name (`markdown`/`md`, `html`, `json`, `pdf`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }
}

/// Read snapshot consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSnapshot {
    pub questionnaire: Questionnaire,
    /// Answers in submission order.
    pub answers: Vec<Answer>,
}

/// Rendered, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Rendering failure.
#[derive(Debug)]
pub enum ExportError {
    Encode(serde_json::Error),
    Format(fmt::Error),
    /// Typesetting or PDF serialization failed.
    Pdf(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode export document: {err}"),
            Self::Format(err) => write!(f, "failed to format export document: {err}"),
            Self::Pdf(message) => write!(f, "failed to typeset pdf export: {message}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Format(err) => Some(err),
            Self::Pdf(_) => None,
        }
    }
}

impl From<fmt::Error> for ExportError {
    fn from(value: fmt::Error) -> Self {
        Self::Format(value)
    }
}

/// Renders one snapshot in the requested format.
pub fn render_document(
    snapshot: &ExportSnapshot,
    format: ExportFormat,
) -> Result<ExportDocument, ExportError> {
    let bytes = match format {
        ExportFormat::Markdown => render_markdown(snapshot)?.into_bytes(),
        ExportFormat::Html => render_html(snapshot)?.into_bytes(),
        ExportFormat::Json => {
            let document = json!({
                "questionnaire": snapshot.questionnaire,
                "answers": snapshot.answers,
            });
            serde_json::to_vec_pretty(&document).map_err(ExportError::Encode)?
        }
        ExportFormat::Pdf => compile_pdf(&render_typst(snapshot)?).map_err(ExportError::Pdf)?,
    };

    Ok(ExportDocument {
        file_name: format!(
            "questionnaire-{}.{}",
            snapshot.questionnaire.id,
            format.extension()
        ),
        content_type: format.content_type(),
        bytes,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuestionSpec {
    id: String,
    prompt: Option<String>,
}

impl QuestionSpec {
    fn label(&self) -> &str {
        self.prompt.as_deref().unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnswerLine {
    label: String,
    value: String,
}

fn question_specs(body: &Value) -> Vec<QuestionSpec> {
    let Some(questions) = body.get("questions").and_then(Value::as_array) else {
        return Vec::new();
    };

    questions
        .iter()
        .filter_map(|question| {
            let id = match question.get("id")? {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                _ => return None,
            };
            let prompt = PROMPT_KEYS
                .iter()
                .find_map(|key| question.get(*key).and_then(Value::as_str))
                .map(str::to_string);
            Some(QuestionSpec { id, prompt })
        })
        .collect()
}

/// Pairs payload values with questions; `None` when the payload is not an
/// object and must be rendered verbatim.
fn answer_lines(questions: &[QuestionSpec], payload: &Value) -> Option<Vec<AnswerLine>> {
    let object = payload.as_object()?;
    let mut lines = Vec::with_capacity(object.len().max(questions.len()));
    let mut covered = BTreeSet::new();

    for question in questions {
        covered.insert(question.id.as_str());
        lines.push(AnswerLine {
            label: question.label().to_string(),
            value: object
                .get(&question.id)
                .map_or_else(|| "(no answer)".to_string(), display_value),
        });
    }

    let mut extra_keys: Vec<&String> = object
        .keys()
        .filter(|key| !covered.contains(key.as_str()))
        .collect();
    extra_keys.sort();
    for key in extra_keys {
        lines.push(AnswerLine {
            label: key.clone(),
            value: object.get(key).map(display_value).unwrap_or_default(),
        });
    }

    Some(lines)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render_markdown(snapshot: &ExportSnapshot) -> Result<String, fmt::Error> {
    let questionnaire = &snapshot.questionnaire;
    let questions = question_specs(&questionnaire.body);
    let mut out = String::new();

    writeln!(out, "# {}", questionnaire.title)?;
    out.push('\n');
    writeln!(out, "- Questionnaire ID: {}", questionnaire.id)?;
    writeln!(out, "- Created at (epoch ms): {}", questionnaire.created_at)?;
    writeln!(out, "- Updated at (epoch ms): {}", questionnaire.updated_at)?;
    writeln!(out, "- Answers: {}", snapshot.answers.len())?;
    out.push('\n');

    if questions.is_empty() {
        out.push_str("## Content\n\n```json\n");
        out.push_str(&pretty_json(&questionnaire.body));
        out.push_str("\n```\n\n");
    } else {
        out.push_str("## Questions\n\n");
        for (index, question) in questions.iter().enumerate() {
            writeln!(out, "{}. {} (`{}`)", index + 1, question.label(), question.id)?;
        }
        out.push('\n');
    }

    out.push_str("## Answers\n\n");
    if snapshot.answers.is_empty() {
        out.push_str("_No answers submitted._\n");
        return Ok(out);
    }

    for (index, answer) in snapshot.answers.iter().enumerate() {
        writeln!(out, "### Answer {}", index + 1)?;
        out.push('\n');
        writeln!(out, "- Answer ID: {}", answer.id)?;
        writeln!(out, "- Submitted at (epoch ms): {}", answer.submitted_at)?;
        writeln!(out, "- Updated at (epoch ms): {}", answer.updated_at)?;
        out.push('\n');
        match answer_lines(&questions, &answer.payload) {
            Some(lines) if !lines.is_empty() => {
                for line in lines {
                    writeln!(out, "- **{}**: {}", line.label, line.value)?;
                }
            }
            _ => {
                out.push_str("```json\n");
                out.push_str(&pretty_json(&answer.payload));
                out.push_str("\n```\n");
            }
        }
        out.push('\n');
    }

    Ok(out)
}

fn render_html(snapshot: &ExportSnapshot) -> Result<String, fmt::Error> {
    let questionnaire = &snapshot.questionnaire;
    let questions = question_specs(&questionnaire.body);
    let title = escape_html(&questionnaire.title);
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    writeln!(out, "<title>{title}</title>")?;
    out.push_str("</head>\n<body>\n");
    writeln!(out, "<h1>{title}</h1>")?;
    out.push_str("<ul class=\"meta\">\n");
    writeln!(out, "<li>Questionnaire ID: {}</li>", questionnaire.id)?;
    writeln!(out, "<li>Created at (epoch ms): {}</li>", questionnaire.created_at)?;
    writeln!(out, "<li>Updated at (epoch ms): {}</li>", questionnaire.updated_at)?;
    writeln!(out, "<li>Answers: {}</li>", snapshot.answers.len())?;
    out.push_str("</ul>\n");

    if questions.is_empty() {
        out.push_str("<h2>Content</h2>\n<pre>");
        out.push_str(&escape_html(&pretty_json(&questionnaire.body)));
        out.push_str("</pre>\n");
    } else {
        out.push_str("<h2>Questions</h2>\n<ol>\n");
        for question in &questions {
            writeln!(
                out,
                "<li>{} (<code>{}</code>)</li>",
                escape_html(question.label()),
                escape_html(&question.id)
            )?;
        }
        out.push_str("</ol>\n");
    }

    out.push_str("<h2>Answers</h2>\n");
    if snapshot.answers.is_empty() {
        out.push_str("<p><em>No answers submitted.</em></p>\n");
    }
    for (index, answer) in snapshot.answers.iter().enumerate() {
        writeln!(out, "<section class=\"answer\" id=\"answer-{}\">", answer.id)?;
        writeln!(out, "<h3>Answer {}</h3>", index + 1)?;
        writeln!(
            out,
            "<p>Submitted at (epoch ms): {}; updated at (epoch ms): {}</p>",
            answer.submitted_at, answer.updated_at
        )?;
        match answer_lines(&questions, &answer.payload) {
            Some(lines) if !lines.is_empty() => {
                out.push_str("<dl>\n");
                for line in lines {
                    writeln!(
                        out,
                        "<dt>{}</dt><dd>{}</dd>",
                        escape_html(&line.label),
                        escape_html(&line.value)
                    )?;
                }
                out.push_str("</dl>\n");
            }
            _ => {
                out.push_str("<pre>");
                out.push_str(&escape_html(&pretty_json(&answer.payload)));
                out.push_str("</pre>\n");
            }
        }
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    Ok(out)
}

/// Typst markup for the PDF backend. User text only enters as string
/// literals, so it is never interpreted as markup.
fn render_typst(snapshot: &ExportSnapshot) -> Result<String, fmt::Error> {
    let questionnaire = &snapshot.questionnaire;
    let questions = question_specs(&questionnaire.body);
    let mut out = String::new();

    out.push_str("#set page(paper: \"a4\", margin: 2cm)\n");
    out.push_str("#set text(size: 11pt)\n\n");
    writeln!(out, "#heading(level: 1, {})\n", typst_string(&questionnaire.title))?;
    writeln!(out, "- Questionnaire ID: {}", questionnaire.id)?;
    writeln!(out, "- Created at (epoch ms): {}", questionnaire.created_at)?;
    writeln!(out, "- Updated at (epoch ms): {}", questionnaire.updated_at)?;
    writeln!(out, "- Answers: {}\n", snapshot.answers.len())?;

    if questions.is_empty() {
        out.push_str("#heading(level: 2, \"Content\")\n");
        writeln!(out, "#raw(block: true, {})\n", typst_string(&pretty_json(&questionnaire.body)))?;
    } else {
        out.push_str("#heading(level: 2, \"Questions\")\n");
        for question in &questions {
            writeln!(
                out,
                "+ #{} (#raw({}))",
                typst_string(question.label()),
                typst_string(&question.id)
            )?;
        }
        out.push('\n');
    }

    out.push_str("#heading(level: 2, \"Answers\")\n");
    if snapshot.answers.is_empty() {
        out.push_str("#emph(\"No answers submitted.\")\n");
        return Ok(out);
    }

    for (index, answer) in snapshot.answers.iter().enumerate() {
        writeln!(out, "#heading(level: 3, \"Answer {}\")", index + 1)?;
        writeln!(out, "- Answer ID: {}", answer.id)?;
        writeln!(out, "- Submitted at (epoch ms): {}", answer.submitted_at)?;
        writeln!(out, "- Updated at (epoch ms): {}\n", answer.updated_at)?;
        match answer_lines(&questions, &answer.payload) {
            Some(lines) if !lines.is_empty() => {
                for line in lines {
                    writeln!(
                        out,
                        "- #strong({}): #{}",
                        typst_string(&line.label),
                        typst_string(&line.value)
                    )?;
                }
            }
            _ => {
                let payload = typst_string(&pretty_json(&answer.payload));
                writeln!(out, "#raw(block: true, {payload})")?;
            }
        }
        out.push('\n');
    }

    Ok(out)
}

/// Quotes `value` as a Typst string literal.
fn typst_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
