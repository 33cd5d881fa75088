use serde_json::{json, Value};
use wenjuan_core::{ErrorKind, ExportFormat, SurveyCore};

fn feedback_core() -> (SurveyCore, uuid::Uuid) {
    let core = SurveyCore::open_in_memory().unwrap();
    let questionnaire = core
        .questionnaires()
        .create("Customer Feedback", json!({}))
        .unwrap();
    core.answers()
        .submit(questionnaire.id, json!({"q1": "yes"}))
        .unwrap();
    core.answers()
        .submit(questionnaire.id, json!({"q1": "no"}))
        .unwrap();
    (core, questionnaire.id)
}

#[test]
fn markdown_export_lists_answers_in_submission_order() {
    let (core, id) = feedback_core();

    let document = core.exports().render(id, ExportFormat::Markdown).unwrap();
    assert_eq!(document.file_name, format!("questionnaire-{id}.md"));
    assert_eq!(document.content_type, "text/markdown; charset=utf-8");

    let text = String::from_utf8(document.bytes.clone()).unwrap();
    assert!(text.starts_with("# Customer Feedback\n"));
    let yes = text.find("- **q1**: yes").unwrap();
    let no = text.find("- **q1**: no").unwrap();
    assert!(yes < no);
    assert!(text[yes..no].contains("### Answer 2"));
    assert!(!text[no..].contains("### Answer"));

    let again = core.exports().render(id, ExportFormat::Markdown).unwrap();
    assert_eq!(again, document);
}

#[test]
fn declared_questions_label_answer_values() {
    let core = SurveyCore::open_in_memory().unwrap();
    let body = json!({
        "questions": [
            {"id": "q1", "title": "Would you recommend us?"},
            {"id": "q2", "text": "Favourite features"}
        ]
    });
    let questionnaire = core.questionnaires().create("Labelled", body).unwrap();
    core.answers()
        .submit(
            questionnaire.id,
            json!({"q1": "yes", "q2": ["search", "export"], "comment": "great"}),
        )
        .unwrap();

    let document = core
        .exports()
        .render(questionnaire.id, ExportFormat::Markdown)
        .unwrap();
    let text = String::from_utf8(document.bytes).unwrap();
    assert!(text.contains("## Questions"));
    assert!(text.contains("- **Would you recommend us?**: yes"));
    assert!(text.contains("- **Favourite features**: search, export"));
    assert!(text.contains("- **comment**: great"));
}

#[test]
fn html_export_escapes_user_content() {
    let core = SurveyCore::open_in_memory().unwrap();
    let questionnaire = core
        .questionnaires()
        .create("<b>Bold</b> & co", json!({}))
        .unwrap();
    core.answers()
        .submit(questionnaire.id, json!({"q1": "<script>"}))
        .unwrap();

    let document = core
        .exports()
        .render(questionnaire.id, ExportFormat::Html)
        .unwrap();
    assert_eq!(document.content_type, "text/html; charset=utf-8");
    let text = String::from_utf8(document.bytes).unwrap();
    assert!(text.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; co"));
    assert!(!text.contains("<script>"));
}

#[test]
fn json_export_contains_questionnaire_and_answers() {
    let (core, id) = feedback_core();

    let document = core.exports().render(id, ExportFormat::Json).unwrap();
    assert_eq!(document.file_name, format!("questionnaire-{id}.json"));
    let value: Value = serde_json::from_slice(&document.bytes).unwrap();
    assert_eq!(value["questionnaire"]["title"], "Customer Feedback");
    let answers = value["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["payload"], json!({"q1": "yes"}));
    assert_eq!(answers[1]["payload"], json!({"q1": "no"}));
}

#[test]
fn pdf_export_is_deterministic() {
    let core = SurveyCore::open_in_memory().unwrap();
    let questionnaire = core
        .questionnaires()
        .create(
            "Quarterly \"pulse\" #1",
            json!({"questions": [{"id": "q1", "title": "Happy?"}]}),
        )
        .unwrap();
    core.answers()
        .submit(questionnaire.id, json!({"q1": "yes\n= not a heading"}))
        .unwrap();

    let document = core
        .exports()
        .render(questionnaire.id, ExportFormat::Pdf)
        .unwrap();
    assert_eq!(document.content_type, "application/pdf");
    assert_eq!(
        document.file_name,
        format!("questionnaire-{}.pdf", questionnaire.id)
    );
    assert!(document.bytes.starts_with(b"%PDF"));

    let again = core
        .exports()
        .render(questionnaire.id, ExportFormat::Pdf)
        .unwrap();
    assert_eq!(again.bytes, document.bytes);
}

#[test]
fn export_without_answers_and_of_unknown_id() {
    let core = SurveyCore::open_in_memory().unwrap();
    let questionnaire = core.questionnaires().create("Empty", json!({})).unwrap();

    let document = core
        .exports()
        .render(questionnaire.id, ExportFormat::Markdown)
        .unwrap();
    let text = String::from_utf8(document.bytes).unwrap();
    assert!(text.contains("_No answers submitted._"));

    let err = core
        .exports()
        .render(uuid::Uuid::new_v4(), ExportFormat::Markdown)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
