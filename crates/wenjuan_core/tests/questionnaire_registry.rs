use serde_json::json;
use wenjuan_core::db::DbError;
use wenjuan_core::{ErrorKind, QuestionnairePatch, SurveyCore, SurveyError};

fn titles(core: &SurveyCore) -> Vec<String> {
    core.questionnaires()
        .list()
        .unwrap()
        .into_iter()
        .map(|questionnaire| questionnaire.title)
        .collect()
}

#[test]
fn create_trims_title_and_starts_unpinned() {
    let core = SurveyCore::open_in_memory().unwrap();
    let body = json!({"questions": [{"id": "q1", "title": "Happy?"}]});

    let created = core
        .questionnaires()
        .create("  Customer Feedback  ", body.clone())
        .unwrap();
    assert_eq!(created.title, "Customer Feedback");
    assert!(!created.pinned);
    assert_eq!(created.pinned_at, None);
    assert!(created.category_ids.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = core.questionnaires().get(created.id).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.body, body);
}

#[test]
fn create_rejects_blank_title() {
    let core = SurveyCore::open_in_memory().unwrap();

    let err = core.questionnaires().create("   ", json!({})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(core.questionnaires().list().unwrap().is_empty());
}

#[test]
fn get_unknown_id_is_not_found() {
    let core = SurveyCore::open_in_memory().unwrap();

    let err = core.questionnaires().get(uuid::Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn list_orders_pinned_first_then_newest() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let first = registry.create("first", json!({})).unwrap();
    registry.create("second", json!({})).unwrap();
    let third = registry.create("third", json!({})).unwrap();

    assert_eq!(titles(&core), vec!["third", "second", "first"]);

    registry.pin(first.id).unwrap();
    assert_eq!(titles(&core), vec!["first", "third", "second"]);

    registry.pin(third.id).unwrap();
    assert_eq!(titles(&core), vec!["third", "first", "second"]);

    // Two reads without writes agree.
    assert_eq!(titles(&core), titles(&core));
}

#[test]
fn pinning_twice_promotes_to_front() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let a = registry.create("a", json!({})).unwrap();
    let b = registry.create("b", json!({})).unwrap();

    let first_pin = registry.pin(a.id).unwrap();
    registry.pin(b.id).unwrap();
    assert_eq!(titles(&core), vec!["b", "a"]);

    let repinned = registry.pin(a.id).unwrap();
    assert!(repinned.pinned);
    assert!(repinned.pinned_at.is_some());
    assert!(repinned.pinned_at >= first_pin.pinned_at);
    assert_eq!(titles(&core), vec!["a", "b"]);
}

#[test]
fn repin_promotes_even_when_clock_lags() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let a = registry.create("a", json!({})).unwrap();
    let b = registry.create("b", json!({})).unwrap();

    registry.pin(a.id).unwrap();
    registry.pin(b.id).unwrap();

    // b looks pinned far in the future, as after a backwards clock step.
    let future = i64::MAX / 2;
    core.database()
        .write(|conn| {
            conn.execute(
                "UPDATE questionnaires SET pinned_at = ?2 WHERE id = ?1;",
                rusqlite::params![b.id.to_string(), future],
            )
            .map_err(DbError::from)
        })
        .unwrap();

    let repinned = registry.pin(a.id).unwrap();
    assert_eq!(titles(&core), vec!["a", "b"]);

    // A re-pin keeps the later of the stored and current timestamps.
    let b_repinned = registry.pin(b.id).unwrap();
    assert_eq!(b_repinned.pinned_at, Some(future));
    assert!(repinned.pinned_at < b_repinned.pinned_at);
    assert_eq!(titles(&core), vec!["b", "a"]);
}

#[test]
fn unpin_is_idempotent_and_keeps_updated_at() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let created = registry.create("survey", json!({})).unwrap();

    let unpinned = registry.unpin(created.id).unwrap();
    assert!(!unpinned.pinned);

    let pinned = registry.pin(created.id).unwrap();
    assert_eq!(pinned.updated_at, created.updated_at);

    let unpinned = registry.unpin(created.id).unwrap();
    assert!(!unpinned.pinned);
    assert_eq!(unpinned.pinned_at, None);
    let again = registry.unpin(created.id).unwrap();
    assert_eq!(again, unpinned);
}

#[test]
fn pin_unknown_id_is_not_found() {
    let core = SurveyCore::open_in_memory().unwrap();

    let err = core.questionnaires().pin(uuid::Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, SurveyError::NotFound { .. }));
}

#[test]
fn update_applies_partial_patch() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let created = registry
        .create("Draft", json!({"questions": []}))
        .unwrap();

    let renamed = registry
        .update(
            created.id,
            QuestionnairePatch {
                title: Some(" Final ".to_string()),
                body: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.title, "Final");
    assert_eq!(renamed.body, json!({"questions": []}));
    assert!(renamed.updated_at >= created.updated_at);
    assert_eq!(renamed.created_at, created.created_at);

    let err = registry
        .update(
            created.id,
            QuestionnairePatch {
                title: Some(String::new()),
                body: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(registry.get(created.id).unwrap().title, "Final");

    let err = registry
        .update(uuid::Uuid::new_v4(), QuestionnairePatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_with_null_body_clears_body() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let created = registry
        .create("Draft", json!({"questions": [{"id": "q1"}]}))
        .unwrap();

    let keep: QuestionnairePatch = serde_json::from_value(json!({"title": "Kept"})).unwrap();
    let kept = registry.update(created.id, keep).unwrap();
    assert_eq!(kept.body, created.body);

    let clear: QuestionnairePatch = serde_json::from_value(json!({"body": null})).unwrap();
    let cleared = registry.update(created.id, clear).unwrap();
    assert_eq!(cleared.title, "Kept");
    assert_eq!(cleared.body, json!(null));
    assert_eq!(registry.get(created.id).unwrap().body, json!(null));
}

#[test]
fn delete_cascades_answers_and_second_delete_fails() {
    let core = SurveyCore::open_in_memory().unwrap();
    let registry = core.questionnaires();
    let created = registry.create("Doomed", json!({})).unwrap();
    let answer = core
        .answers()
        .submit(created.id, json!({"q1": "yes"}))
        .unwrap();
    let category = core.categories().create("Ops").unwrap();
    registry.attach_category(created.id, category.id).unwrap();

    registry.delete(created.id).unwrap();

    assert_eq!(
        registry.get(created.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        core.answers().get(created.id, answer.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        registry.delete(created.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // The category survives; only the edge is gone.
    assert_eq!(core.categories().get(category.id).unwrap().name, "Ops");
    assert!(registry.list_by_category(category.id).unwrap().is_empty());
}
