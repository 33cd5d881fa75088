use serde_json::json;
use std::collections::BTreeSet;
use wenjuan_core::{CategoryDeleteMode, CoreConfig, Database, ErrorKind, SurveyCore};

fn category_names(core: &SurveyCore, questionnaire_id: uuid::Uuid) -> BTreeSet<String> {
    core.questionnaires()
        .categories(questionnaire_id)
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect()
}

#[test]
fn create_normalizes_and_rejects_duplicates_ignoring_case() {
    let core = SurveyCore::open_in_memory().unwrap();
    let store = core.categories();

    let sales = store.create("  Sales   Team ").unwrap();
    assert_eq!(sales.name, "Sales Team");

    let err = store.create("sales team").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = store.create(" \t ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn list_keeps_insertion_order_across_renames() {
    let core = SurveyCore::open_in_memory().unwrap();
    let store = core.categories();
    let first = store.create("Alpha").unwrap();
    store.create("Beta").unwrap();

    store.update(first.id, "Zulu").unwrap();

    let names: Vec<String> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Zulu", "Beta"]);
}

#[test]
fn rename_conflicts_with_other_names_but_not_its_own() {
    let core = SurveyCore::open_in_memory().unwrap();
    let store = core.categories();
    let sales = store.create("Sales").unwrap();
    store.create("Support").unwrap();

    let err = store.update(sales.id, "SUPPORT").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let recased = store.update(sales.id, "SALES").unwrap();
    assert_eq!(recased.name, "SALES");
    assert_eq!(store.get(sales.id).unwrap().name, "SALES");

    let err = store.update(uuid::Uuid::new_v4(), "Other").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn deleting_category_detaches_it_without_touching_questionnaires() {
    let core = SurveyCore::open_in_memory().unwrap();
    let sales = core.categories().create("Sales").unwrap();
    let support = core.categories().create("Support").unwrap();
    let questionnaire = core
        .questionnaires()
        .create("Quarterly", json!({}))
        .unwrap();
    core.questionnaires()
        .attach_category(questionnaire.id, sales.id)
        .unwrap();
    core.questionnaires()
        .attach_category(questionnaire.id, support.id)
        .unwrap();

    core.categories().delete(sales.id).unwrap();

    let fetched = core.questionnaires().get(questionnaire.id).unwrap();
    assert_eq!(fetched.category_ids, BTreeSet::from([support.id]));
    assert_eq!(
        category_names(&core, questionnaire.id),
        BTreeSet::from(["Support".to_string()])
    );
    assert_eq!(
        core.categories().get(sales.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        core.categories().delete(sales.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn reject_mode_refuses_to_delete_categories_in_use() {
    let config = CoreConfig {
        category_delete: CategoryDeleteMode::Reject,
        ..CoreConfig::default()
    };
    let core = SurveyCore::with_database(Database::open_in_memory().unwrap(), &config);
    assert_eq!(core.categories().delete_mode(), CategoryDeleteMode::Reject);

    let tag = core.categories().create("Tagged").unwrap();
    let questionnaire = core.questionnaires().create("Uses tag", json!({})).unwrap();
    core.questionnaires()
        .attach_category(questionnaire.id, tag.id)
        .unwrap();

    let err = core.categories().delete(tag.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(core.categories().get(tag.id).unwrap().name, "Tagged");

    core.questionnaires()
        .detach_category(questionnaire.id, tag.id)
        .unwrap();
    core.categories().delete(tag.id).unwrap();
}

#[test]
fn attach_then_detach_restores_original_set() {
    let core = SurveyCore::open_in_memory().unwrap();
    let existing = core.categories().create("Existing").unwrap();
    let extra = core.categories().create("Extra").unwrap();
    let questionnaire = core.questionnaires().create("Tags", json!({})).unwrap();
    core.questionnaires()
        .attach_category(questionnaire.id, existing.id)
        .unwrap();
    let before = core.questionnaires().get(questionnaire.id).unwrap();

    let attached = core
        .questionnaires()
        .attach_category(questionnaire.id, extra.id)
        .unwrap();
    assert!(attached.category_ids.contains(&extra.id));
    let again = core
        .questionnaires()
        .attach_category(questionnaire.id, extra.id)
        .unwrap();
    assert_eq!(again.category_ids.len(), 2);

    let detached = core
        .questionnaires()
        .detach_category(questionnaire.id, extra.id)
        .unwrap();
    assert_eq!(detached.category_ids, before.category_ids);
    assert_eq!(detached.updated_at, before.updated_at);

    // Detaching an absent edge is a no-op.
    let unchanged = core
        .questionnaires()
        .detach_category(questionnaire.id, extra.id)
        .unwrap();
    assert_eq!(unchanged.category_ids, before.category_ids);
}

#[test]
fn attach_requires_both_sides_to_exist() {
    let core = SurveyCore::open_in_memory().unwrap();
    let category = core.categories().create("Lonely").unwrap();
    let questionnaire = core.questionnaires().create("Alone", json!({})).unwrap();

    let err = core
        .questionnaires()
        .attach_category(questionnaire.id, uuid::Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = core
        .questionnaires()
        .attach_category(uuid::Uuid::new_v4(), category.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(core
        .questionnaires()
        .get(questionnaire.id)
        .unwrap()
        .category_ids
        .is_empty());
}

#[test]
fn list_by_category_filters_in_listing_order() {
    let core = SurveyCore::open_in_memory().unwrap();
    let tag = core.categories().create("Filtered").unwrap();
    let older = core.questionnaires().create("older", json!({})).unwrap();
    core.questionnaires().create("untagged", json!({})).unwrap();
    let newer = core.questionnaires().create("newer", json!({})).unwrap();
    core.questionnaires().attach_category(older.id, tag.id).unwrap();
    core.questionnaires().attach_category(newer.id, tag.id).unwrap();

    let ids: Vec<_> = core
        .questionnaires()
        .list_by_category(tag.id)
        .unwrap()
        .into_iter()
        .map(|questionnaire| questionnaire.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let err = core
        .questionnaires()
        .list_by_category(uuid::Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
