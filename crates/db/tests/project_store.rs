//! Integration tests for the Postgres project store.

use addata_core::ad_data::AdData;
use addata_core::error::CoreError;
use addata_core::project::{NewProject, NewScript, Script, UpdateProject, UpdateScript};
use addata_core::store::ProjectStore;
use addata_db::repositories::{MigrationRepo, ProjectRepo};
use addata_db::PgProjectStore;
use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;

fn named(name: &str) -> NewProject {
    NewProject {
        name: name.into(),
        ..Default::default()
    }
}

fn script(script_id: &str) -> NewScript {
    NewScript {
        script_id: script_id.into(),
        name: format!("Script {script_id}"),
        data: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_check(pool: PgPool) {
    addata_db::health_check(&pool).await.unwrap();
    PgProjectStore::new(pool).health_check().await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_read_round_trip(pool: PgPool) {
    let store = PgProjectStore::new(pool);

    let mut data = AdData::default();
    data.bidfloor_config.interstitial.bidfloor_ids =
        vec!["a1b2c3d4e5f6g7h8".into(), "b2c3d4e5f6g7h8i9".into()];
    data.bidfloor_config.interstitial.load_count = 5;
    let demo = Script {
        script_id: "default_script".into(),
        name: "Default".into(),
        data,
    };

    let created = store
        .create_project(NewProject {
            name: "Demo".into(),
            description: Some("demo project".into()),
            scripts: Some(vec![demo.clone()]),
        })
        .await
        .unwrap();

    let by_id = store.get_project_by_id(created.id).await.unwrap();
    assert_eq!(by_id.data.scripts, vec![demo]);
    assert_eq!(by_id.description.as_deref(), Some("demo project"));

    let by_name = store.get_project_by_name("Demo").await.unwrap();
    assert_eq!(by_name.id, created.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_new_project_gets_default_script(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store.create_project(named("Seeded")).await.unwrap();
    assert_eq!(project.data.scripts, vec![Script::seed()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_name_maps_to_domain_error(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let first = store.create_project(named("Demo")).await.unwrap();

    let err = store.create_project(named("Demo")).await.unwrap_err();
    assert_matches!(err, CoreError::DuplicateName(name) if name == "Demo");

    let other = store.create_project(named("Other")).await.unwrap();
    assert_matches!(
        store.rename_project(other.id, "Demo").await,
        Err(CoreError::DuplicateName(_))
    );

    assert_eq!(store.get_project_by_id(first.id).await.unwrap(), first);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_clears_blank_description(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store
        .create_project(NewProject {
            name: "Demo".into(),
            description: Some("to be cleared".into()),
            scripts: None,
        })
        .await
        .unwrap();

    let updated = store
        .update_project(
            project.id,
            UpdateProject {
                name: None,
                description: Some("   ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.name, "Demo");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_script_id_is_rejected(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store.create_project(named("Demo")).await.unwrap();

    store.add_script(project.id, script("GAME_1")).await.unwrap();
    let err = store
        .add_script(project.id, script("GAME_1"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::DuplicateScriptId { .. });

    let scripts = store.list_scripts(project.id).await.unwrap();
    assert_eq!(scripts.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_adds_of_same_script_id(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store.create_project(named("Demo")).await.unwrap();

    let (a, b) = tokio::join!(
        store.add_script(project.id, script("RACE")),
        store.add_script(project.id, script("RACE")),
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CoreError::DuplicateScriptId { .. }))));

    let scripts = store.list_scripts(project.id).await.unwrap();
    assert_eq!(scripts.iter().filter(|s| s.script_id == "RACE").count(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_script_data_is_not_written(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store.create_project(named("Demo")).await.unwrap();

    let mut bad = AdData::default();
    bad.default_ad_unit_data.banner_id = "TOO-SHORT".into();
    let err = store
        .update_script(
            project.id,
            "DEFAULT",
            UpdateScript {
                name: None,
                data: Some(bad),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(errors) if errors[0].contains("bannerId"));

    let unchanged = store.get_project_by_id(project.id).await.unwrap();
    assert_eq!(unchanged, project);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_project_and_scripts(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let project = store.create_project(named("Demo")).await.unwrap();
    store.add_script(project.id, script("EXTRA")).await.unwrap();

    store.delete_script(project.id, "EXTRA").await.unwrap();
    assert_matches!(
        store.get_script(project.id, "EXTRA").await,
        Err(CoreError::NotFound { entity: "Script", .. })
    );

    store.delete_project(project.id).await.unwrap();
    assert_matches!(
        store.delete_project(project.id).await,
        Err(CoreError::NotFound { entity: "Project", .. })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_migration_is_idempotent(pool: PgPool) {
    let legacy_id = uuid::Uuid::new_v4();
    MigrationRepo::insert_legacy(
        &pool,
        legacy_id,
        "Old",
        Some("GAME_1"),
        &json!({
            "defaultAdUnitData": { "bannerId": "c3d4e5f6g7h8i9j0" },
            "bidfloorConfig": {}
        }),
    )
    .await
    .unwrap();

    let store = PgProjectStore::new(pool.clone());
    store.create_project(named("New")).await.unwrap();

    let status = store.migration_status().await.unwrap();
    assert_eq!(status.old_structure_count, 1);
    assert!(status.needs_migration);

    let first = store.migrate_legacy().await.unwrap();
    assert_eq!((first.migrated, first.skipped), (1, 1));

    let row = ProjectRepo::find_by_id(&pool, legacy_id).await.unwrap().unwrap();
    assert_eq!(row.script_id, None);
    assert_eq!(row.data.0["scripts"][0]["scriptId"], "GAME_1");
    assert_eq!(row.data.0["scripts"][0]["name"], "Script GAME_1");
    assert_eq!(
        row.data.0["scripts"][0]["data"]["defaultAdUnitData"]["bannerId"],
        "c3d4e5f6g7h8i9j0"
    );

    let second = store.migrate_legacy().await.unwrap();
    assert_eq!((second.migrated, second.skipped), (0, 2));

    let status = store.migration_status().await.unwrap();
    assert!(status.is_fully_migrated);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_malformed_row_aborts_whole_migration(pool: PgPool) {
    let good = uuid::Uuid::new_v4();
    MigrationRepo::insert_legacy(&pool, good, "Good", Some("A"), &json!({}))
        .await
        .unwrap();
    MigrationRepo::insert_legacy(&pool, uuid::Uuid::new_v4(), "Bad", None, &json!({ "scripts": 1 }))
        .await
        .unwrap();

    let store = PgProjectStore::new(pool.clone());
    assert_matches!(store.migrate_legacy().await, Err(CoreError::Storage(_)));

    let row = ProjectRepo::find_by_id(&pool, good).await.unwrap().unwrap();
    assert_eq!(row.script_id.as_deref(), Some("A"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rollback_restores_first_script(pool: PgPool) {
    let store = PgProjectStore::new(pool.clone());
    let project = store.create_project(named("Demo")).await.unwrap();
    store.add_script(project.id, script("SECOND")).await.unwrap();

    let outcome = store.rollback_migration().await.unwrap();
    assert_eq!(outcome.rolled_back, 1);

    let row = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(row.script_id.as_deref(), Some("DEFAULT"));
    assert!(row.data.0.get("scripts").is_none());

    // Legacy rows still read as a single script.
    let scripts = store.list_scripts(project.id).await.unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].script_id, "DEFAULT");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_script_ids_spans_projects(pool: PgPool) {
    let store = PgProjectStore::new(pool);
    let a = store.create_project(named("A")).await.unwrap();
    let b = store.create_project(named("B")).await.unwrap();
    store.add_script(a.id, script("ZED")).await.unwrap();
    store.add_script(b.id, script("ZED")).await.unwrap();
    store.add_script(b.id, script("ALPHA")).await.unwrap();

    assert_eq!(
        store.list_script_ids().await.unwrap(),
        vec!["ALPHA", "DEFAULT", "ZED"]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_listings_tolerate_undecodable_rows(pool: PgPool) {
    let store = PgProjectStore::new(pool.clone());
    store.create_project(named("Healthy")).await.unwrap();
    let loose = uuid::Uuid::new_v4();
    MigrationRepo::insert_legacy(
        &pool,
        loose,
        "Loose",
        Some("GAME_7"),
        &json!({ "defaultAdUnitData": { "bannerId": null } }),
    )
    .await
    .unwrap();
    MigrationRepo::insert_legacy(&pool, uuid::Uuid::new_v4(), "Broken", None, &json!({ "scripts": 1 }))
        .await
        .unwrap();

    assert_matches!(store.get_project_by_id(loose).await, Err(CoreError::Storage(_)));

    let summaries = store.list_projects().await.unwrap();
    assert_eq!(summaries.len(), 3);
    let loose_summary = summaries.iter().find(|s| s.id == loose).unwrap();
    assert_eq!(loose_summary.script_count, 1);

    assert_eq!(
        store.list_script_ids().await.unwrap(),
        vec!["DEFAULT", "GAME_7"]
    );
}
