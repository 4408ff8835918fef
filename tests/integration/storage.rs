//! In-memory storage driven through the provider trait.

use crate::common::{self, fixtures};
use futures::future::join_all;
use scim_core::resource::Document;
use scim_core::storage::{InMemoryStorage, StorageError, StorageKey, StorageProvider};
use serde_json::json;

fn storage() -> InMemoryStorage {
    common::init_logging();
    InMemoryStorage::new(common::registry())
}

async fn populate(storage: &InMemoryStorage) -> Vec<Document> {
    let mut stored = Vec::new();
    for user in fixtures::users() {
        stored.push(storage.create("User", common::user(&user)).await.unwrap());
    }
    stored
}

#[tokio::test]
async fn test_filtered_search_over_stored_users() {
    let storage = storage();
    populate(&storage).await;

    let employees = storage
        .find("User", r#"userType eq "Employee" and emails[type eq "work"]"#)
        .await
        .unwrap();
    let mut names: Vec<_> = employees
        .iter()
        .filter_map(|document| document.attribute("userName")?.as_str().map(str::to_string))
        .collect();
    names.sort();
    assert_eq!(names, ["bjensen@example.com", "jsmith"]);

    // Creation stamps fresh metadata, so every stored user is newer than the fixtures.
    let recent = storage
        .find("User", r#"meta.created gt "2020-01-01T00:00:00Z""#)
        .await
        .unwrap();
    assert_eq!(recent.len(), 3);

    assert!(matches!(
        storage.find("User", "shoeSize pr").await,
        Err(StorageError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn test_concurrent_creates_enforce_uniqueness() {
    let storage = storage();
    let attempts = (0..8).map(|i| {
        let storage = storage.clone();
        async move {
            let user = common::user(&json!({
                "userName": if i % 2 == 0 { "racer" } else { "RACER" },
                "displayName": format!("Racer {}", i)
            }));
            storage.create("User", user).await
        }
    });

    let results = join_all(attempts).await;
    let created = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(created, 1);
    assert!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(StorageError::is_conflict)
    );
    assert_eq!(storage.count("User").await.unwrap(), 1);
}

#[tokio::test]
async fn test_conditional_replace() {
    let storage = storage();
    let stored = populate(&storage).await.remove(0);
    let key = StorageKey::new("User", stored.id().unwrap());
    let original_version = stored.version().unwrap();

    let mut edit = fixtures::bjensen();
    edit["displayName"] = json!("Barbara Jensen");
    let replaced = storage
        .replace(&key, common::user(&edit), Some(&original_version))
        .await
        .unwrap();
    assert_ne!(replaced.version(), Some(original_version.clone()));
    assert_eq!(replaced.meta().unwrap().created(), stored.meta().unwrap().created());

    // A second writer still holding the old version loses.
    let error = storage
        .replace(&key, common::user(&fixtures::bjensen()), Some(&original_version))
        .await
        .unwrap_err();
    assert!(error.is_conflict());

    let current = storage.get(&key).await.unwrap().unwrap();
    assert_eq!(current.attribute("displayName"), replaced.attribute("displayName"));
}

#[tokio::test]
async fn test_replace_cannot_steal_user_name() {
    let storage = storage();
    let stored = populate(&storage).await;
    let jsmith = &stored[1];
    let key = StorageKey::new("User", jsmith.id().unwrap());

    let error = storage
        .replace(&key, common::user(&json!({ "userName": "BJENSEN@example.com" })), None)
        .await
        .unwrap_err();
    match error {
        StorageError::UniquenessViolation { existing_id, .. } => {
            assert_eq!(Some(existing_id.as_str()), stored[0].id())
        }
        other => panic!("expected uniqueness violation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_group_lifecycle() {
    let storage = storage();
    let users = populate(&storage).await;
    let group_schema = common::group_schema();

    let members: Vec<_> = users
        .iter()
        .map(|user| json!({ "value": user.id(), "type": "User" }))
        .collect();
    let group = Document::parse(
        &group_schema,
        &json!({ "displayName": "Tour Guides", "members": members }),
    )
    .unwrap();
    let group = storage.create("Group", group).await.unwrap();
    assert!(group.meta().unwrap().location().unwrap().starts_with("/Groups/"));

    let filter = format!(r#"members[value eq "{}"]"#, users[2].id().unwrap());
    assert_eq!(storage.find("Group", &filter).await.unwrap().len(), 1);

    let key = StorageKey::new("Group", group.id().unwrap());
    assert!(storage.delete(&key).await.unwrap());
    assert!(!storage.delete(&key).await.unwrap());
    assert!(storage.get(&key).await.unwrap().is_none());
    assert_eq!(storage.count("User").await.unwrap(), 3);
}

#[test]
fn test_storage_from_sync_code() {
    let storage = storage();
    let stored = futures::executor::block_on(async {
        storage
            .create("User", common::user(&json!({ "userName": "sync" })))
            .await
    })
    .unwrap();

    let fetched = futures::executor::block_on(
        storage.get(&StorageKey::new("User", stored.id().unwrap())),
    )
    .unwrap();
    assert_eq!(fetched, Some(stored));
}
