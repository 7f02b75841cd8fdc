//! JSON file store: legacy records, whole-collection rewrites and dedup over disk

use crate::integration::test_utils::artifact_named;
use serde_json::json;
use simmer::dedup;
use simmer::store::{ArtifactStore, JsonFileArtifactStore};
use simmer::{ApiError, Artifact, Language, StorageError};
use tempfile::TempDir;

fn legacy_collection() -> serde_json::Value {
    json!([
        {
            "id": "1690000000000",
            "name": "回锅肉",
            "description": "四川家常菜",
            "steps": ["煮肉", "切片", "回锅"],
            "imageUrl": "https://img/pork.png",
            "stepImages": ["https://img/pork-1.png", null, null],
            "createdAt": "2023-07-22T04:26:40.000Z",
            "likes": 12,
            "views": 340,
            "featured": true
        },
        {
            "id": "1700000000000",
            "name_zh": "胡椒牛排",
            "name_en": "Pepper Steak",
            "steps_en": ["Season", "Sear"],
            "imageUrl": "https://img/steak.png",
            "stepImages": [null, "https://img/steak-2.png"],
            "language": "en"
        }
    ])
}

#[test]
fn rewriting_the_collection_keeps_serving_layer_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recipes.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&legacy_collection()).unwrap()).unwrap();

    let store = JsonFileArtifactStore::new(&path);
    let mut artifacts = store.load().unwrap();
    assert_eq!(artifacts.len(), 2);
    artifacts.push(artifact_named("1710000000000", "番茄炒蛋", "Tomato Eggs"));
    store.save(&artifacts).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let legacy = &written[0];
    assert_eq!(legacy["name"], "回锅肉");
    assert_eq!(legacy["featured"], true);
    assert_eq!(legacy["likes"], 12);
    assert_eq!(legacy["views"], 340);
    assert_eq!(legacy["stepImages"], json!(["https://img/pork-1.png", null, null]));
    assert_eq!(written[2]["name_en"], "Tomato Eggs");
    assert_eq!(written.as_array().map(Vec::len), Some(3));
}

#[test]
fn dedup_over_a_stored_file_respects_record_language() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recipes.json");
    std::fs::write(&path, legacy_collection().to_string()).unwrap();
    let store = JsonFileArtifactStore::new(&path);

    let hit = dedup::find_existing_in(&store, "回锅肉", Language::Zh).unwrap();
    assert_eq!(hit.map(|a| a.id), Some("1690000000000".to_string()));
    assert!(dedup::find_existing_in(&store, "回锅肉", Language::En)
        .unwrap()
        .is_none());

    let hit = dedup::find_existing_in(&store, "PEPPER STEAK", Language::Zh).unwrap();
    assert_eq!(hit.map(|a| a.id), Some("1700000000000".to_string()));
}

#[test]
fn corrupt_collection_surfaces_as_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recipes.json");
    std::fs::write(&path, "[{\"id\": ").unwrap();
    let store = JsonFileArtifactStore::new(&path);

    let err = dedup::find_existing_in(&store, "回锅肉", Language::Zh).unwrap_err();
    assert!(matches!(
        err,
        ApiError::StorageError(StorageError::Corrupt { .. })
    ));
}

#[test]
fn empty_file_is_an_empty_collection() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recipes.json");
    std::fs::write(&path, "\n").unwrap();

    let loaded: Vec<Artifact> = JsonFileArtifactStore::new(&path).load().unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn records_with_model_shaped_fields_still_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recipes.json");
    let collection = json!([
        {"id": "1", "name": "回锅肉", "cookTime": "30分钟", "servings": 2},
        {
            "id": "2",
            "name_zh": "番茄汤",
            "name_en": "Tomato Soup",
            "tips_en": ["Serve hot", "Salt last"],
            "ingredients_en": [{"name": "Tomato", "quantity": "3"}],
            "emoji": null,
            "servings": "4 people"
        },
        {"id": 1700000000000_u64, "name_en": "Fried Rice", "likes": "7", "createdAt": 1704067200000_u64}
    ]);
    std::fs::write(&path, collection.to_string()).unwrap();
    let store = JsonFileArtifactStore::new(&path);

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].cook_time, Some(30));
    assert_eq!(loaded[1].tips_en, "Serve hot\nSalt last");
    assert_eq!(loaded[1].ingredients_en, ["Tomato 3"]);
    assert_eq!(loaded[1].servings, Some(4));
    assert_eq!(loaded[2].id, "1700000000000");
    assert_eq!(loaded[2].likes, 7);
    assert!(loaded[2].created_at.is_some());

    // Lookups and appends keep working on such a collection
    let hit = dedup::find_existing_in(&store, "tomato soup", Language::En).unwrap();
    assert_eq!(hit.map(|a| a.id), Some("2".to_string()));
    let mut artifacts = loaded;
    artifacts.push(artifact_named("3", "饺子", "Dumplings"));
    store.save(&artifacts).unwrap();
    assert_eq!(store.load().unwrap().len(), 4);
}
