//! Submission boundary: dedup before scheduling, batches on the bulk lane

use crate::integration::test_utils::{artifact_named, recipe_json, FakeExecutor, ScriptedBackend};
use simmer::config::{PipelineConfig, SchedulerConfig};
use simmer::generation::GenerationPipeline;
use simmer::store::InMemoryArtifactStore;
use simmer::{ApiError, GenerationService, Language, Lane, PriorityScheduler};
use std::sync::Arc;
use std::time::Duration;

fn service_with(
    executor: &Arc<FakeExecutor>,
    store: Arc<InMemoryArtifactStore>,
) -> GenerationService {
    let scheduler = PriorityScheduler::spawn(executor.clone(), SchedulerConfig::default()).unwrap();
    GenerationService::new(store, Arc::new(scheduler))
}

fn stored_pepper_steak() -> Arc<InMemoryArtifactStore> {
    Arc::new(InMemoryArtifactStore::with_artifacts(vec![artifact_named(
        "1700000000000",
        "胡椒牛排",
        "Pepper Steak",
    )]))
}

#[tokio::test(start_paused = true)]
async fn stored_dish_is_returned_without_queueing() {
    let executor = Arc::new(FakeExecutor::new(Duration::from_secs(5)));
    let service = service_with(&executor, stored_pepper_steak());

    let outcome = service
        .generate("  pepper   STEAK ", Language::En, Lane::Interactive)
        .await
        .unwrap();

    assert!(outcome.cached);
    assert_eq!(outcome.artifact.id, "1700000000000");
    assert!(executor.started_names().is_empty());
    assert_eq!(service.status().stats.interactive_completed, 0);

    // Either language's name hits a bilingual record
    let outcome = service
        .generate("胡椒牛排", Language::Zh, Lane::Bulk)
        .await
        .unwrap();
    assert!(outcome.cached);
}

#[tokio::test(start_paused = true)]
async fn new_dish_is_generated_once_then_reused() {
    let backend = Arc::new(ScriptedBackend::new(recipe_json("胡椒牛排", "Pepper Steak", 3)));
    let store = Arc::new(InMemoryArtifactStore::new());
    let pipeline = GenerationPipeline::new(backend.clone(), store.clone(), PipelineConfig::default());
    let scheduler = PriorityScheduler::spawn(Arc::new(pipeline), SchedulerConfig::default()).unwrap();
    let service = GenerationService::new(store.clone(), Arc::new(scheduler));

    let first = service
        .generate("Pepper Steak", Language::En, Lane::Interactive)
        .await
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.artifact.step_images.len(), 3);

    let second = service
        .generate("pepper steak", Language::En, Lane::Interactive)
        .await
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.artifact.id, first.artifact.id);

    assert_eq!(backend.content_calls(), 1);
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn blank_name_is_rejected_up_front() {
    let executor = Arc::new(FakeExecutor::new(Duration::from_secs(5)));
    let service = service_with(&executor, Arc::new(InMemoryArtifactStore::new()));

    let err = service
        .generate(" \t ", Language::Zh, Lane::Interactive)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(executor.started_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn batch_skips_stored_blank_and_repeated_names() {
    let executor = Arc::new(FakeExecutor::new(Duration::from_secs(5)));
    let service = service_with(&executor, stored_pepper_steak());

    let queued = service
        .batch_generate(
            &["Pepper Steak", " ", "Tomato Soup", "tomato  soup", "Fried Rice"],
            Language::En,
        )
        .unwrap();

    let names: Vec<&str> = queued.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["Tomato Soup", "Fried Rice"]);

    for (_, pending) in queued {
        pending.await.unwrap();
    }
    let stats = service.status().stats;
    assert_eq!(stats.bulk_completed, 2);
    assert_eq!(stats.interactive_completed, 0);
}

#[tokio::test(start_paused = true)]
async fn interactive_request_jumps_a_running_batch() {
    let executor = Arc::new(FakeExecutor::new(Duration::from_secs(5)));
    let service = service_with(&executor, Arc::new(InMemoryArtifactStore::new()));

    let queued = service
        .batch_generate(&["Tomato Soup", "Fried Rice", "Congee"], Language::En)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    let outcome = service
        .generate("Pepper Steak", Language::En, Lane::Interactive)
        .await
        .unwrap();
    assert!(!outcome.cached);

    // Only the batch job already running finished ahead of the interactive one
    assert_eq!(
        executor.started_names(),
        ["Tomato Soup", "Pepper Steak"]
    );

    for (_, pending) in queued {
        pending.await.unwrap();
    }
    assert_eq!(
        executor.started_names(),
        ["Tomato Soup", "Pepper Steak", "Fried Rice", "Congee"]
    );
}

#[tokio::test(start_paused = true)]
async fn clearing_the_bulk_lane_cancels_unstarted_batch_jobs() {
    let executor = Arc::new(FakeExecutor::new(Duration::from_secs(5)));
    let service = service_with(&executor, Arc::new(InMemoryArtifactStore::new()));

    let mut queued = service
        .batch_generate(&["Tomato Soup", "Fried Rice", "Congee"], Language::En)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(service.clear_bulk_lane(), 2);
    let (_, first) = queued.remove(0);
    assert!(first.await.is_ok());
    for (_, pending) in queued {
        assert!(matches!(pending.await, Err(ApiError::JobCancelled(_))));
    }
}
