//! Shared test utilities for integration tests
//!
//! Environment isolation for config tests, plus scripted stand-ins for the
//! job executor and the generation backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use simmer::backend::GenerationBackend;
use simmer::generation::JobExecutor;
use simmer::{ApiError, Artifact, Language};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

const ISOLATED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "SIMMER_ENV",
    "AI_GATEWAY_API_KEY",
    "SIMMER__BACKEND__API_KEY",
];

/// Run `f` with HOME and XDG_CONFIG_HOME inside `test_dir` and the credential
/// variables cleared. The original environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|key| (*key, std::env::var(key).ok()))
        .collect();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_home.join(".config"));
    for key in &ISOLATED_VARS[2..] {
        std::env::remove_var(key);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Minimal bilingual artifact named `name` in both languages.
pub fn artifact_named(id: &str, name_zh: &str, name_en: &str) -> Artifact {
    serde_json::from_value(json!({
        "id": id,
        "name_zh": name_zh,
        "name_en": name_en,
        "imageUrl": "https://img/hero.png",
    }))
    .unwrap()
}

/// Content stage response with `steps` steps in both languages.
pub fn recipe_json(name_zh: &str, name_en: &str, steps: usize) -> String {
    let steps_zh: Vec<String> = (1..=steps).map(|i| format!("步骤{}", i)).collect();
    let steps_en: Vec<String> = (1..=steps).map(|i| format!("Step {}", i)).collect();
    json!({
        "name_zh": name_zh,
        "name_en": name_en,
        "description_zh": "家常菜",
        "description_en": "A home-style dish",
        "emoji": "🍲",
        "cookTime": 30,
        "difficulty_zh": "简单",
        "difficulty_en": "Easy",
        "servings": 2,
        "ingredients_zh": ["盐 少许"],
        "ingredients_en": ["Salt, a pinch"],
        "steps_zh": steps_zh,
        "steps_en": steps_en,
        "tips_zh": "趁热吃",
        "tips_en": "Serve hot"
    })
    .to_string()
}

/// What a [`FakeExecutor`] does for one requested name.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Succeed(Duration),
    Fail,
    Hang,
    Panic,
}

/// Executor that follows a per-name script and records what it saw.
pub struct FakeExecutor {
    behaviours: HashMap<String, Behaviour>,
    default_delay: Duration,
    started: Mutex<Vec<(String, Instant)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeExecutor {
    pub fn new(default_delay: Duration) -> Self {
        Self {
            behaviours: HashMap::new(),
            default_delay,
            started: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, name: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(name.to_string(), behaviour);
        self
    }

    /// Names in the order their jobs started.
    pub fn started_names(&self) -> Vec<String> {
        self.started.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn started_at(&self, name: &str) -> Option<Instant> {
        self.started
            .lock()
            .iter()
            .find(|(started, _)| started == name)
            .map(|(_, at)| *at)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// Decrements the active count even when the job future is dropped mid-flight.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobExecutor for FakeExecutor {
    async fn run(&self, requested_name: &str, language: Language) -> Result<Artifact, ApiError> {
        self.started
            .lock()
            .push((requested_name.to_string(), Instant::now()));
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        let behaviour = self
            .behaviours
            .get(requested_name)
            .copied()
            .unwrap_or(Behaviour::Succeed(self.default_delay));

        match behaviour {
            Behaviour::Succeed(delay) => {
                tokio::time::sleep(delay).await;
                let mut artifact = artifact_named(requested_name, requested_name, requested_name);
                artifact.language = Some(language);
                Ok(artifact)
            }
            Behaviour::Fail => Err(ApiError::BackendError(format!(
                "scripted failure for {}",
                requested_name
            ))),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Panic => panic!("scripted panic for {}", requested_name),
        }
    }
}

/// Backend with a fixed content response and scripted image outcomes.
///
/// The first image call of a job is the hero image; later calls are step
/// images, indexed from zero.
pub struct ScriptedBackend {
    content: Option<String>,
    hero_fails: bool,
    failing_steps: HashSet<usize>,
    hanging_steps: HashSet<usize>,
    content_calls: AtomicUsize,
    image_prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            hero_fails: false,
            failing_steps: HashSet::new(),
            hanging_steps: HashSet::new(),
            content_calls: AtomicUsize::new(0),
            image_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every content call fails with a backend error.
    pub fn unavailable() -> Self {
        Self {
            content: None,
            ..Self::new("")
        }
    }

    pub fn with_failing_hero(mut self) -> Self {
        self.hero_fails = true;
        self
    }

    pub fn with_failing_step(mut self, index: usize) -> Self {
        self.failing_steps.insert(index);
        self
    }

    pub fn with_hanging_step(mut self, index: usize) -> Self {
        self.hanging_steps.insert(index);
        self
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_prompts.lock().len()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_content(&self, _prompt: &str) -> Result<String, ApiError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.content
            .clone()
            .ok_or_else(|| ApiError::BackendError("content service unavailable".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError> {
        let call = {
            let mut prompts = self.image_prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        if call == 0 {
            if self.hero_fails {
                return Err(ApiError::BackendError("hero image failed".to_string()));
            }
            return Ok("https://img/hero.png".to_string());
        }

        let step = call - 1;
        if self.hanging_steps.contains(&step) {
            std::future::pending::<()>().await;
        }
        if self.failing_steps.contains(&step) {
            return Err(ApiError::BackendError(format!("step {} image failed", step)));
        }
        Ok(format!("https://img/step-{}.png", step))
    }
}
