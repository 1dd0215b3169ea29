// src/analyzer/mod.rs
// Breakdown generation: cache-aside over the completion backend, gated by
// the per-user daily quota. A breakdown is an enhancement; generation
// failures degrade to a typed "skipped" outcome instead of an error, so
// task creation never fails because the model misbehaved.

pub mod cache;
pub mod usage;
pub mod validator;

pub use cache::{fingerprint, BreakdownCache};
pub use usage::UsageTracker;

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::CompletionBackend;
use crate::tasks::types::{Task, TaskBreakdown};
use validator::validate_breakdown;

const SYSTEM_PROMPT: &str = "You are a supportive ADHD-focused productivity assistant. Your role is to help users with ADHD manage their tasks, time, and energy levels. Remember that ADHD affects executive function, making task initiation, time management, and maintaining focus challenging.

Key ADHD Support Principles:
1. Task Initiation Support:
- Provide specific \"getting started\" micro-steps
- Suggest body-doubling or accountability partners
- Identify potential obstacles and solutions

2. Time Management:
- Account for time blindness in estimates
- Include transition time between tasks
- Suggest breaks based on energy levels
- Use time-blocking with buffer zones

3. Focus and Attention:
- Minimize context switching
- Identify optimal focus times
- Suggest environmental modifications
- Include dopamine-friendly reward systems

4. Executive Function Support:
- Break tasks into very small, concrete steps
- Provide external structure and scaffolding
- Include clear start/stop signals
- Minimize decision fatigue";

/// Why a generation produced no breakdown. Quota exhaustion is not a skip;
/// it is `AnalyzerError::QuotaExceeded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The backend call itself failed (network, upstream error).
    BackendFailed(String),
    /// The completion was not a parseable JSON object of the right shape.
    InvalidJson(String),
    /// Parsed fine but violated a structural invariant.
    FailedValidation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(TaskBreakdown),
    Cached(TaskBreakdown),
    Skipped(SkipReason),
}

impl GenerationOutcome {
    pub fn breakdown(self) -> Option<TaskBreakdown> {
        match self {
            GenerationOutcome::Generated(b) | GenerationOutcome::Cached(b) => Some(b),
            GenerationOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("daily generation limit of {limit} reached")]
    QuotaExceeded { limit: i64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct TaskAnalyzer {
    backend: Arc<dyn CompletionBackend>,
    cache: BreakdownCache,
    usage: UsageTracker,
}

impl TaskAnalyzer {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        cache: BreakdownCache,
        usage: UsageTracker,
    ) -> Self {
        Self { backend, cache, usage }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    fn build_prompt(task: &Task) -> String {
        let context_info = match &task.context {
            Some(context) => format!(
                "\nContext Information:\n- Time of Day: {}\n- Energy Level: {}/3\n- Environment: {}\n- Medications: {}\n",
                context.time_of_day,
                context.energy_level,
                context.environment,
                if context.current_medications { "Yes" } else { "No" }
            ),
            None => String::new(),
        };

        format!(
            r#"Analyze this task and provide a structured ADHD-friendly breakdown.
Task: {title}
Description: {description}
Priority: {priority}
{context_info}
Consider the context when providing suggestions. Adjust time estimates and strategies based on energy levels and environment.

Respond with a single JSON object and nothing else, using this structure:
{{
    "steps": [
        {{
            "description": "Gather all required materials and set up workspace",
            "time_estimate": 5,
            "initiation_tip": "Start by clearing your desk completely",
            "completion_signal": "All materials are within arm's reach",
            "focus_strategy": "Remove any visible distractions from workspace",
            "dopamine_hook": "Satisfaction of having an organized space"
        }}
    ],
    "suggested_breaks": [2, 4],
    "adhd_supports": ["Use body doubling for focus", "Use visual timer"],
    "initiation_strategy": "Start with the physical act of clearing your workspace",
    "energy_level_needed": 2,
    "context_switches": 3,
    "materials_needed": ["Sticky notes", "Timer"],
    "environment_setup": ["Clear desk of unrelated items", "Set up visual timer in view"]
}}"#,
            title = task.title,
            description = task.description,
            priority = task.priority,
            context_info = context_info,
        )
    }

    fn parse_breakdown(text: &str) -> Result<TaskBreakdown, SkipReason> {
        let trimmed = text.trim();

        let mut breakdown: TaskBreakdown = serde_json::from_str(trimmed)
            .or_else(|first_err| {
                // Models sometimes wrap the object in prose or fences;
                // retry on the outermost brace span before giving up.
                match (trimmed.find('{'), trimmed.rfind('}')) {
                    (Some(start), Some(end)) if start < end => {
                        serde_json::from_str(&trimmed[start..=end])
                    }
                    _ => Err(first_err),
                }
            })
            .map_err(|e| SkipReason::InvalidJson(e.to_string()))?;

        validate_breakdown(&mut breakdown)
            .map_err(|e| SkipReason::FailedValidation(e.to_string()))?;

        Ok(breakdown)
    }

    /// One backend round-trip. Never fails the caller; every failure mode
    /// collapses into a `Skipped` outcome with its reason.
    pub async fn generate(&self, task: &Task) -> GenerationOutcome {
        let prompt = Self::build_prompt(task);
        let turns = [crate::llm::ChatTurn::user(prompt)];

        let text = match self.backend.complete(SYSTEM_PROMPT, &turns).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Breakdown generation failed via {}: {}", self.backend.name(), e);
                return GenerationOutcome::Skipped(SkipReason::BackendFailed(e.to_string()));
            }
        };

        match Self::parse_breakdown(&text) {
            Ok(breakdown) => GenerationOutcome::Generated(breakdown),
            Err(reason) => {
                warn!("Discarding unusable breakdown: {:?}", reason);
                GenerationOutcome::Skipped(reason)
            }
        }
    }

    /// Quota check, then cache lookup, then generation. The quota is
    /// consumed per attempt, cached or not, and exhaustion surfaces as a
    /// distinguished error so the API layer can answer 429 instead of 500.
    pub async fn get_or_generate(&self, task: &Task) -> Result<GenerationOutcome, AnalyzerError> {
        let allowed = self.usage.check_and_consume(&task.user_id).await?;
        if !allowed {
            return Err(AnalyzerError::QuotaExceeded {
                limit: self.usage.daily_limit(),
            });
        }

        let key = fingerprint(&task.title, &task.description);

        if let Some(raw) = self.cache.get(&key).await {
            match Self::parse_breakdown(&raw) {
                Ok(breakdown) => {
                    info!("Breakdown cache hit for {}", key);
                    return Ok(GenerationOutcome::Cached(breakdown));
                }
                Err(reason) => {
                    // Undecodable entry: treat as a miss, regenerate, and
                    // let the fresh write overwrite it.
                    warn!("Ignoring bad cache entry for {}: {:?}", key, reason);
                }
            }
        }

        let outcome = self.generate(task).await;

        if let GenerationOutcome::Generated(breakdown) = &outcome {
            match serde_json::to_string(breakdown) {
                Ok(json) => self.cache.put(&key, &json).await,
                Err(e) => warn!("Could not serialize breakdown for cache: {}", e),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatTurn;
    use crate::storage::run_migrations;
    use crate::tasks::types::{TaskContext, TaskRequest};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Mutex;

    struct CannedBackend {
        responses: Mutex<Vec<anyhow::Result<String>>>,
        calls: Mutex<usize>,
    }

    impl CannedBackend {
        fn new(responses: Vec<anyhow::Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(&self, _system: &str, _turns: &[ChatTurn]) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(anyhow!("no canned response left"))
            } else {
                responses.remove(0)
            }
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn valid_breakdown_json() -> String {
        serde_json::json!({
            "steps": [{
                "description": "Clear the counter",
                "time_estimate": 5,
                "initiation_tip": "Grab one item",
                "completion_signal": "Counter is empty",
                "focus_strategy": "Timer for 5 minutes",
                "dopamine_hook": "Visible clean surface"
            }],
            "suggested_breaks": [0],
            "adhd_supports": ["Body doubling"],
            "initiation_strategy": "Start with the counter",
            "energy_level_needed": 2,
            "context_switches": 1,
            "materials_needed": ["Timer"],
            "environment_setup": ["Clear desk"]
        })
        .to_string()
    }

    fn task(context: Option<TaskContext>) -> Task {
        TaskRequest {
            title: "Clean kitchen".into(),
            description: "Wash dishes and mop floor".into(),
            priority: 2,
            status: "pending".into(),
            context,
        }
        .into_task("user-1")
    }

    async fn analyzer(backend: Arc<dyn CompletionBackend>, limit: i64) -> TaskAnalyzer {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("in-memory sqlite");
        run_migrations(&pool).await.expect("migrations");
        TaskAnalyzer::new(
            backend,
            BreakdownCache::new(pool.clone()),
            UsageTracker::new(pool, limit),
        )
    }

    #[test]
    fn prompt_without_context_has_no_context_block() {
        let prompt = TaskAnalyzer::build_prompt(&task(None));
        assert!(!prompt.contains("Context Information"));
        assert!(!prompt.contains("Energy Level"));
        assert!(prompt.contains("Task: Clean kitchen"));
        assert!(prompt.contains("Priority: 2"));
    }

    #[test]
    fn prompt_with_context_renders_all_fields() {
        let prompt = TaskAnalyzer::build_prompt(&task(Some(TaskContext {
            time_of_day: "morning".into(),
            energy_level: 1,
            environment: "home".into(),
            current_medications: true,
        })));
        assert!(prompt.contains("- Time of Day: morning"));
        assert!(prompt.contains("- Energy Level: 1/3"));
        assert!(prompt.contains("- Environment: home"));
        assert!(prompt.contains("- Medications: Yes"));
    }

    #[test]
    fn parse_tolerates_surrounding_prose() {
        let wrapped = format!("Here you go:\n{}\nHope this helps!", valid_breakdown_json());
        let breakdown = TaskAnalyzer::parse_breakdown(&wrapped).unwrap();
        assert_eq!(breakdown.steps.len(), 1);
    }

    #[tokio::test]
    async fn generate_returns_skip_on_invalid_json() {
        let backend = Arc::new(CannedBackend::new(vec![Ok("not json at all".into())]));
        let analyzer = analyzer(backend, 10).await;

        match analyzer.generate(&task(None)).await {
            GenerationOutcome::Skipped(SkipReason::InvalidJson(_)) => {}
            other => panic!("expected InvalidJson skip, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn generate_returns_skip_on_backend_failure() {
        let backend = Arc::new(CannedBackend::new(vec![Err(anyhow!("connection refused"))]));
        let analyzer = analyzer(backend, 10).await;

        match analyzer.generate(&task(None)).await {
            GenerationOutcome::Skipped(SkipReason::BackendFailed(msg)) => {
                assert!(msg.contains("connection refused"));
            }
            other => panic!("expected BackendFailed skip, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let backend = Arc::new(CannedBackend::new(vec![Ok(valid_breakdown_json())]));
        let analyzer = analyzer(backend.clone(), 10).await;
        let task = task(None);

        match analyzer.get_or_generate(&task).await.unwrap() {
            GenerationOutcome::Generated(_) => {}
            other => panic!("expected fresh generation, got {:?}", other),
        }
        match analyzer.get_or_generate(&task).await.unwrap() {
            GenerationOutcome::Cached(b) => assert_eq!(b.steps.len(), 1),
            other => panic!("expected cache hit, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn quota_exhaustion_is_a_distinguished_error() {
        let backend = Arc::new(CannedBackend::new(vec![
            Ok(valid_breakdown_json()),
            Ok(valid_breakdown_json()),
        ]));
        let analyzer = analyzer(backend, 1).await;
        let task = task(None);

        analyzer.get_or_generate(&task).await.unwrap();
        match analyzer.get_or_generate(&task).await {
            Err(AnalyzerError::QuotaExceeded { limit }) => assert_eq!(limit, 1),
            other => panic!("expected quota error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn validation_failure_skips_and_does_not_cache() {
        let no_steps = serde_json::json!({
            "steps": [],
            "suggested_breaks": [],
            "adhd_supports": [],
            "initiation_strategy": "",
            "energy_level_needed": 2,
            "context_switches": 0,
            "materials_needed": [],
            "environment_setup": []
        })
        .to_string();
        let backend = Arc::new(CannedBackend::new(vec![
            Ok(no_steps),
            Ok(valid_breakdown_json()),
        ]));
        let analyzer = analyzer(backend.clone(), 10).await;
        let task = task(None);

        match analyzer.get_or_generate(&task).await.unwrap() {
            GenerationOutcome::Skipped(SkipReason::FailedValidation(_)) => {}
            other => panic!("expected validation skip, got {:?}", other),
        }
        // Nothing cached, so the retry reaches the backend again.
        match analyzer.get_or_generate(&task).await.unwrap() {
            GenerationOutcome::Generated(_) => {}
            other => panic!("expected fresh generation, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 2);
    }
}
