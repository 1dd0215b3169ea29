// src/assistant/mod.rs
// Conversational assistant orchestration: gather context, run the
// completion backend, persist both sides of the exchange, and mine the
// reply for structured suggestions.

pub mod extractor;
pub mod store;
pub mod types;

pub use extractor::extract_suggestions;
pub use store::MessageStore;
pub use types::{AssistantMessage, AssistantResponse, ExtractedSuggestions, MessageType};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CONFIG;
use crate::llm::{ChatTurn, CompletionBackend, TranscriptionBackend};
use crate::tasks::{Task, TaskStore};

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
- Minimize decision fatigue

Use these markers in your responses:
BREAKDOWN: for task breakdowns
QUICK_WIN: for immediate, achievable actions
TIME_TIP: for time management strategies
FOCUS: for attention/focus support
EF_SUPPORT: for executive function strategies
ENVIRONMENT: for space/setting adjustments
CALENDAR: for scheduling suggestions
START_NOW: for immediate task initiation help

Format task breakdowns with:
- Clear visual separation between steps
- Numbered sequences for order-dependent tasks
- Bullet points for flexible-order tasks
- Time estimates for each step (accounting for ADHD tax)

Current user context:";

pub struct AssistantService {
    backend: Arc<dyn CompletionBackend>,
    transcription: Option<Arc<dyn TranscriptionBackend>>,
    messages: MessageStore,
    tasks: TaskStore,
}

impl AssistantService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        transcription: Option<Arc<dyn TranscriptionBackend>>,
        messages: MessageStore,
        tasks: TaskStore,
    ) -> Self {
        Self { backend, transcription, messages, tasks }
    }

    pub fn message_store(&self) -> &MessageStore {
        &self.messages
    }

    fn build_system_prompt(tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return SYSTEM_PROMPT.to_string();
        }

        let task_context: String = tasks
            .iter()
            .map(|task| format!("\n- {} (P:{}, S:{})", task.title, task.priority, task.status))
            .collect();

        format!("{}\nTasks:{}", SYSTEM_PROMPT, task_context)
    }

    /// Full message pipeline. The incoming save, the task fetch, and the
    /// history fetch run concurrently; a failure in any aborts the request.
    pub async fn process_message(&self, user_id: &str, content: &str) -> Result<AssistantResponse> {
        let user_message = AssistantMessage::new(user_id, content, MessageType::User);

        let ((), tasks, history) = tokio::try_join!(
            self.messages.append(&user_message),
            self.tasks.list_for_user(user_id),
            self.messages.recent_history(user_id, CONFIG.history_window),
        )
        .context("gathering assistant context")?;

        debug!(
            "Assistant context for {}: {} tasks, {} history messages",
            user_id,
            tasks.len(),
            history.len()
        );

        let system_prompt = Self::build_system_prompt(&tasks);

        let mut turns: Vec<ChatTurn> = history.iter().map(AssistantMessage::as_turn).collect();
        // The history read races the concurrent save; only add the current
        // turn when the window did not already pick it up.
        if history.last().map(|m| m.id.as_str()) != Some(user_message.id.as_str()) {
            turns.push(ChatTurn::user(content));
        }

        let reply = self
            .backend
            .complete(&system_prompt, &turns)
            .await
            .context("completion backend failed")?;

        let assistant_message = AssistantMessage::new(user_id, &reply, MessageType::Assistant);
        self.messages
            .append(&assistant_message)
            .await
            .context("persisting assistant reply")?;

        let suggestions = extract_suggestions(&reply);
        info!(
            "Assistant reply for {} via {} ({} chars)",
            user_id,
            self.backend.name(),
            reply.len()
        );

        Ok(AssistantResponse::from_message(&assistant_message, suggestions))
    }

    /// Voice input: transcribe, then run the exact text pipeline.
    pub async fn process_voice(&self, user_id: &str, base64_audio: &str) -> Result<AssistantResponse> {
        let transcription = self
            .transcription
            .as_ref()
            .context("voice input is not configured")?;
        let text = transcription.transcribe(base64_audio).await?;
        self.process_message(user_id, &text).await
    }

    pub async fn history(&self, user_id: &str, limit: i64) -> Result<Vec<AssistantMessage>> {
        self.messages.recent_history(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::run_migrations;
    use crate::tasks::types::TaskRequest;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Mutex;

    struct EchoBackend {
        reply: String,
        seen_system: Mutex<Option<String>>,
    }

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(&self, system: &str, _turns: &[ChatTurn]) -> Result<String> {
            *self.seen_system.lock().unwrap() = Some(system.to_string());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    async fn service(reply: &str) -> (AssistantService, Arc<EchoBackend>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("in-memory sqlite");
        run_migrations(&pool).await.expect("migrations");
        let backend = Arc::new(EchoBackend {
            reply: reply.to_string(),
            seen_system: Mutex::new(None),
        });
        let service = AssistantService::new(
            backend.clone(),
            None,
            MessageStore::new(pool.clone()),
            TaskStore::new(pool),
        );
        (service, backend)
    }

    #[tokio::test]
    async fn process_message_persists_both_turns() {
        let (service, _) = service("You've got this!").await;
        let response = service.process_message("user-1", "Help me start").await.unwrap();

        assert_eq!(response.content, "You've got this!");
        let history = service.history("user-1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message_type, MessageType::User);
        assert_eq!(history[1].message_type, MessageType::Assistant);
    }

    #[tokio::test]
    async fn system_prompt_lists_open_tasks() {
        let (service, backend) = service("Sure.").await;
        let task = TaskRequest {
            title: "Clean kitchen".into(),
            description: "Wash dishes and mop floor".into(),
            priority: 1,
            status: "pending".into(),
            context: None,
        }
        .into_task("user-1");
        service.tasks.create(&task).await.unwrap();

        service.process_message("user-1", "What first?").await.unwrap();

        let system = backend.seen_system.lock().unwrap().clone().unwrap();
        assert!(system.contains("Tasks:"));
        assert!(system.contains("- Clean kitchen (P:1, S:pending)"));
    }

    #[tokio::test]
    async fn system_prompt_omits_task_block_when_no_tasks() {
        let (service, backend) = service("Sure.").await;
        service.process_message("user-1", "Hi").await.unwrap();

        let system = backend.seen_system.lock().unwrap().clone().unwrap();
        assert!(!system.contains("\nTasks:"));
    }

    #[tokio::test]
    async fn marked_reply_yields_structured_suggestions() {
        let reply = "Let's break it down.\n\
                     BREAKDOWN: Clean kitchen\n\
                     - Steps:\n\
                     - Wash dishes\n\
                     QUICK_WIN: Put one glass away";
        let (service, _) = service(reply).await;
        let response = service.process_message("user-1", "Kitchen is a mess").await.unwrap();

        assert_eq!(
            response.task_breakdown.unwrap().subtasks,
            vec!["Wash dishes"]
        );
        assert_eq!(
            response.dopamine_boosters.unwrap(),
            vec!["Put one glass away"]
        );
    }

    #[tokio::test]
    async fn voice_without_transcription_backend_errors() {
        let (service, _) = service("hi").await;
        assert!(service.process_voice("user-1", "AAAA").await.is_err());
    }
}
