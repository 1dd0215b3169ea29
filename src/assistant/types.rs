// src/assistant/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{ChatTurn, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "assistant" => MessageType::Assistant,
            _ => MessageType::User,
        }
    }
}

/// Append-only conversation log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AssistantMessage {
    pub fn new(user_id: &str, content: &str, message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            message_type,
            category: None,
            timestamp: Utc::now(),
        }
    }

    pub fn as_turn(&self) -> ChatTurn {
        ChatTurn {
            role: match self.message_type {
                MessageType::User => Role::User,
                MessageType::Assistant => Role::Assistant,
            },
            content: self.content.clone(),
        }
    }
}

/// Executive-function support category derived by keyword match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfCategory {
    TaskInitiation,
    Organization,
    Planning,
    Attention,
    EmotionalRegulation,
    WorkingMemory,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfSupport {
    pub strategy: String,
    pub category: EfCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSuggestion {
    pub tip: String,
    #[serde(rename = "type")]
    pub suggestion_type: String,
}

impl CalendarSuggestion {
    pub fn time_management(tip: impl Into<String>) -> Self {
        Self {
            tip: tip.into(),
            suggestion_type: "time_management".to_string(),
        }
    }
}

/// Flat breakdown shape assembled from a conversational reply's BREAKDOWN
/// section (distinct from the analyzer's step-structured breakdown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBreakdown {
    pub main_task: String,
    pub subtasks: Vec<String>,
    pub estimated_time: i64,
    pub difficulty_level: i64,
    pub energy_level_needed: i64,
    pub context_switches: i64,
    pub initiation_tips: Vec<String>,
    pub dopamine_hooks: Vec<String>,
    pub break_points: Vec<i64>,
}

impl ChatBreakdown {
    pub fn with_main_task(main_task: impl Into<String>) -> Self {
        Self {
            main_task: main_task.into(),
            subtasks: Vec::new(),
            estimated_time: 30,
            difficulty_level: 2,
            energy_level_needed: 2,
            context_switches: 1,
            initiation_tips: Vec::new(),
            dopamine_hooks: Vec::new(),
            break_points: Vec::new(),
        }
    }
}

/// Transient bundle built per assistant reply; folded into the API
/// response and discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSuggestions {
    pub tasks: Vec<String>,
    pub calendar_events: Vec<CalendarSuggestion>,
    pub dopamine_boosters: Vec<String>,
    pub focus_tips: Vec<String>,
    pub ef_supports: Vec<EfSupport>,
    pub environment_tips: Vec<String>,
    pub task_breakdown: Option<ChatBreakdown>,
}

/// API-facing reply. Empty collections serialize as absent fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_breakdown: Option<ChatBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_suggestions: Option<Vec<CalendarSuggestion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dopamine_boosters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_tips: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executive_function_supports: Option<Vec<EfSupport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_adjustments: Option<Vec<String>>,
}

fn none_if_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl AssistantResponse {
    pub fn from_message(message: &AssistantMessage, suggestions: ExtractedSuggestions) -> Self {
        Self {
            content: message.content.clone(),
            task_breakdown: suggestions.task_breakdown,
            suggested_tasks: none_if_empty(suggestions.tasks),
            calendar_suggestions: none_if_empty(suggestions.calendar_events),
            dopamine_boosters: none_if_empty(suggestions.dopamine_boosters),
            focus_tips: none_if_empty(suggestions.focus_tips),
            executive_function_supports: none_if_empty(suggestions.ef_supports),
            environment_adjustments: none_if_empty(suggestions.environment_tips),
        }
    }
}
