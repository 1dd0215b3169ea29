// src/tasks/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("title must be 5-30 characters")]
    TitleLength,
    #[error("description must be 5-100 characters")]
    DescriptionLength,
    #[error("priority must be between 1 and 3")]
    PriorityRange,
    #[error("status must be one of: pending, in_progress, completed")]
    InvalidStatus,
    #[error("time of day must be one of: morning, afternoon, evening, any")]
    InvalidTimeOfDay,
    #[error("environment must be one of: home, work, school, outside, any")]
    InvalidEnvironment,
    #[error("energy level must be between 1 and 3")]
    EnergyRange,
}

pub const VALID_STATUSES: &[&str] = &["pending", "in_progress", "completed"];
pub const VALID_TIMES_OF_DAY: &[&str] = &["morning", "afternoon", "evening", "any"];
pub const VALID_ENVIRONMENTS: &[&str] = &["home", "work", "school", "outside", "any"];

/// Situational context attached to a task; shapes the analyzer's prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskContext {
    #[serde(default = "default_any")]
    pub time_of_day: String,
    #[serde(default = "default_energy")]
    pub energy_level: i64,
    #[serde(default = "default_any")]
    pub environment: String,
    #[serde(default)]
    pub current_medications: bool,
}

fn default_any() -> String {
    "any".to_string()
}

fn default_energy() -> i64 {
    2
}

impl TaskContext {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !VALID_TIMES_OF_DAY.contains(&self.time_of_day.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidTimeOfDay);
        }
        if !VALID_ENVIRONMENTS.contains(&self.environment.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidEnvironment);
        }
        if !(1..=3).contains(&self.energy_level) {
            return Err(ValidationError::EnergyRange);
        }
        Ok(())
    }
}

/// One step of a generated breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStep {
    pub description: String,
    pub time_estimate: i64,
    pub initiation_tip: String,
    pub completion_signal: String,
    pub focus_strategy: String,
    pub dopamine_hook: String,
}

/// Structured ADHD-friendly decomposition of a task, produced by the
/// analyzer from the model's JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskBreakdown {
    pub steps: Vec<TaskStep>,
    /// Indices into `steps` where a break is recommended.
    pub suggested_breaks: Vec<i64>,
    pub adhd_supports: Vec<String>,
    pub initiation_strategy: String,
    pub energy_level_needed: i64,
    pub context_switches: i64,
    pub materials_needed: Vec<String>,
    pub environment_setup: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub priority: i64,
    pub status: String,
    pub context: Option<TaskContext>,
    pub breakdown: Option<TaskBreakdown>,
    pub last_analyzed: bool,
    pub created_at: DateTime<Utc>,
}

/// Incoming create/update payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub description: String,
    pub priority: i64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub context: Option<TaskContext>,
}

fn default_status() -> String {
    "pending".to_string()
}

impl TaskRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title_len = self.title.chars().count();
        if !(5..=30).contains(&title_len) {
            return Err(ValidationError::TitleLength);
        }
        let desc_len = self.description.chars().count();
        if !(5..=100).contains(&desc_len) {
            return Err(ValidationError::DescriptionLength);
        }
        if !(1..=3).contains(&self.priority) {
            return Err(ValidationError::PriorityRange);
        }
        if !VALID_STATUSES.contains(&self.status.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidStatus);
        }
        if let Some(context) = &self.context {
            context.validate()?;
        }
        Ok(())
    }

    pub fn into_task(self, user_id: &str) -> Task {
        Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: self.title,
            description: self.description,
            priority: self.priority,
            status: self.status.to_lowercase(),
            context: self.context,
            breakdown: None,
            last_analyzed: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TaskRequest {
        TaskRequest {
            title: "Clean kitchen".into(),
            description: "Wash dishes and mop floor".into(),
            priority: 2,
            status: "pending".into(),
            context: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn short_title_is_rejected() {
        let mut req = request();
        req.title = "abc".into();
        assert!(matches!(req.validate(), Err(ValidationError::TitleLength)));
    }

    #[test]
    fn bad_status_is_rejected() {
        let mut req = request();
        req.status = "done".into();
        assert!(matches!(req.validate(), Err(ValidationError::InvalidStatus)));
    }

    #[test]
    fn context_energy_out_of_range_is_rejected() {
        let mut req = request();
        req.context = Some(TaskContext {
            time_of_day: "morning".into(),
            energy_level: 5,
            environment: "home".into(),
            current_medications: false,
        });
        assert!(matches!(req.validate(), Err(ValidationError::EnergyRange)));
    }

    #[test]
    fn into_task_normalizes_status_case() {
        let mut req = request();
        req.status = "Pending".into();
        let task = req.into_task("user-1");
        assert_eq!(task.status, "pending");
        assert!(!task.last_analyzed);
        assert!(task.breakdown.is_none());
    }
}
