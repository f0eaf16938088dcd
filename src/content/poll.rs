use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollContent {
    pub question: String,
    /// 2..10 answers.
    pub options: Vec<String>,
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    #[serde(default)]
    pub allows_multiple_answers: bool,
    #[serde(default, deserialize_with = "super::deserialize_schedule")]
    pub schedule: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl PollContent {
    pub fn new(question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            question: question.into(),
            options,
            is_anonymous: true,
            allows_multiple_answers: false,
            schedule: None,
        }
    }
}
