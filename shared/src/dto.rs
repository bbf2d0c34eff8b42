use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// One queue entry as handed to the batch driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueMessage {
    /// Delivery id (`topic:partition:offset` for Kafka), used for log correlation only.
    #[serde(default, rename = "messageId")]
    pub message_id: String,
    pub body: String,
}

impl QueueMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
        }
    }
}

/// Opaque report key. Numeric ids are kept in their decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Report fields as returned by the store, passed through untouched.
pub type ReportRecord = serde_json::Map<String, serde_json::Value>;

/// Urgency levels the model assigns; the discriminant is the stored `priority_id`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            4 => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// A validated model answer. Every text field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAnswer {
    pub recommendation: String,
    pub short_answer: String,
    pub official_summary: String,
    #[serde(rename = "suggest_priority_id", serialize_with = "priority_as_id")]
    pub priority: Priority,
}

fn priority_as_id<S: serde::Serializer>(p: &Priority, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i32(p.id())
}

/// What ends up in the store for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedAnswer {
    pub report_id: ReportId,
    #[serde(flatten)]
    pub answer: ModelAnswer,
}
