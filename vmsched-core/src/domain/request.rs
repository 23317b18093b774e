//! Batch request parameters

use serde::{Deserialize, Serialize};

/// How the remote system retries an operation that fails on its side
///
/// Both values are range-checked by the remote system; the client sends
/// them through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub retry_count: u32,
    pub retry_window_in_minutes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_window_in_minutes: 60,
        }
    }
}

/// Whether a scheduled deadline marks the start or the end of the work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeadlineType {
    #[default]
    InitiateAt,
    CompleteBy,
}

/// When a scheduled (submit-type) batch should run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "deadLine")]
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub time_zone: String,
    pub deadline_type: DeadlineType,
}

impl Schedule {
    pub fn new(deadline: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            deadline,
            time_zone: "UTC".to_string(),
            deadline_type: DeadlineType::default(),
        }
    }
}
