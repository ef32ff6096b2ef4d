//! Queue rows and enqueue requests.

use super::QueueState;
use crate::registry::CategoryValue;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One job in the queue, with its category references resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: i64,
    pub state: QueueState,
    pub name: String,
    /// Location after path mapping.
    pub path: String,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub local_source: Option<CategoryValue>,
    pub remote_source: Option<CategoryValue>,
    pub remote_group: Option<CategoryValue>,
}

/// Everything needed to enqueue a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnqueueRequest {
    pub name: String,
    /// Path as reported by the caller, before path mapping.
    pub path: String,
    pub local_source: Option<String>,
    pub remote_source: Option<String>,
    pub remote_group: Option<String>,
}

impl EnqueueRequest {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn local_source(mut self, name: impl Into<String>) -> Self {
        self.local_source = Some(name.into());
        self
    }

    pub fn remote_source(mut self, name: Option<String>) -> Self {
        self.remote_source = name;
        self
    }

    pub fn remote_group(mut self, name: Option<String>) -> Self {
        self.remote_group = name;
        self
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}
