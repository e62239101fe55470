//! Subscriber event types
//!
//! Wire messages pushed to live subscribers over the event stream. The
//! `type` tag and payload shapes are part of the external interface.

use crate::model::{DailyAttendance, MergeAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful, mutating reconciliation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    pub action: MergeAction,
    /// Human-facing employee number
    pub employee_id: String,
    pub employee_name: String,
    /// Punch time rendered in the deployment-local zone
    pub timestamp: String,
    pub aggregate: DailyAttendance,
}

/// Messages pushed to live subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubscriberMessage {
    /// Greeting sent once when a subscriber connects
    Connection {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A reconciliation mutated an aggregate
    Attendance {
        data: AttendanceUpdate,
        timestamp: DateTime<Utc>,
    },
}

impl SubscriberMessage {
    pub fn connection(message: impl Into<String>) -> Self {
        SubscriberMessage::Connection {
            message: message.into(),
            timestamp: crate::time::now(),
        }
    }

    pub fn attendance(data: AttendanceUpdate) -> Self {
        SubscriberMessage::Attendance {
            data,
            timestamp: crate::time::now(),
        }
    }

    /// Event name for the SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            SubscriberMessage::Connection { .. } => "connection",
            SubscriberMessage::Attendance { .. } => "attendance",
        }
    }
}
