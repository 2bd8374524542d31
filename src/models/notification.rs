use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    Share,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
            NotificationType::Share => "share",
        }
    }

    /// Rendered text shown to the recipient.
    pub fn message(&self, sender: &str) -> String {
        match self {
            NotificationType::Like => format!("{} liked your post", sender),
            NotificationType::Comment => format!("{} commented on your post", sender),
            NotificationType::Follow => format!("{} started following you", sender),
            NotificationType::Share => format!("{} shared your post", sender),
        }
    }

    /// Only likes are withdrawn when the triggering edge goes away.
    pub fn is_retractable(&self) -> bool {
        matches!(self, NotificationType::Like)
    }
}

impl FromStr for NotificationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            "follow" => Ok(NotificationType::Follow),
            "share" => Ok(NotificationType::Share),
            other => Err(AppError::Store(format!("unknown notification type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub notification_type: NotificationType,
    pub message: String,
    pub post_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
