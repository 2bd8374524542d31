use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const MAX_SHARED_TO_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    On,
    Off,
}

/// Outcome of flipping an edge: the new state and the recomputed counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub state: ToggleState,
    pub count: i64,
}

impl Toggle {
    pub fn is_on(&self) -> bool {
        self.state == ToggleState::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    #[default]
    Link,
    Story,
    Direct,
    External,
}

impl ShareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareType::Link => "link",
            ShareType::Story => "story",
            ShareType::Direct => "direct",
            ShareType::External => "external",
        }
    }
}

impl FromStr for ShareType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "link" => Ok(ShareType::Link),
            "story" => Ok(ShareType::Story),
            "direct" => Ok(ShareType::Direct),
            "external" => Ok(ShareType::External),
            other => Err(AppError::validation(
                "share_type",
                format!("Unknown share type '{}'.", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shared {
    pub shares_count: i64,
    pub share_id: i64,
}

/// A like edge as stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_type_defaults_to_link() {
        assert_eq!("".parse::<ShareType>().unwrap(), ShareType::Link);
        assert_eq!("story".parse::<ShareType>().unwrap(), ShareType::Story);
        assert!("carrier-pigeon".parse::<ShareType>().is_err());
    }

    #[test]
    fn toggle_serializes_lowercase_state() {
        let json = serde_json::to_value(Toggle {
            state: ToggleState::On,
            count: 3,
        })
        .unwrap();
        assert_eq!(json["state"], "on");
        assert_eq!(json["count"], 3);
    }
}
