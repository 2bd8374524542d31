use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PostView;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }
}

/// Entry in a followers/following listing.
#[derive(Debug, Clone, Serialize)]
pub struct FollowEntry {
    pub user: User,
    pub followed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub viewer_is_following: bool,
    pub is_own_profile: bool,
}

/// Own-profile activity tab: recent likes, saves and comments.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub liked_posts: Vec<PostView>,
    pub saved_posts: Vec<PostView>,
    pub comments: Vec<super::CommentView>,
}
