use serde::Serialize;

use crate::db::{FeedOrder, FeedScope, Repository};
use crate::error::{AppError, Result};
use crate::models::{Activity, Page, PostView};

pub const HOME_PAGE_SIZE: u32 = 10;
pub const EXPLORE_PAGE_SIZE: u32 = 12;
pub const PROFILE_PAGE_SIZE: u32 = 12;
pub const SEARCH_PAGE_SIZE: u32 = 10;
pub const ACTIVITY_LIMIT: u32 = 20;

/// Paginated feed views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Viewer's own posts plus followed authors; everything for anonymous viewers.
    Home,
    /// Everything, most engaged first.
    Explore,
    /// One author's posts, by username.
    Profile(String),
    Search(String),
}

impl FeedKind {
    /// Parses a feed name plus its optional argument (username or query).
    pub fn parse(kind: &str, arg: Option<&str>) -> Result<Self> {
        match (kind, arg) {
            ("home", _) => Ok(FeedKind::Home),
            ("explore", _) => Ok(FeedKind::Explore),
            ("profile", Some(username)) => Ok(FeedKind::Profile(username.to_string())),
            ("profile", None) => Err(AppError::validation("username", "Profile feed needs a username.")),
            ("search", query) => Ok(FeedKind::Search(query.unwrap_or_default().to_string())),
            (other, _) => Err(AppError::validation("kind", format!("Unknown feed '{}'.", other))),
        }
    }

    pub fn page_size(&self) -> u32 {
        match self {
            FeedKind::Home => HOME_PAGE_SIZE,
            FeedKind::Explore => EXPLORE_PAGE_SIZE,
            FeedKind::Profile(_) => PROFILE_PAGE_SIZE,
            FeedKind::Search(_) => SEARCH_PAGE_SIZE,
        }
    }
}

/// The reel feed is unpaginated; `truncated` is set when the configured cap
/// hid older reels.
#[derive(Debug, Clone, Serialize)]
pub struct ReelFeed {
    pub items: Vec<PostView>,
    pub limit: u32,
    pub truncated: bool,
}

/// Read-only feed assembly over the store. The viewer is always passed in.
pub struct FeedComposer<'a> {
    repository: &'a Repository,
}

impl<'a> FeedComposer<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self { repository }
    }

    pub async fn page(&self, kind: &FeedKind, page: u32, viewer: Option<i64>) -> Result<Page<PostView>> {
        let (scope, order) = match kind {
            FeedKind::Home => match viewer {
                Some(viewer) => (FeedScope::FollowedBy(viewer), FeedOrder::Newest),
                None => (FeedScope::All, FeedOrder::Newest),
            },
            FeedKind::Explore => (FeedScope::All, FeedOrder::Engagement),
            FeedKind::Profile(username) => {
                let author = self
                    .repository
                    .user_by_username(username)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("user '{}'", username)))?;
                (FeedScope::Author(author.id), FeedOrder::Newest)
            }
            FeedKind::Search(query) => (FeedScope::Matching(query.clone()), FeedOrder::Newest),
        };

        let page = self
            .repository
            .feed_page(scope, order, page, kind.page_size(), viewer)
            .await?;
        tracing::debug!(
            "{:?} feed page {}/{} ({} posts)",
            kind,
            page.number,
            page.num_pages,
            page.items.len()
        );
        Ok(page)
    }

    pub async fn reels(&self, limit: u32, viewer: Option<i64>) -> Result<ReelFeed> {
        let (items, truncated) = self
            .repository
            .feed_capped(FeedScope::Reels, FeedOrder::Newest, limit, viewer)
            .await?;
        if truncated {
            tracing::warn!("Reel feed capped at {} items", limit);
        }
        Ok(ReelFeed {
            items,
            limit,
            truncated,
        })
    }

    /// Own-profile activity: recent likes, saves and comments.
    pub async fn activity(&self, user_id: i64) -> Result<Activity> {
        let (liked_posts, _) = self
            .repository
            .feed_capped(FeedScope::LikedBy(user_id), FeedOrder::EdgeNewest, ACTIVITY_LIMIT, Some(user_id))
            .await?;
        let (saved_posts, _) = self
            .repository
            .feed_capped(FeedScope::SavedBy(user_id), FeedOrder::EdgeNewest, ACTIVITY_LIMIT, Some(user_id))
            .await?;
        let comments = self
            .repository
            .comments_by_author(user_id, ACTIVITY_LIMIT)
            .await?;
        Ok(Activity {
            liked_posts,
            saved_posts,
            comments,
        })
    }
}
