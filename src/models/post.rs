use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::youtube;

pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_CAPTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Text,
    Image,
    Video,
    Reel,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
            PostType::Reel => "reel",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(PostType::Text),
            "image" => Ok(PostType::Image),
            "video" => Ok(PostType::Video),
            "reel" => Ok(PostType::Reel),
            other => Err(AppError::validation(
                "post_type",
                format!("Unknown post type '{}'.", other),
            )),
        }
    }
}

/// Where the client should land after creating a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Redirect {
    Home,
    Reels,
}

impl Redirect {
    pub fn after_creating(post_type: PostType) -> Self {
        match post_type {
            PostType::Reel => Redirect::Reels,
            _ => Redirect::Home,
        }
    }
}

/// Raw post payload as submitted by the request layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub post_type: PostType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub caption: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub youtube_url: Option<String>,
}

/// A draft that passed the per-type rules, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub post_type: PostType,
    pub content: String,
    pub caption: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub reel_video_id: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PostDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Text,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn image(image: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Image,
            image: Some(image.into()),
            caption: caption.into(),
            ..Self::default()
        }
    }

    pub fn video(video: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Video,
            video: Some(video.into()),
            caption: caption.into(),
            ..Self::default()
        }
    }

    pub fn reel(youtube_url: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Reel,
            youtube_url: Some(youtube_url.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<ValidPost> {
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::validation(
                "content",
                format!("Content is limited to {} characters.", MAX_CONTENT_CHARS),
            ));
        }
        if self.caption.chars().count() > MAX_CAPTION_CHARS {
            return Err(AppError::validation(
                "caption",
                format!("Caption is limited to {} characters.", MAX_CAPTION_CHARS),
            ));
        }

        let image = present(&self.image);
        let video = present(&self.video);
        if image.is_some() && video.is_some() {
            return Err(AppError::validation(
                "video",
                "A post carries either an image or a video, not both.",
            ));
        }

        let mut reel_video_id = None;
        match self.post_type {
            PostType::Image if image.is_none() => {
                return Err(AppError::validation("image", "Image is required for image posts."));
            }
            PostType::Video if video.is_none() => {
                return Err(AppError::validation(
                    "video",
                    "Video file is required for video posts.",
                ));
            }
            PostType::Reel => {
                let url = present(&self.youtube_url).ok_or_else(|| {
                    AppError::validation("youtube_url", "YouTube URL is required for reel posts.")
                })?;
                let id = youtube::extract_video_id(&url).ok_or_else(|| {
                    AppError::validation(
                        "youtube_url",
                        "Please provide a valid YouTube URL (e.g., https://www.youtube.com/shorts/VIDEO_ID)",
                    )
                })?;
                reel_video_id = Some(id);
            }
            PostType::Text if self.content.trim().is_empty() => {
                return Err(AppError::validation("content", "Content is required for text posts."));
            }
            _ => {}
        }

        Ok(ValidPost {
            post_type: self.post_type,
            content: self.content.clone(),
            caption: self.caption.clone(),
            image,
            video,
            reel_video_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub caption: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub reel_video_id: Option<String>,
    pub post_type: PostType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Post {
    pub fn youtube_embed_url(&self) -> Option<String> {
        self.reel_video_id.as_deref().map(youtube::embed_url)
    }

    pub fn youtube_thumbnail_url(&self) -> Option<String> {
        self.reel_video_id.as_deref().map(youtube::thumbnail_url)
    }
}

/// A post as shown to one viewer: derived counters plus per-viewer flags.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub saves_count: i64,
    pub shares_count: i64,
    pub viewer_has_liked: bool,
    pub viewer_has_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl PostView {
    pub fn engagement(&self) -> i64 {
        self.likes_count + self.comments_count
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    pub post_id: i64,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Deleted {
    pub status: &'static str,
}

impl Deleted {
    pub fn new() -> Self {
        Self { status: "deleted" }
    }
}

impl Default for Deleted {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> &'static str {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn text_post_needs_content() {
        let err = PostDraft::text("").validate().unwrap_err();
        assert_eq!(field_of(err), "content");

        let err = PostDraft::text("   \n").validate().unwrap_err();
        assert_eq!(field_of(err), "content");

        assert!(PostDraft::text("hello").validate().is_ok());
    }

    #[test]
    fn reel_stores_extracted_id_not_url() {
        let valid = PostDraft::reel("https://youtube.com/shorts/HYo8tXAzSeI?si=etqpdK0oQzEQp_WH")
            .validate()
            .unwrap();
        assert_eq!(valid.reel_video_id.as_deref(), Some("HYo8tXAzSeI"));
        assert_eq!(valid.post_type, PostType::Reel);
    }

    #[test]
    fn reel_rejects_unparsable_url() {
        let err = PostDraft::reel("not a url").validate().unwrap_err();
        assert_eq!(field_of(err), "youtube_url");

        let draft = PostDraft {
            post_type: PostType::Reel,
            ..PostDraft::default()
        };
        assert_eq!(field_of(draft.validate().unwrap_err()), "youtube_url");
    }

    #[test]
    fn media_posts_need_their_media() {
        let draft = PostDraft {
            post_type: PostType::Image,
            image: Some("  ".into()),
            ..PostDraft::default()
        };
        assert_eq!(field_of(draft.validate().unwrap_err()), "image");

        let draft = PostDraft {
            post_type: PostType::Video,
            ..PostDraft::default()
        };
        assert_eq!(field_of(draft.validate().unwrap_err()), "video");

        let valid = PostDraft::image("posts/cat.jpg", "a cat").validate().unwrap();
        assert_eq!(valid.image.as_deref(), Some("posts/cat.jpg"));
    }

    #[test]
    fn image_and_video_are_exclusive() {
        let mut draft = PostDraft::image("posts/a.jpg", "");
        draft.video = Some("videos/a.mp4".into());
        assert_eq!(field_of(draft.validate().unwrap_err()), "video");
    }

    #[test]
    fn length_limits() {
        let long = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert_eq!(field_of(PostDraft::text(long).validate().unwrap_err()), "content");

        let mut draft = PostDraft::image("posts/a.jpg", "c".repeat(MAX_CAPTION_CHARS + 1));
        assert_eq!(field_of(draft.clone().validate().unwrap_err()), "caption");
        draft.caption = "c".repeat(MAX_CAPTION_CHARS);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn post_type_parses() {
        assert_eq!("reel".parse::<PostType>().unwrap(), PostType::Reel);
        assert!("story".parse::<PostType>().is_err());
    }
}
