use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection as SqliteConnection, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, Like, NewUser, Notification, NotificationType, Post, PostType, PostView,
    User,
};

use super::schema::SCHEMA;

/// Result type for code running inside a store closure.
pub(super) type StoreResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

pub struct Repository {
    pub(super) conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Identity reference

    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let username = user.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("username", "Username is required."));
        }

        let user = self
            .conn
            .call(move |conn| {
                let created = conn.execute(
                    "INSERT INTO users (username, first_name, last_name, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![username, user.first_name, user.last_name, now()],
                );
                match created {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        return Err(AppError::invalid(format!("username '{}' is taken", username)).into());
                    }
                    Err(e) => return Err(e.into()),
                }
                let id = conn.last_insert_rowid();
                let user = conn.query_row(
                    &format!("{USER_SELECT} WHERE id = ?1"),
                    params![id],
                    user_from_row,
                )?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        &format!("{USER_SELECT} WHERE username = ?1"),
                        params![username],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        &format!("{USER_SELECT} WHERE id = ?1"),
                        params![id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }
}

pub(super) const USER_SELECT: &str =
    "SELECT id, username, first_name, last_name, created_at FROM users";

pub(super) const POST_SELECT: &str = "SELECT id, author_id, content, caption, image, video, reel_video_id, post_type, created_at, updated_at, is_active FROM posts";

pub(super) const COMMENT_SELECT: &str = "SELECT id, author_id, post_id, content, parent_id, created_at, updated_at, is_active FROM comments";

/// Annotated post projection. `viewer` is the SQL placeholder bound to the
/// viewing user's id, or NULL for anonymous viewers. Pair with `POST_VIEW_FROM`.
pub(super) fn post_view_columns(viewer: &str) -> String {
    format!(
        r#"SELECT p.id AS id, p.author_id AS author_id, p.content AS content, p.caption AS caption,
                  p.image AS image, p.video AS video, p.reel_video_id AS reel_video_id,
                  p.post_type AS post_type, p.created_at AS created_at, p.updated_at AS updated_at,
                  p.is_active AS is_active,
                  u.username AS author_username,
                  (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
                  (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.is_active = 1) AS comments_count,
                  (SELECT COUNT(*) FROM saves s WHERE s.post_id = p.id) AS saves_count,
                  (SELECT COUNT(*) FROM shares sh WHERE sh.post_id = p.id) AS shares_count,
                  EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = {viewer}) AS viewer_has_liked,
                  EXISTS(SELECT 1 FROM saves s WHERE s.post_id = p.id AND s.user_id = {viewer}) AS viewer_has_saved"#
    )
}

pub(super) const POST_VIEW_FROM: &str = "FROM posts p JOIN users u ON u.id = p.author_id";

pub(super) const COMMENT_VIEW_SELECT: &str = r#"SELECT c.id, c.author_id, c.post_id, c.content, c.parent_id,
              c.created_at, c.updated_at, c.is_active,
              u.username,
              (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = c.id),
              (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id AND r.is_active = 1)
       FROM comments c
       JOIN users u ON u.id = c.author_id"#;

pub(super) const NOTIFICATION_SELECT: &str = r#"SELECT n.id, n.recipient_id, n.sender_id, u.username,
              n.notification_type, n.message, n.post_id, n.is_read, n.created_at
       FROM notifications n
       JOIN users u ON u.id = n.sender_id"#;

/// Timestamps are fixed-width RFC 3339 so text ordering matches time ordering.
pub(super) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// True for a UNIQUE index violation (not CHECK or FOREIGN KEY failures).
pub(super) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Author of an active post, or `NotFound`.
pub(super) fn active_post_author(conn: &SqliteConnection, post_id: i64) -> StoreResult<i64> {
    let author = conn
        .query_row(
            "SELECT author_id FROM posts WHERE id = ?1 AND is_active = 1",
            params![post_id],
            |row| row.get(0),
        )
        .optional()?;
    author.ok_or_else(|| AppError::not_found(format!("post {}", post_id)).into())
}

pub(super) fn count(conn: &SqliteConnection, sql: &str, id: i64) -> StoreResult<i64> {
    Ok(conn.query_row(sql, params![id], |row| row.get(0))?)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56.000000Z")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

pub(super) fn datetime_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(AppError::Store(format!("invalid timestamp '{}'", raw))),
        )
    })
}

fn enum_at<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = AppError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: AppError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(super) fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: datetime_at(row, 4)?,
    })
}

pub(super) fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        caption: row.get(3)?,
        image: row.get(4)?,
        video: row.get(5)?,
        reel_video_id: row.get(6)?,
        post_type: enum_at::<PostType>(row, 7)?,
        created_at: datetime_at(row, 8)?,
        updated_at: datetime_at(row, 9)?,
        is_active: row.get(10)?,
    })
}

pub(super) fn post_view_from_row(row: &Row) -> rusqlite::Result<PostView> {
    let post = post_from_row(row)?;
    let embed_url = post.youtube_embed_url();
    let thumbnail_url = post.youtube_thumbnail_url();
    Ok(PostView {
        post,
        author_username: row.get(11)?,
        likes_count: row.get(12)?,
        comments_count: row.get(13)?,
        saves_count: row.get(14)?,
        shares_count: row.get(15)?,
        viewer_has_liked: row.get(16)?,
        viewer_has_saved: row.get(17)?,
        embed_url,
        thumbnail_url,
    })
}

pub(super) fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        author_id: row.get(1)?,
        post_id: row.get(2)?,
        content: row.get(3)?,
        parent_id: row.get(4)?,
        created_at: datetime_at(row, 5)?,
        updated_at: datetime_at(row, 6)?,
        is_active: row.get(7)?,
    })
}

pub(super) fn comment_view_from_row(row: &Row) -> rusqlite::Result<CommentView> {
    Ok(CommentView {
        comment: comment_from_row(row)?,
        author_username: row.get(8)?,
        likes_count: row.get(9)?,
        replies_count: row.get(10)?,
    })
}

pub(super) fn like_from_row(row: &Row) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        created_at: datetime_at(row, 3)?,
    })
}

pub(super) fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_username: row.get(3)?,
        notification_type: enum_at::<NotificationType>(row, 4)?,
        message: row.get(5)?,
        post_id: row.get(6)?,
        is_read: row.get(7)?,
        created_at: datetime_at(row, 8)?,
    })
}
