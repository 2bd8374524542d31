use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, Like, NotificationType, Post, PostView, ValidPost,
};

use super::notifications::notify;
use super::repository::{
    active_post_author, comment_from_row, comment_view_from_row, count, like_from_row, now,
    post_from_row, post_view_columns, post_view_from_row, Repository, StoreResult, COMMENT_SELECT,
    COMMENT_VIEW_SELECT, POST_SELECT, POST_VIEW_FROM,
};

/// Loads a post and checks that `actor` owns it.
fn owned_post(conn: &rusqlite::Connection, actor_id: i64, post_id: i64) -> StoreResult<Post> {
    let post = conn
        .query_row(
            &format!("{POST_SELECT} WHERE id = ?1 AND is_active = 1"),
            params![post_id],
            post_from_row,
        )
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;
    if post.author_id != actor_id {
        return Err(AppError::invalid("only the author can change this post").into());
    }
    Ok(post)
}

fn comment_view(conn: &rusqlite::Connection, comment_id: i64) -> StoreResult<CommentView> {
    Ok(conn.query_row(
        &format!("{COMMENT_VIEW_SELECT} WHERE c.id = ?1"),
        params![comment_id],
        comment_view_from_row,
    )?)
}

impl Repository {
    // Post operations

    pub async fn insert_post(&self, author_id: i64, post: ValidPost) -> Result<Post> {
        let post = self
            .conn
            .call(move |conn| {
                let at = now();
                conn.execute(
                    r#"INSERT INTO posts (author_id, content, caption, image, video, reel_video_id, post_type, created_at, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)"#,
                    params![
                        author_id,
                        post.content,
                        post.caption,
                        post.image,
                        post.video,
                        post.reel_video_id,
                        post.post_type.as_str(),
                        at,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let post = conn.query_row(
                    &format!("{POST_SELECT} WHERE id = ?1"),
                    params![id],
                    post_from_row,
                )?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    pub async fn update_post(&self, actor_id: i64, post_id: i64, post: ValidPost) -> Result<Post> {
        let post = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                owned_post(&tx, actor_id, post_id)?;
                tx.execute(
                    r#"UPDATE posts SET content = ?1, caption = ?2, image = ?3, video = ?4,
                              reel_video_id = ?5, post_type = ?6, updated_at = ?7
                       WHERE id = ?8"#,
                    params![
                        post.content,
                        post.caption,
                        post.image,
                        post.video,
                        post.reel_video_id,
                        post.post_type.as_str(),
                        now(),
                        post_id,
                    ],
                )?;
                let post = tx.query_row(
                    &format!("{POST_SELECT} WHERE id = ?1"),
                    params![post_id],
                    post_from_row,
                )?;
                tx.commit()?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    /// Soft delete. Comments and edges keep their rows; read paths hide them
    /// through the post's active flag.
    pub async fn deactivate_post(&self, actor_id: i64, post_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                owned_post(&tx, actor_id, post_id)?;
                tx.execute(
                    "UPDATE posts SET is_active = 0, updated_at = ?1 WHERE id = ?2",
                    params![now(), post_id],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Direct lookup, ignoring the active flag.
    pub async fn post_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let post = self
            .conn
            .call(move |conn| {
                let post = conn
                    .query_row(
                        &format!("{POST_SELECT} WHERE id = ?1"),
                        params![post_id],
                        post_from_row,
                    )
                    .optional()?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    pub async fn post_view(&self, post_id: i64, viewer: Option<i64>) -> Result<Option<PostView>> {
        let view = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "{} {POST_VIEW_FROM} WHERE p.id = ?1 AND p.is_active = 1",
                    post_view_columns("?2")
                );
                let view = conn
                    .query_row(&sql, params![post_id, viewer], post_view_from_row)
                    .optional()?;
                Ok(view)
            })
            .await?;
        Ok(view)
    }

    /// Like edges of a post, ignoring the post's active flag.
    pub async fn likes_of_post(&self, post_id: i64) -> Result<Vec<Like>> {
        let likes = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, post_id, created_at FROM likes WHERE post_id = ?1 ORDER BY created_at DESC, id DESC",
                )?;
                let likes = stmt
                    .query_map(params![post_id], like_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(likes)
            })
            .await?;
        Ok(likes)
    }

    // Comment operations

    /// Inserts a comment and fans out a `comment` notification to the post
    /// author. Returns the new comment with the post's comment count.
    pub async fn insert_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: String,
        parent_id: Option<i64>,
    ) -> Result<(CommentView, i64)> {
        let added = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let post_author = active_post_author(&tx, post_id)?;

                if let Some(parent_id) = parent_id {
                    let parent_post: i64 = tx
                        .query_row(
                            "SELECT post_id FROM comments WHERE id = ?1 AND is_active = 1",
                            params![parent_id],
                            |row| row.get(0),
                        )
                        .optional()?
                        .ok_or_else(|| AppError::not_found(format!("comment {}", parent_id)))?;
                    if parent_post != post_id {
                        return Err(AppError::validation(
                            "parent_id",
                            "Replies must belong to the same post as their parent.",
                        )
                        .into());
                    }
                }

                let at = now();
                tx.execute(
                    r#"INSERT INTO comments (author_id, post_id, content, parent_id, created_at, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?5)"#,
                    params![author_id, post_id, content, parent_id, at],
                )?;
                let comment_id = tx.last_insert_rowid();

                notify(
                    &tx,
                    NotificationType::Comment,
                    post_author,
                    author_id,
                    Some(post_id),
                )?;

                let view = comment_view(&tx, comment_id)?;
                let comments_count = count(
                    &tx,
                    "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND is_active = 1",
                    post_id,
                )?;
                tx.commit()?;
                Ok((view, comments_count))
            })
            .await?;
        Ok(added)
    }

    pub async fn deactivate_comment(&self, actor_id: i64, comment_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let author: i64 = tx
                    .query_row(
                        "SELECT author_id FROM comments WHERE id = ?1 AND is_active = 1",
                        params![comment_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or_else(|| AppError::not_found(format!("comment {}", comment_id)))?;
                if author != actor_id {
                    return Err(AppError::invalid("only the author can delete this comment").into());
                }
                tx.execute(
                    "UPDATE comments SET is_active = 0, updated_at = ?1 WHERE id = ?2",
                    params![now(), comment_id],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Direct lookup, ignoring active flags on the comment and its post.
    pub async fn comment_by_id(&self, comment_id: i64) -> Result<Option<Comment>> {
        let comment = self
            .conn
            .call(move |conn| {
                let comment = conn
                    .query_row(
                        &format!("{COMMENT_SELECT} WHERE id = ?1"),
                        params![comment_id],
                        comment_from_row,
                    )
                    .optional()?;
                Ok(comment)
            })
            .await?;
        Ok(comment)
    }

    /// Active comments of an active post, oldest first.
    pub async fn comments_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let comments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"{COMMENT_VIEW_SELECT}
                       JOIN posts p ON p.id = c.post_id
                       WHERE c.post_id = ?1 AND c.is_active = 1 AND p.is_active = 1
                       ORDER BY c.created_at, c.id"#
                ))?;
                let comments = stmt
                    .query_map(params![post_id], comment_view_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }

    /// A user's most recent active comments on active posts.
    pub async fn comments_by_author(&self, author_id: i64, limit: u32) -> Result<Vec<CommentView>> {
        let comments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"{COMMENT_VIEW_SELECT}
                       JOIN posts p ON p.id = c.post_id
                       WHERE c.author_id = ?1 AND c.is_active = 1 AND p.is_active = 1
                       ORDER BY c.created_at DESC, c.id DESC
                       LIMIT ?2"#
                ))?;
                let comments = stmt
                    .query_map(params![author_id, limit], comment_view_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }
}
