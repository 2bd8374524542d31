use rusqlite::{params, Connection as SqliteConnection, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::{NotificationType, ShareType, Shared, Toggle, ToggleState};

use super::notifications::{notify, retract};
use super::repository::{
    active_post_author, count, is_unique_violation, now, Repository, StoreResult,
};

/// A unique-constrained edge table between an actor and a target.
pub(super) struct Edge {
    pub table: &'static str,
    pub actor: &'static str,
    pub target: &'static str,
}

pub(super) const LIKE: Edge = Edge {
    table: "likes",
    actor: "user_id",
    target: "post_id",
};

pub(super) const SAVE: Edge = Edge {
    table: "saves",
    actor: "user_id",
    target: "post_id",
};

pub(super) const COMMENT_LIKE: Edge = Edge {
    table: "comment_likes",
    actor: "user_id",
    target: "comment_id",
};

pub(super) const FOLLOW: Edge = Edge {
    table: "follows",
    actor: "follower_id",
    target: "following_id",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EdgeChange {
    Added,
    Removed,
    /// Lost an insert race against an identical edge; already on.
    AlreadyPresent,
}

impl EdgeChange {
    pub fn state(self) -> ToggleState {
        match self {
            EdgeChange::Added | EdgeChange::AlreadyPresent => ToggleState::On,
            EdgeChange::Removed => ToggleState::Off,
        }
    }
}

impl Edge {
    /// Deletes the edge if present, inserts it otherwise.
    pub fn toggle(&self, conn: &SqliteConnection, actor_id: i64, target_id: i64) -> StoreResult<EdgeChange> {
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                self.table, self.actor, self.target
            ),
            params![actor_id, target_id],
        )?;
        if removed > 0 {
            return Ok(EdgeChange::Removed);
        }

        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, created_at) VALUES (?1, ?2, ?3)",
                self.table, self.actor, self.target
            ),
            params![actor_id, target_id, now()],
        );
        match inserted {
            Ok(_) => Ok(EdgeChange::Added),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(
                    "{} edge ({}, {}) already present, keeping it",
                    self.table,
                    actor_id,
                    target_id
                );
                Ok(EdgeChange::AlreadyPresent)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_for_target(&self, conn: &SqliteConnection, target_id: i64) -> StoreResult<i64> {
        count(
            conn,
            &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", self.table, self.target),
            target_id,
        )
    }

    pub fn exists(&self, conn: &SqliteConnection, actor_id: i64, target_id: i64) -> StoreResult<bool> {
        let found = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2",
                    self.table, self.actor, self.target
                ),
                params![actor_id, target_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl Repository {
    /// Flips the like edge. Liking notifies the post author; unliking
    /// withdraws that notification.
    pub async fn toggle_like(&self, actor_id: i64, post_id: i64) -> Result<Toggle> {
        let toggle = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let author_id = active_post_author(&tx, post_id)?;

                let change = LIKE.toggle(&tx, actor_id, post_id)?;
                match change {
                    EdgeChange::Added => {
                        notify(&tx, NotificationType::Like, author_id, actor_id, Some(post_id))?;
                    }
                    EdgeChange::Removed => {
                        retract(&tx, NotificationType::Like, author_id, actor_id, post_id)?;
                    }
                    EdgeChange::AlreadyPresent => {}
                }

                let count = LIKE.count_for_target(&tx, post_id)?;
                tx.commit()?;
                Ok(Toggle {
                    state: change.state(),
                    count,
                })
            })
            .await?;
        Ok(toggle)
    }

    pub async fn toggle_save(&self, actor_id: i64, post_id: i64) -> Result<Toggle> {
        let toggle = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                active_post_author(&tx, post_id)?;
                let change = SAVE.toggle(&tx, actor_id, post_id)?;
                let count = SAVE.count_for_target(&tx, post_id)?;
                tx.commit()?;
                Ok(Toggle {
                    state: change.state(),
                    count,
                })
            })
            .await?;
        Ok(toggle)
    }

    pub async fn toggle_comment_like(&self, actor_id: i64, comment_id: i64) -> Result<Toggle> {
        let toggle = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let visible = tx
                    .query_row(
                        r#"SELECT 1 FROM comments c JOIN posts p ON p.id = c.post_id
                           WHERE c.id = ?1 AND c.is_active = 1 AND p.is_active = 1"#,
                        params![comment_id],
                        |_| Ok(()),
                    )
                    .optional()?;
                if visible.is_none() {
                    return Err(AppError::not_found(format!("comment {}", comment_id)).into());
                }

                let change = COMMENT_LIKE.toggle(&tx, actor_id, comment_id)?;
                let count = COMMENT_LIKE.count_for_target(&tx, comment_id)?;
                tx.commit()?;
                Ok(Toggle {
                    state: change.state(),
                    count,
                })
            })
            .await?;
        Ok(toggle)
    }

    /// Appends a share row; every share is a new row and a new notification.
    pub async fn insert_share(
        &self,
        actor_id: i64,
        post_id: i64,
        share_type: ShareType,
        shared_to: String,
    ) -> Result<Shared> {
        let shared = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let author_id = active_post_author(&tx, post_id)?;

                tx.execute(
                    "INSERT INTO shares (user_id, post_id, share_type, shared_to, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![actor_id, post_id, share_type.as_str(), shared_to, now()],
                )?;
                let share_id = tx.last_insert_rowid();
                notify(&tx, NotificationType::Share, author_id, actor_id, Some(post_id))?;

                let shares_count = count(&tx, "SELECT COUNT(*) FROM shares WHERE post_id = ?1", post_id)?;
                tx.commit()?;
                Ok(Shared {
                    shares_count,
                    share_id,
                })
            })
            .await?;
        Ok(shared)
    }

    pub async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let liked = self
            .conn
            .call(move |conn| LIKE.exists(conn, user_id, post_id))
            .await?;
        Ok(liked)
    }

    pub async fn has_saved(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let saved = self
            .conn
            .call(move |conn| SAVE.exists(conn, user_id, post_id))
            .await?;
        Ok(saved)
    }
}
