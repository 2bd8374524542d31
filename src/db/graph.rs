use std::collections::HashSet;

use rusqlite::params;

use crate::error::{AppError, Result};
use crate::models::{FollowEntry, NotificationType, Page, PageWindow, Toggle};

use super::interactions::{EdgeChange, FOLLOW};
use super::notifications::notify;
use super::repository::{count, datetime_at, user_from_row, Repository};

#[derive(Debug, Clone, Copy)]
enum Direction {
    Followers,
    Following,
}

impl Repository {
    /// Follows or unfollows `target_id`. A new follow notifies the target;
    /// unfollowing leaves that notification in place.
    pub async fn toggle_follow(&self, actor_id: i64, target_id: i64) -> Result<Toggle> {
        if actor_id == target_id {
            return Err(AppError::invalid("You cannot follow yourself"));
        }

        let toggle = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let exists = count(&tx, "SELECT COUNT(*) FROM users WHERE id = ?1", target_id)?;
                if exists == 0 {
                    return Err(AppError::not_found(format!("user {}", target_id)).into());
                }

                let change = FOLLOW.toggle(&tx, actor_id, target_id)?;
                if change == EdgeChange::Added {
                    notify(&tx, NotificationType::Follow, target_id, actor_id, None)?;
                }

                let count = FOLLOW.count_for_target(&tx, target_id)?;
                tx.commit()?;
                Ok(Toggle {
                    state: change.state(),
                    count,
                })
            })
            .await?;
        Ok(toggle)
    }

    pub async fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let following = self
            .conn
            .call(move |conn| FOLLOW.exists(conn, follower_id, following_id))
            .await?;
        Ok(following)
    }

    /// Ids of every user `user_id` follows.
    pub async fn following_of(&self, user_id: i64) -> Result<HashSet<i64>> {
        let ids = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT following_id FROM follows WHERE follower_id = ?1")?;
                let ids = stmt
                    .query_map(params![user_id], |row| row.get(0))?
                    .collect::<std::result::Result<HashSet<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    pub async fn followers_count(&self, user_id: i64) -> Result<i64> {
        let n = self
            .conn
            .call(move |conn| FOLLOW.count_for_target(conn, user_id))
            .await?;
        Ok(n)
    }

    pub async fn following_count(&self, user_id: i64) -> Result<i64> {
        let n = self
            .conn
            .call(move |conn| count(conn, "SELECT COUNT(*) FROM follows WHERE follower_id = ?1", user_id))
            .await?;
        Ok(n)
    }

    pub async fn active_posts_count(&self, user_id: i64) -> Result<i64> {
        let n = self
            .conn
            .call(move |conn| {
                count(
                    conn,
                    "SELECT COUNT(*) FROM posts WHERE author_id = ?1 AND is_active = 1",
                    user_id,
                )
            })
            .await?;
        Ok(n)
    }

    pub async fn followers_page(&self, user_id: i64, page: u32, per_page: u32) -> Result<Page<FollowEntry>> {
        self.follow_page(Direction::Followers, user_id, page, per_page).await
    }

    pub async fn following_page(&self, user_id: i64, page: u32, per_page: u32) -> Result<Page<FollowEntry>> {
        self.follow_page(Direction::Following, user_id, page, per_page).await
    }

    async fn follow_page(
        &self,
        direction: Direction,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<FollowEntry>> {
        // (column matching `user_id`, column naming the listed user)
        let (anchor, listed) = match direction {
            Direction::Followers => ("following_id", "follower_id"),
            Direction::Following => ("follower_id", "following_id"),
        };

        let page = self
            .conn
            .call(move |conn| {
                let total: u64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM follows WHERE {anchor} = ?1"),
                    params![user_id],
                    |row| row.get(0),
                )?;
                let window = PageWindow::resolve(page, per_page, total);

                let mut stmt = conn.prepare(&format!(
                    r#"SELECT u.id, u.username, u.first_name, u.last_name, u.created_at, f.created_at
                       FROM follows f
                       JOIN users u ON u.id = f.{listed}
                       WHERE f.{anchor} = ?1
                       ORDER BY f.created_at DESC, f.id DESC
                       LIMIT ?2 OFFSET ?3"#
                ))?;
                let items = stmt
                    .query_map(params![user_id, window.limit, window.offset], |row| {
                        Ok(FollowEntry {
                            user: user_from_row(row)?,
                            followed_at: datetime_at(row, 5)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Page::new(items, window, total))
            })
            .await?;
        Ok(page)
    }
}
