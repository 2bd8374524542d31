use rusqlite::{params, Connection as SqliteConnection};

use crate::error::Result;
use crate::models::{Notification, NotificationType, Page, PageWindow};

use super::repository::{notification_from_row, now, Repository, StoreResult, NOTIFICATION_SELECT};

/// Records a notification for `recipient`. Self-notifications are suppressed.
/// Returns the new row id when one was written.
pub(super) fn notify(
    conn: &SqliteConnection,
    kind: NotificationType,
    recipient_id: i64,
    sender_id: i64,
    post_id: Option<i64>,
) -> StoreResult<Option<i64>> {
    if recipient_id == sender_id {
        return Ok(None);
    }

    let sender: String = conn.query_row(
        "SELECT username FROM users WHERE id = ?1",
        params![sender_id],
        |row| row.get(0),
    )?;
    conn.execute(
        r#"INSERT INTO notifications (recipient_id, sender_id, notification_type, message, post_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        params![
            recipient_id,
            sender_id,
            kind.as_str(),
            kind.message(&sender),
            post_id,
            now(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!("{} notification {} -> user {}", kind.as_str(), id, recipient_id);
    Ok(Some(id))
}

/// Withdraws the notification matching (recipient, sender, kind, post).
/// Deletes at most one row; a missing row is not an error. Kinds that are not
/// retractable are left alone.
pub(super) fn retract(
    conn: &SqliteConnection,
    kind: NotificationType,
    recipient_id: i64,
    sender_id: i64,
    post_id: i64,
) -> StoreResult<usize> {
    if !kind.is_retractable() {
        return Ok(0);
    }
    let removed = conn.execute(
        r#"DELETE FROM notifications WHERE id IN (
               SELECT id FROM notifications
               WHERE recipient_id = ?1 AND sender_id = ?2 AND notification_type = ?3 AND post_id = ?4
               ORDER BY id DESC
               LIMIT 1
           )"#,
        params![recipient_id, sender_id, kind.as_str(), post_id],
    )?;
    Ok(removed)
}

impl Repository {
    /// Marks every unread notification of `recipient` as read, then returns
    /// the requested page, newest first.
    pub async fn read_notifications(
        &self,
        recipient_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Notification>> {
        let page = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
                    params![recipient_id],
                )?;

                let total: u64 = tx.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
                    params![recipient_id],
                    |row| row.get(0),
                )?;
                let window = PageWindow::resolve(page, per_page, total);

                let items = {
                    let mut stmt = tx.prepare(&format!(
                        r#"{NOTIFICATION_SELECT}
                           WHERE n.recipient_id = ?1
                           ORDER BY n.created_at DESC, n.id DESC
                           LIMIT ?2 OFFSET ?3"#
                    ))?;
                    let items = stmt
                        .query_map(
                            params![recipient_id, window.limit, window.offset],
                            notification_from_row,
                        )?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    items
                };
                tx.commit()?;
                Ok(Page::new(items, window, total))
            })
            .await?;
        Ok(page)
    }

    pub async fn unread_notification_count(&self, recipient_id: i64) -> Result<i64> {
        let count = self
            .conn
            .call(move |conn| {
                let count = conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
                    params![recipient_id],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }
}
