use rusqlite::types::Value;
use rusqlite::params_from_iter;

use crate::error::Result;
use crate::models::{Page, PageWindow, PostView};

use super::repository::{post_view_columns, post_view_from_row, Repository, POST_VIEW_FROM};

/// Which active posts a feed draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Every active post.
    All,
    /// Posts by `viewer` or by anyone `viewer` follows.
    FollowedBy(i64),
    Reels,
    Author(i64),
    /// Case-insensitive substring over content and author names.
    Matching(String),
    /// Posts `user` has liked, most recent like first.
    LikedBy(i64),
    /// Posts `user` has saved, most recent save first.
    SavedBy(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    Newest,
    /// likes + comments, then newest.
    Engagement,
    /// Order of the scoping edge (likes/saves), newest edge first.
    EdgeNewest,
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl FeedScope {
    /// WHERE clause over `p` (posts) and `u` (authors), with its positional
    /// parameters starting at ?1. Also returns the extra projection used by
    /// `FeedOrder::EdgeNewest`.
    fn clause(&self) -> (String, Vec<Value>, &'static str) {
        match self {
            FeedScope::All => ("p.is_active = 1".to_string(), vec![], "NULL"),
            FeedScope::FollowedBy(viewer) => (
                r#"p.is_active = 1 AND (p.author_id = ?1
                     OR p.author_id IN (SELECT f.following_id FROM follows f WHERE f.follower_id = ?1))"#
                    .to_string(),
                vec![Value::Integer(*viewer)],
                "NULL",
            ),
            FeedScope::Reels => (
                "p.is_active = 1 AND p.post_type = 'reel'".to_string(),
                vec![],
                "NULL",
            ),
            FeedScope::Author(author) => (
                "p.is_active = 1 AND p.author_id = ?1".to_string(),
                vec![Value::Integer(*author)],
                "NULL",
            ),
            FeedScope::Matching(query) if query.trim().is_empty() => {
                ("p.is_active = 1".to_string(), vec![], "NULL")
            }
            FeedScope::Matching(query) => (
                r#"p.is_active = 1 AND (p.content LIKE ?1 ESCAPE '\'
                     OR u.username LIKE ?1 ESCAPE '\'
                     OR u.first_name LIKE ?1 ESCAPE '\'
                     OR u.last_name LIKE ?1 ESCAPE '\')"#
                    .to_string(),
                vec![Value::Text(escape_like(query.trim()))],
                "NULL",
            ),
            FeedScope::LikedBy(user) => (
                "p.is_active = 1 AND EXISTS(SELECT 1 FROM likes e WHERE e.post_id = p.id AND e.user_id = ?1)"
                    .to_string(),
                vec![Value::Integer(*user)],
                "(SELECT e.id FROM likes e WHERE e.post_id = p.id AND e.user_id = ?1)",
            ),
            FeedScope::SavedBy(user) => (
                "p.is_active = 1 AND EXISTS(SELECT 1 FROM saves e WHERE e.post_id = p.id AND e.user_id = ?1)"
                    .to_string(),
                vec![Value::Integer(*user)],
                "(SELECT e.id FROM saves e WHERE e.post_id = p.id AND e.user_id = ?1)",
            ),
        }
    }
}

impl FeedOrder {
    fn clause(&self) -> &'static str {
        match self {
            FeedOrder::Newest => "created_at DESC, id DESC",
            FeedOrder::Engagement => "likes_count + comments_count DESC, created_at DESC, id DESC",
            FeedOrder::EdgeNewest => "edge_key DESC, created_at DESC, id DESC",
        }
    }
}

fn annotated_query(scope: &FeedScope, order: FeedOrder) -> (String, String, Vec<Value>) {
    let (filter, params, edge_key) = scope.clause();
    let viewer = format!("?{}", params.len() + 1);
    let limit = format!("?{}", params.len() + 2);
    let offset = format!("?{}", params.len() + 3);

    let count_sql = format!("SELECT COUNT(*) {POST_VIEW_FROM} WHERE {filter}");
    let select_sql = format!(
        r#"SELECT * FROM (
               {columns}, {edge_key} AS edge_key
               {POST_VIEW_FROM}
               WHERE {filter}
           )
           ORDER BY {order}
           LIMIT {limit} OFFSET {offset}"#,
        columns = post_view_columns(&viewer),
        order = order.clause(),
    );
    (count_sql, select_sql, params)
}

impl Repository {
    /// One page of annotated posts. `viewer` drives the per-viewer flags only;
    /// scoping comes from `scope`.
    pub async fn feed_page(
        &self,
        scope: FeedScope,
        order: FeedOrder,
        page: u32,
        per_page: u32,
        viewer: Option<i64>,
    ) -> Result<Page<PostView>> {
        let page = self
            .conn
            .call(move |conn| {
                let (count_sql, select_sql, params) = annotated_query(&scope, order);

                let total: u64 = conn.query_row(&count_sql, params_from_iter(params.iter()), |row| {
                    row.get(0)
                })?;
                let window = PageWindow::resolve(page, per_page, total);

                let mut bound = params;
                bound.push(viewer.map(Value::Integer).unwrap_or(Value::Null));
                bound.push(Value::Integer(window.limit as i64));
                bound.push(Value::Integer(window.offset as i64));

                let mut stmt = conn.prepare(&select_sql)?;
                let items = stmt
                    .query_map(params_from_iter(bound.iter()), post_view_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Page::new(items, window, total))
            })
            .await?;
        Ok(page)
    }

    /// Up to `limit` annotated posts without paging. The flag reports whether
    /// more rows matched than were returned.
    pub async fn feed_capped(
        &self,
        scope: FeedScope,
        order: FeedOrder,
        limit: u32,
        viewer: Option<i64>,
    ) -> Result<(Vec<PostView>, bool)> {
        let result = self
            .conn
            .call(move |conn| {
                let (_, select_sql, mut bound) = annotated_query(&scope, order);
                bound.push(viewer.map(Value::Integer).unwrap_or(Value::Null));
                // One extra row tells us whether the cap cut anything off.
                bound.push(Value::Integer(limit as i64 + 1));
                bound.push(Value::Integer(0));

                let mut stmt = conn.prepare(&select_sql)?;
                let mut items = stmt
                    .query_map(params_from_iter(bound.iter()), post_view_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let truncated = items.len() > limit as usize;
                items.truncate(limit as usize);
                Ok((items, truncated))
            })
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(escape_like("50%_off"), "%50\\%\\_off%");
        assert_eq!(escape_like("bob"), "%bob%");
    }

    #[test]
    fn viewer_placeholder_follows_scope_params() {
        let (count_sql, select_sql, params) =
            annotated_query(&FeedScope::Author(7), FeedOrder::Newest);
        assert_eq!(params.len(), 1);
        assert!(!count_sql.contains("?2"));
        assert!(select_sql.contains("l.user_id = ?2"));
        assert!(select_sql.contains("LIMIT ?3 OFFSET ?4"));

        let (_, select_sql, params) = annotated_query(&FeedScope::All, FeedOrder::Engagement);
        assert!(params.is_empty());
        assert!(select_sql.contains("l.user_id = ?1"));
        assert!(select_sql.contains("likes_count + comments_count DESC"));
    }
}
