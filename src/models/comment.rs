use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};

pub const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
    pub likes_count: i64,
    pub replies_count: i64,
}

/// A top-level comment with every reply beneath it, flattened in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// One post with its visible discussion.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: super::PostView,
    pub comments: Vec<CommentThread>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddedComment {
    pub comment: CommentView,
    pub comments_count: i64,
}

/// Rejects blank or oversized comment text. Accepted text is stored as written.
pub fn validate_comment(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::validation("content", "Comment cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::validation(
            "content",
            format!("Comment is limited to {} characters.", MAX_COMMENT_CHARS),
        ));
    }
    Ok(())
}

/// Groups comments of one post into threads. Parent links form a tree; replies
/// of replies are attached to their top-level ancestor.
pub fn build_threads(comments: Vec<CommentView>) -> Vec<CommentThread> {
    use std::collections::HashMap;

    let index: HashMap<i64, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.comment.id, i))
        .collect();

    let root_of = |mut i: usize| -> Option<usize> {
        // Bounded walk: a well-formed tree never revisits a node.
        for _ in 0..comments.len() {
            match comments[i].comment.parent_id {
                None => return Some(i),
                Some(parent) => i = *index.get(&parent)?,
            }
        }
        None
    };

    let mut roots: Vec<usize> = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..comments.len() {
        match root_of(i) {
            Some(root) if root == i => roots.push(i),
            Some(root) => children.entry(root).or_default().push(i),
            // Orphaned reply (parent hidden or missing)
            None => {}
        }
    }

    let by_created = |a: &usize, b: &usize| {
        let (ca, cb) = (&comments[*a].comment, &comments[*b].comment);
        ca.created_at.cmp(&cb.created_at).then(ca.id.cmp(&cb.id))
    };
    roots.sort_by(by_created);

    roots
        .iter()
        .map(|root| {
            let mut replies = children.remove(root).unwrap_or_default();
            replies.sort_by(by_created);
            CommentThread {
                comment: comments[*root].clone(),
                replies: replies.into_iter().map(|i| comments[i].clone()).collect(),
            }
        })
        .collect()
}
