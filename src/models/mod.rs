mod comment;
mod interaction;
mod notification;
mod page;
mod post;
mod user;

pub use comment::{
    build_threads, validate_comment, AddedComment, Comment, CommentThread, CommentView,
    PostDetail, MAX_COMMENT_CHARS,
};
pub use interaction::{Like, ShareType, Shared, Toggle, ToggleState, MAX_SHARED_TO_CHARS};
pub use notification::{Notification, NotificationType};
pub use page::{Page, PageWindow};
pub use post::{
    CreatedPost, Deleted, Post, PostDraft, PostType, PostView, Redirect, ValidPost,
    MAX_CAPTION_CHARS, MAX_CONTENT_CHARS,
};
pub use user::{Activity, FollowEntry, NewUser, Profile, User};
