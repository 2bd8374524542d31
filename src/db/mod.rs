mod content;
mod feed;
mod graph;
mod interactions;
mod notifications;
mod repository;
mod schema;

pub use feed::{FeedOrder, FeedScope};
pub use repository::Repository;
