mod composer;

pub use composer::{
    FeedComposer, FeedKind, ReelFeed, ACTIVITY_LIMIT, EXPLORE_PAGE_SIZE, HOME_PAGE_SIZE,
    PROFILE_PAGE_SIZE, SEARCH_PAGE_SIZE,
};
