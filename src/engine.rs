use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::feed::{FeedComposer, FeedKind, ReelFeed};
use crate::models::{
    build_threads, validate_comment, Activity, AddedComment, CreatedPost, Deleted, FollowEntry,
    NewUser, Notification, Page, PostDetail, PostDraft, PostView, Profile, Redirect, ShareType, Shared,
    Toggle, User, MAX_SHARED_TO_CHARS,
};

pub const NOTIFICATIONS_PAGE_SIZE: u32 = 20;
pub const FOLLOW_LIST_PAGE_SIZE: u32 = 20;

/// Entry point for every social operation. Actors are user ids the request
/// layer has already authenticated; viewers are optional.
pub struct Engine {
    repository: Repository,
    reel_feed_limit: u32,
}

impl Engine {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        tracing::info!("Opened store at {}", config.db_path);
        Ok(Self {
            repository,
            reel_feed_limit: config.reel_feed_limit,
        })
    }

    /// Throwaway engine over an in-memory store.
    pub async fn in_memory(reel_feed_limit: u32) -> Result<Self> {
        Ok(Self {
            repository: Repository::open_in_memory().await?,
            reel_feed_limit,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn feeds(&self) -> FeedComposer<'_> {
        FeedComposer::new(&self.repository)
    }

    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let user = self.repository.register_user(user).await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn user(&self, username: &str) -> Result<User> {
        self.repository
            .user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user '{}'", username)))
    }

    // Interactions

    pub async fn toggle_like(&self, actor_id: i64, post_id: i64) -> Result<Toggle> {
        let toggle = self.repository.toggle_like(actor_id, post_id).await?;
        tracing::debug!("user {} like post {}: {:?}", actor_id, post_id, toggle.state);
        Ok(toggle)
    }

    pub async fn toggle_save(&self, actor_id: i64, post_id: i64) -> Result<Toggle> {
        let toggle = self.repository.toggle_save(actor_id, post_id).await?;
        tracing::debug!("user {} save post {}: {:?}", actor_id, post_id, toggle.state);
        Ok(toggle)
    }

    pub async fn toggle_follow(&self, actor_id: i64, target_username: &str) -> Result<Toggle> {
        let target = self.user(target_username).await?;
        let toggle = self.repository.toggle_follow(actor_id, target.id).await?;
        tracing::debug!("user {} follow {}: {:?}", actor_id, target.username, toggle.state);
        Ok(toggle)
    }

    pub async fn toggle_comment_like(&self, actor_id: i64, comment_id: i64) -> Result<Toggle> {
        let toggle = self.repository.toggle_comment_like(actor_id, comment_id).await?;
        tracing::debug!("user {} like comment {}: {:?}", actor_id, comment_id, toggle.state);
        Ok(toggle)
    }

    /// Records a share. `share_type` arrives as submitted; blank means link.
    pub async fn share_post(
        &self,
        actor_id: i64,
        post_id: i64,
        share_type: &str,
        shared_to: &str,
    ) -> Result<Shared> {
        let share_type: ShareType = share_type.trim().parse()?;
        if shared_to.chars().count() > MAX_SHARED_TO_CHARS {
            return Err(AppError::validation(
                "shared_to",
                format!("Share target is limited to {} characters.", MAX_SHARED_TO_CHARS),
            ));
        }
        let shared = self
            .repository
            .insert_share(actor_id, post_id, share_type, shared_to.to_string())
            .await?;
        tracing::debug!("user {} shared post {} ({})", actor_id, post_id, share_type.as_str());
        Ok(shared)
    }

    // Content

    pub async fn create_post(&self, author_id: i64, draft: PostDraft) -> Result<CreatedPost> {
        let valid = draft.validate()?;
        let post = self.repository.insert_post(author_id, valid).await?;
        tracing::info!("user {} created {} post {}", author_id, post.post_type, post.id);
        Ok(CreatedPost {
            post_id: post.id,
            redirect: Redirect::after_creating(post.post_type),
        })
    }

    pub async fn update_post(&self, actor_id: i64, post_id: i64, draft: PostDraft) -> Result<CreatedPost> {
        let valid = draft.validate()?;
        let post = self.repository.update_post(actor_id, post_id, valid).await?;
        tracing::info!("user {} updated post {}", actor_id, post.id);
        Ok(CreatedPost {
            post_id: post.id,
            redirect: Redirect::after_creating(post.post_type),
        })
    }

    pub async fn deactivate_post(&self, actor_id: i64, post_id: i64) -> Result<Deleted> {
        self.repository.deactivate_post(actor_id, post_id).await?;
        tracing::info!("user {} deactivated post {}", actor_id, post_id);
        Ok(Deleted::new())
    }

    pub async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<AddedComment> {
        validate_comment(content)?;
        let (comment, comments_count) = self
            .repository
            .insert_comment(author_id, post_id, content.to_string(), parent_id)
            .await?;
        tracing::debug!("user {} commented on post {}", author_id, post_id);
        Ok(AddedComment {
            comment,
            comments_count,
        })
    }

    pub async fn deactivate_comment(&self, actor_id: i64, comment_id: i64) -> Result<Deleted> {
        self.repository.deactivate_comment(actor_id, comment_id).await?;
        tracing::info!("user {} deactivated comment {}", actor_id, comment_id);
        Ok(Deleted::new())
    }

    pub async fn post_detail(&self, post_id: i64, viewer: Option<i64>) -> Result<PostDetail> {
        let post = self
            .repository
            .post_view(post_id, viewer)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;
        let comments = self.repository.comments_for_post(post_id).await?;
        Ok(PostDetail {
            post,
            comments: build_threads(comments),
        })
    }

    // Feeds

    pub async fn list_feed(&self, kind: &FeedKind, page: u32, viewer: Option<i64>) -> Result<Page<PostView>> {
        self.feeds().page(kind, page, viewer).await
    }

    pub async fn list_reels(&self, viewer: Option<i64>) -> Result<ReelFeed> {
        self.feeds().reels(self.reel_feed_limit, viewer).await
    }

    pub async fn activity(&self, user_id: i64) -> Result<Activity> {
        self.feeds().activity(user_id).await
    }

    // Graph

    pub async fn profile(&self, username: &str, viewer: Option<i64>) -> Result<Profile> {
        let user = self.user(username).await?;
        let is_own_profile = viewer == Some(user.id);
        let viewer_is_following = match viewer {
            Some(viewer) if !is_own_profile => self.repository.is_following(viewer, user.id).await?,
            _ => false,
        };

        Ok(Profile {
            posts_count: self.repository.active_posts_count(user.id).await?,
            followers_count: self.repository.followers_count(user.id).await?,
            following_count: self.repository.following_count(user.id).await?,
            viewer_is_following,
            is_own_profile,
            user,
        })
    }

    pub async fn followers(&self, username: &str, page: u32) -> Result<Page<FollowEntry>> {
        let user = self.user(username).await?;
        self.repository
            .followers_page(user.id, page, FOLLOW_LIST_PAGE_SIZE)
            .await
    }

    pub async fn following(&self, username: &str, page: u32) -> Result<Page<FollowEntry>> {
        let user = self.user(username).await?;
        self.repository
            .following_page(user.id, page, FOLLOW_LIST_PAGE_SIZE)
            .await
    }

    // Notifications

    /// Reading the list marks everything read, including items on other pages.
    pub async fn list_notifications(&self, recipient_id: i64, page: u32) -> Result<Page<Notification>> {
        self.repository
            .read_notifications(recipient_id, page, NOTIFICATIONS_PAGE_SIZE)
            .await
    }

    pub async fn unread_notification_count(&self, recipient_id: i64) -> Result<i64> {
        self.repository.unread_notification_count(recipient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationType, ToggleState};

    async fn engine_with(names: &[&str]) -> (Engine, Vec<i64>) {
        let engine = Engine::in_memory(200).await.unwrap();
        let mut ids = Vec::new();
        for name in names {
            ids.push(engine.register_user(NewUser::new(*name)).await.unwrap().id);
        }
        (engine, ids)
    }

    #[tokio::test]
    async fn reel_posts_store_the_video_id() {
        let (engine, ids) = engine_with(&["alice"]).await;
        let created = engine
            .create_post(ids[0], PostDraft::reel("https://youtu.be/HYo8tXAzSeI?t=3"))
            .await
            .unwrap();
        assert_eq!(created.redirect, Redirect::Reels);

        let post = engine.repository().post_by_id(created.post_id).await.unwrap().unwrap();
        assert_eq!(post.reel_video_id.as_deref(), Some("HYo8tXAzSeI"));

        let text = engine.create_post(ids[0], PostDraft::text("hi")).await.unwrap();
        assert_eq!(text.redirect, Redirect::Home);
    }

    #[tokio::test]
    async fn invalid_drafts_persist_nothing() {
        let (engine, ids) = engine_with(&["alice"]).await;

        let err = engine
            .create_post(ids[0], PostDraft::reel("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "youtube_url", .. }));

        let err = engine.create_post(ids[0], PostDraft::text("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "content", .. }));

        let feed = engine.list_feed(&FeedKind::Explore, 1, None).await.unwrap();
        assert_eq!(feed.total, 0);
        assert_eq!(feed.num_pages, 1);
    }

    #[tokio::test]
    async fn only_the_author_edits_or_deletes() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let post = engine.create_post(ids[0], PostDraft::text("v1")).await.unwrap().post_id;

        let err = engine
            .update_post(ids[1], post, PostDraft::text("hijack"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_operation");
        let err = engine.deactivate_post(ids[1], post).await.unwrap_err();
        assert_eq!(err.code(), "invalid_operation");

        engine.update_post(ids[0], post, PostDraft::text("v2")).await.unwrap();
        let stored = engine.repository().post_by_id(post).await.unwrap().unwrap();
        assert_eq!(stored.content, "v2");
        assert!(stored.updated_at >= stored.created_at);

        assert_eq!(engine.deactivate_post(ids[0], post).await.unwrap(), Deleted::new());
    }

    #[tokio::test]
    async fn comments_validate_and_notify() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        let post = engine.create_post(alice, PostDraft::text("hello")).await.unwrap().post_id;

        let err = engine.add_comment(bob, post, "  ", None).await.unwrap_err();
        assert_eq!(err.body().field, Some("content"));
        let err = engine
            .add_comment(bob, post, &"x".repeat(501), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");

        let added = engine.add_comment(bob, post, "nice", None).await.unwrap();
        assert_eq!(added.comments_count, 1);
        assert_eq!(added.comment.author_username, "bob");

        // own comment stays silent
        engine.add_comment(alice, post, "thanks", None).await.unwrap();

        let page = engine.list_notifications(alice, 1).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].notification_type, NotificationType::Comment);
        assert_eq!(page.items[0].message, "bob commented on your post");
    }

    #[tokio::test]
    async fn replies_must_share_the_post() {
        let (engine, ids) = engine_with(&["alice"]).await;
        let first = engine.create_post(ids[0], PostDraft::text("one")).await.unwrap().post_id;
        let second = engine.create_post(ids[0], PostDraft::text("two")).await.unwrap().post_id;
        let parent = engine.add_comment(ids[0], first, "top", None).await.unwrap();

        let err = engine
            .add_comment(ids[0], second, "stray", Some(parent.comment.comment.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "parent_id", .. }));

        let err = engine.add_comment(ids[0], first, "ghost", Some(999)).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn post_detail_threads_replies() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        let post = engine.create_post(alice, PostDraft::text("hello")).await.unwrap().post_id;

        let top = engine.add_comment(bob, post, "top", None).await.unwrap().comment.comment.id;
        let reply = engine.add_comment(alice, post, "reply", Some(top)).await.unwrap().comment.comment.id;
        engine.add_comment(bob, post, "deeper", Some(reply)).await.unwrap();
        engine.add_comment(alice, post, "second top", None).await.unwrap();
        engine.toggle_comment_like(alice, top).await.unwrap();

        let detail = engine.post_detail(post, Some(bob)).await.unwrap();
        assert_eq!(detail.post.comments_count, 4);
        assert_eq!(detail.comments.len(), 2);
        let thread = &detail.comments[0];
        assert_eq!(thread.comment.comment.content, "top");
        assert_eq!(thread.comment.likes_count, 1);
        assert_eq!(thread.comment.replies_count, 1);
        let replies: Vec<&str> = thread.replies.iter().map(|r| r.comment.content.as_str()).collect();
        assert_eq!(replies, vec!["reply", "deeper"]);

        engine.deactivate_comment(alice, reply).await.unwrap();
        let detail = engine.post_detail(post, None).await.unwrap();
        assert_eq!(detail.post.comments_count, 3);
        // the orphaned grandchild has no visible root
        assert!(detail.comments[0].replies.is_empty());
    }

    #[tokio::test]
    async fn soft_delete_hides_post_but_keeps_rows() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        let post = engine
            .create_post(alice, PostDraft::text("searchable words"))
            .await
            .unwrap()
            .post_id;
        let comment = engine.add_comment(bob, post, "hi", None).await.unwrap().comment.comment.id;
        engine.toggle_like(bob, post).await.unwrap();
        let reel = engine
            .create_post(alice, PostDraft::reel("https://www.youtube.com/shorts/PRM4Ra_ds7o"))
            .await
            .unwrap()
            .post_id;
        assert_eq!(engine.list_reels(None).await.unwrap().items.len(), 1);

        engine.deactivate_post(alice, post).await.unwrap();
        engine.deactivate_post(alice, reel).await.unwrap();

        for kind in [
            FeedKind::Home,
            FeedKind::Explore,
            FeedKind::Profile("alice".into()),
            FeedKind::Search("searchable".into()),
        ] {
            let page = engine.list_feed(&kind, 1, Some(alice)).await.unwrap();
            assert!(page.items.is_empty(), "{:?} still shows the post", kind);
        }
        let reels = engine.list_reels(Some(alice)).await.unwrap();
        assert!(reels.items.is_empty());
        assert!(!reels.truncated);
        assert_eq!(engine.profile("alice", None).await.unwrap().posts_count, 0);
        assert_eq!(engine.post_detail(post, None).await.unwrap_err().code(), "not_found");

        let stored = engine.repository().comment_by_id(comment).await.unwrap().unwrap();
        assert!(stored.is_active);
        assert_eq!(engine.repository().likes_of_post(post).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn follow_by_username() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);

        let on = engine.toggle_follow(alice, "bob").await.unwrap();
        assert_eq!(on.state, ToggleState::On);
        assert_eq!(on.count, 1);

        let err = engine.toggle_follow(alice, "alice").await.unwrap_err();
        assert_eq!(err.code(), "invalid_operation");
        let err = engine.toggle_follow(alice, "nobody").await.unwrap_err();
        assert_eq!(err.code(), "not_found");

        let page = engine.list_notifications(bob, 1).await.unwrap();
        assert_eq!(page.items[0].message, "alice started following you");
        assert_eq!(page.items[0].post_id, None);

        let followers = engine.followers("bob", 1).await.unwrap();
        assert_eq!(followers.items[0].user.id, alice);
        assert!(engine.following("bob", 1).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn profile_summary_depends_on_viewer() {
        let (engine, ids) = engine_with(&["alice", "bob", "carol"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        engine.create_post(bob, PostDraft::text("hi")).await.unwrap();
        engine.toggle_follow(alice, "bob").await.unwrap();

        let seen_by_alice = engine.profile("bob", Some(alice)).await.unwrap();
        assert_eq!(seen_by_alice.posts_count, 1);
        assert_eq!(seen_by_alice.followers_count, 1);
        assert!(seen_by_alice.viewer_is_following);
        assert!(!seen_by_alice.is_own_profile);

        let own = engine.profile("bob", Some(bob)).await.unwrap();
        assert!(own.is_own_profile);
        assert!(!own.viewer_is_following);

        let anonymous = engine.profile("bob", None).await.unwrap();
        assert!(!anonymous.viewer_is_following);

        let alice_profile = engine.profile("alice", None).await.unwrap();
        assert_eq!(alice_profile.following_count, 1);
    }

    #[tokio::test]
    async fn shares_validate_type_and_target() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let post = engine.create_post(ids[0], PostDraft::text("hi")).await.unwrap().post_id;

        let err = engine.share_post(ids[1], post, "carrier-pigeon", "").await.unwrap_err();
        assert_eq!(err.code(), "validation_error");
        let err = engine
            .share_post(ids[1], post, "external", &"x".repeat(101))
            .await
            .unwrap_err();
        assert_eq!(err.body().field, Some("shared_to"));

        let shared = engine.share_post(ids[1], post, "", "").await.unwrap();
        assert_eq!(shared.shares_count, 1);
        let page = engine.list_notifications(ids[0], 1).await.unwrap();
        assert_eq!(page.items[0].message, "bob shared your post");
    }

    #[tokio::test]
    async fn listing_notifications_marks_all_read() {
        let (engine, ids) = engine_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        for i in 0..25 {
            let post = engine
                .create_post(alice, PostDraft::text(format!("post {i}")))
                .await
                .unwrap()
                .post_id;
            engine.toggle_like(bob, post).await.unwrap();
        }
        assert_eq!(engine.unread_notification_count(alice).await.unwrap(), 25);

        let first = engine.list_notifications(alice, 1).await.unwrap();
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.items[0].sender_username, "bob");
        assert_eq!(engine.unread_notification_count(alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reels_use_configured_limit() {
        let engine = Engine::in_memory(1).await.unwrap();
        let alice = engine.register_user(NewUser::new("alice")).await.unwrap().id;
        for url in [
            "https://www.youtube.com/watch?v=PRM4Ra_ds7o",
            "https://www.youtube.com/embed/HYo8tXAzSeI",
        ] {
            engine.create_post(alice, PostDraft::reel(url)).await.unwrap();
        }

        let reels = engine.list_reels(Some(alice)).await.unwrap();
        assert_eq!(reels.items.len(), 1);
        assert!(reels.truncated);
        assert_eq!(reels.items[0].post.reel_video_id.as_deref(), Some("HYo8tXAzSeI"));
    }
}
