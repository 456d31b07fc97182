//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Mocks are generated for all of them behind the `testing` feature.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::models::{
    Comment, CommentView, Group, GroupId, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostId, PostScope, PostView, SessionIdentity, User, UserId,
};
use crate::pagination::PageWindow;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// The user together with their stored password hash.
    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Fails with `Conflict` when the slug is taken.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;
    async fn list_groups(&self) -> Result<Vec<Group>>;
    async fn find_group(&self, id: GroupId) -> Result<Option<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    /// Fails with `NotFound` when the post is gone.
    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Post>;
    async fn find_post(&self, id: PostId) -> Result<Option<PostView>>;
    async fn count_posts(&self, scope: PostScope) -> Result<usize>;
    /// Newest first: `created_at` descending, then `id` descending.
    async fn list_posts(&self, scope: PostScope, window: PageWindow) -> Result<Vec<PostView>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Oldest first.
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentView>>;
}

/// Directed follow relation: `user` follows `author`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn is_following(&self, user: UserId, author: UserId) -> Result<bool>;
    /// Returns `false` when the pair already existed.
    async fn create_follow(&self, user: UserId, author: UserId) -> Result<bool>;
    /// Returns `false` when there was nothing to delete.
    async fn delete_follow(&self, user: UserId, author: UserId) -> Result<bool>;
    async fn count_followers(&self, author: UserId) -> Result<usize>;
    async fn count_following(&self, user: UserId) -> Result<usize>;
}

/// Media storage contract for uploaded post images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Detects an image in `bytes`; returns its MIME type when it is one.
    fn probe(&self, bytes: &[u8]) -> Option<String>;
    /// Saves raw bytes and returns the relative path stored on the Post.
    async fn save_image(&self, bytes: Bytes) -> Result<String>;
    /// Returns the public URL for a stored path.
    fn url(&self, path: &str) -> String;
}

/// Whole-page cache. Entries only leave through expiry or `clear`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get_page(&self, key: &str) -> Result<Option<String>>;
    async fn put_page(&self, key: &str, body: String, ttl: Duration) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    /// `false` for a wrong password or an unparsable hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionTokens: Send + Sync {
    fn issue(&self, user: &User) -> Result<String>;
    /// Fails with `Unauthorized` for expired, forged or malformed tokens.
    fn verify(&self, token: &str) -> Result<SessionIdentity>;
}
