//! Follow/unfollow toggles. Both are idempotent; repeated calls are no-ops.

use std::sync::Arc;

use domains::{DomainError, FollowRepository, Result, User, UserRepository};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Following yourself is never recorded
    OwnProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
}

pub struct FollowService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    async fn author(&self, username: &str) -> Result<User> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }

    pub async fn follow(&self, user: &User, author_username: &str) -> Result<FollowOutcome> {
        let author = self.author(author_username).await?;

        if author.id == user.id {
            debug!(user = %user.username, "ignoring self-follow");
            return Ok(FollowOutcome::OwnProfile);
        }
        if self.follows.is_following(user.id, author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        // The store's unique pair constraint settles concurrent requests.
        if !self.follows.create_follow(user.id, author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        info!(user = %user.username, author = %author.username, "followed");
        Ok(FollowOutcome::Followed)
    }

    pub async fn unfollow(&self, user: &User, author_username: &str) -> Result<UnfollowOutcome> {
        let author = self.author(author_username).await?;

        if !self.follows.delete_follow(user.id, author.id).await? {
            return Ok(UnfollowOutcome::NotFollowing);
        }

        info!(user = %user.username, author = %author.username, "unfollowed");
        Ok(UnfollowOutcome::Unfollowed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domains::{MockFollowRepository, MockUserRepository};

    use super::*;

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            username: name.into(),
            created_at: Utc::now(),
        }
    }

    fn users_with(author: User) -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_username()
            .returning(move |name| Ok((name == author.username).then(|| author.clone())));
        users
    }

    #[tokio::test]
    async fn follow_creates_once() {
        let mut follows = MockFollowRepository::new();
        follows.expect_is_following().returning(|_, _| Ok(false));
        follows
            .expect_create_follow()
            .withf(|user, author| *user == 1 && *author == 2)
            .times(1)
            .returning(|_, _| Ok(true));

        let service = FollowService::new(Arc::new(users_with(user(2, "author"))), Arc::new(follows));
        let outcome = service.follow(&user(1, "reader"), "author").await.unwrap();
        assert_eq!(outcome, FollowOutcome::Followed);
    }

    #[tokio::test]
    async fn existing_follow_is_not_duplicated() {
        let mut follows = MockFollowRepository::new();
        follows.expect_is_following().returning(|_, _| Ok(true));
        follows.expect_create_follow().never();

        let service = FollowService::new(Arc::new(users_with(user(2, "author"))), Arc::new(follows));
        let outcome = service.follow(&user(1, "reader"), "author").await.unwrap();
        assert_eq!(outcome, FollowOutcome::AlreadyFollowing);
    }

    #[tokio::test]
    async fn self_follow_is_ignored() {
        let mut follows = MockFollowRepository::new();
        follows.expect_is_following().never();
        follows.expect_create_follow().never();

        let me = user(1, "reader");
        let service = FollowService::new(Arc::new(users_with(me.clone())), Arc::new(follows));
        let outcome = service.follow(&me, "reader").await.unwrap();
        assert_eq!(outcome, FollowOutcome::OwnProfile);
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let service = FollowService::new(
            Arc::new(users_with(user(2, "author"))),
            Arc::new(MockFollowRepository::new()),
        );
        let err = service.follow(&user(1, "reader"), "ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn unfollow_without_follow_is_a_no_op() {
        let mut follows = MockFollowRepository::new();
        follows.expect_delete_follow().returning(|_, _| Ok(false));

        let service = FollowService::new(Arc::new(users_with(user(2, "author"))), Arc::new(follows));
        let outcome = service.unfollow(&user(1, "reader"), "author").await.unwrap();
        assert_eq!(outcome, UnfollowOutcome::NotFollowing);
    }
}
