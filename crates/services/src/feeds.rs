//! Read-only listings: the main feed, group pages, profiles and the
//! personalized feed of followed authors.

use std::sync::Arc;

use domains::{
    DomainError, FollowRepository, Group, GroupRepository, Page, Paginator, PostRepository,
    PostScope, PostView, Result, User, UserRepository,
};

pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostView>,
}

pub struct ProfileFeed {
    pub author: User,
    pub page: Page<PostView>,
    /// Whether the viewer follows `author`; always false for anonymous viewers.
    pub following: bool,
    pub followers: usize,
    pub follows: usize,
}

pub struct FeedService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        follows: Arc<dyn FollowRepository>,
        paginator: Paginator,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
            follows,
            paginator,
        }
    }

    async fn page(&self, scope: PostScope, requested: Option<&str>) -> Result<Page<PostView>> {
        let total = self.posts.count_posts(scope).await?;
        let window = self.paginator.window(total, requested);
        let items = self.posts.list_posts(scope, window).await?;
        Ok(window.into_page(items))
    }

    pub async fn index(&self, requested: Option<&str>) -> Result<Page<PostView>> {
        self.page(PostScope::All, requested).await
    }

    pub async fn group(&self, slug: &str, requested: Option<&str>) -> Result<GroupFeed> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;
        let page = self.page(PostScope::Group(group.id), requested).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<&User>,
        requested: Option<&str>,
    ) -> Result<ProfileFeed> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;
        let page = self.page(PostScope::Author(author.id), requested).await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follows.is_following(viewer.id, author.id).await?
            }
            _ => false,
        };
        let followers = self.follows.count_followers(author.id).await?;
        let follows = self.follows.count_following(author.id).await?;

        Ok(ProfileFeed {
            author,
            page,
            following,
            followers,
            follows,
        })
    }

    /// Posts by authors `viewer` follows.
    pub async fn follow_feed(&self, viewer: &User, requested: Option<&str>) -> Result<Page<PostView>> {
        self.page(PostScope::FollowedBy(viewer.id), requested).await
    }
}
