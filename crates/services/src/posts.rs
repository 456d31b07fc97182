//! Post detail, create/edit and commenting.

use std::sync::Arc;

use domains::{
    Comment, CommentRepository, CommentView, DomainError, Group, GroupRepository, MediaStorage,
    NewComment, NewPost, Post, PostChanges, PostId, PostRepository, PostScope, PostView, Result,
    User,
};
use tracing::{debug, info};

use crate::forms::{CommentInput, PostInput, ValidPost};

pub struct PostDetail {
    pub post: PostView,
    /// Oldest first
    pub comments: Vec<CommentView>,
    /// How many posts the author has written in total
    pub author_posts: usize,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
    media: Arc<dyn MediaStorage>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
            media,
        }
    }

    /// Choices for the `group` field.
    pub async fn groups(&self) -> Result<Vec<Group>> {
        self.groups.list_groups().await
    }

    async fn find(&self, id: PostId) -> Result<PostView> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    pub async fn detail(&self, id: PostId) -> Result<PostDetail> {
        let post = self.find(id).await?;
        let comments = self.comments.list_comments(id).await?;
        let author_posts = self
            .posts
            .count_posts(PostScope::Author(post.author.id))
            .await?;
        Ok(PostDetail {
            post,
            comments,
            author_posts,
        })
    }

    async fn validate(&self, input: PostInput) -> Result<(ValidPost, Option<String>)> {
        let groups = self.groups.list_groups().await?;
        let mut valid = input.validate(&groups, self.media.as_ref())?;
        let image = match valid.image.take() {
            Some(upload) => Some(self.media.save_image(upload.bytes).await?),
            None => None,
        };
        Ok((valid, image))
    }

    pub async fn create(&self, author: &User, input: PostInput) -> Result<Post> {
        let (valid, image) = self.validate(input).await?;
        let post = self
            .posts
            .create_post(NewPost {
                author_id: author.id,
                text: valid.text,
                group_id: valid.group_id,
                image,
            })
            .await?;

        info!(post_id = post.id, author = %author.username, "post created");
        Ok(post)
    }

    /// The post `viewer` may edit; `Forbidden` for anyone but its author.
    pub async fn editable(&self, viewer: &User, id: PostId) -> Result<PostView> {
        let post = self.find(id).await?;
        if post.post.author_id != viewer.id {
            debug!(post_id = id, viewer = %viewer.username, "edit refused: not the author");
            return Err(DomainError::Forbidden(format!(
                "{} is not the author of post {id}",
                viewer.username
            )));
        }
        Ok(post)
    }

    pub async fn edit(&self, viewer: &User, id: PostId, input: PostInput) -> Result<Post> {
        self.editable(viewer, id).await?;
        let (valid, image) = self.validate(input).await?;
        let post = self
            .posts
            .update_post(
                id,
                PostChanges {
                    text: valid.text,
                    group_id: valid.group_id,
                    image,
                },
            )
            .await?;

        info!(post_id = id, author = %viewer.username, "post edited");
        Ok(post)
    }

    pub async fn add_comment(
        &self,
        author: &User,
        post_id: PostId,
        input: CommentInput,
    ) -> Result<Comment> {
        self.find(post_id).await?;
        let text = input.validate()?;
        let comment = self
            .comments
            .create_comment(NewComment {
                post_id,
                author_id: author.id,
                text,
            })
            .await?;

        info!(post_id, comment_id = comment.id, author = %author.username, "comment added");
        Ok(comment)
    }
}
