use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, Group, NewPost, PageWindow, Post, PostChanges, PostId, PostRepository, PostScope,
    PostView, Result, User,
};
use sqlx::FromRow;

use super::{db_error, to_i64, to_usize, SqliteStore};

const POST_VIEW_SELECT: &str = "\
SELECT p.id, p.text, p.created_at, p.author_id, p.group_id, p.image,
       u.username   AS author_username,
       u.created_at AS author_created_at,
       g.title       AS group_title,
       g.slug        AS group_slug,
       g.description AS group_description
FROM posts p
JOIN users u ON u.id = p.author_id
LEFT JOIN post_groups g ON g.id = p.group_id";

#[derive(FromRow)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: i64,
    group_id: Option<i64>,
    image: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            text: row.text,
            created_at: row.created_at,
            author_id: row.author_id,
            group_id: row.group_id,
            image: row.image,
        }
    }
}

#[derive(FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    author_created_at: DateTime<Utc>,
    group_title: Option<String>,
    group_slug: Option<String>,
    group_description: Option<String>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let group = match (row.post.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(Group {
                id,
                title,
                slug,
                description: row.group_description.unwrap_or_default(),
            }),
            _ => None,
        };
        let author = User {
            id: row.post.author_id,
            username: row.author_username,
            created_at: row.author_created_at,
        };

        PostView {
            post: row.post.into(),
            author,
            group,
        }
    }
}

/// `WHERE` clause for a scope and the single value it binds, if any.
fn scope_filter(scope: PostScope) -> (&'static str, Option<i64>) {
    match scope {
        PostScope::All => ("1 = 1", None),
        PostScope::Group(id) => ("p.group_id = ?", Some(id)),
        PostScope::Author(id) => ("p.author_id = ?", Some(id)),
        PostScope::FollowedBy(id) => (
            "p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
            Some(id),
        ),
    }
}

#[async_trait]
impl PostRepository for SqliteStore {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (text, created_at, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(created_at)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Post {
            id: result.last_insert_rowid(),
            text: post.text,
            created_at,
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        })
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Post> {
        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("post", id));
        }

        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, text, created_at, author_id, group_id, image FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into())
    }

    async fn find_post(&self, id: PostId) -> Result<Option<PostView>> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = ?");
        let row = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(PostView::from))
    }

    async fn count_posts(&self, scope: PostScope) -> Result<usize> {
        let (filter, value) = scope_filter(scope);
        let sql = format!("SELECT COUNT(*) FROM posts p WHERE {filter}");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(value) = value {
            query = query.bind(value);
        }
        let count = query.fetch_one(&self.pool).await.map_err(db_error)?;

        Ok(to_usize(count))
    }

    async fn list_posts(&self, scope: PostScope, window: PageWindow) -> Result<Vec<PostView>> {
        let (filter, value) = scope_filter(scope);
        let sql = format!(
            "{POST_VIEW_SELECT} WHERE {filter} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        );

        let mut query = sqlx::query_as::<_, PostViewRow>(&sql);
        if let Some(value) = value {
            query = query.bind(value);
        }
        let rows = query
            .bind(to_i64(window.limit))
            .bind(to_i64(window.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }
}
