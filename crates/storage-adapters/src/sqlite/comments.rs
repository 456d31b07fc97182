use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Comment, CommentRepository, CommentView, NewComment, PostId, Result, User};
use sqlx::FromRow;

use super::{db_error, SqliteStore};

#[derive(FromRow)]
struct CommentViewRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_username: String,
    author_created_at: DateTime<Utc>,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        CommentView {
            author: User {
                id: row.author_id,
                username: row.author_username,
                created_at: row.author_created_at,
            },
            comment: Comment {
                id: row.id,
                post_id: row.post_id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
            },
        }
    }
}

#[async_trait]
impl CommentRepository for SqliteStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at,
        })
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created_at,
                    u.username   AS author_username,
                    u.created_at AS author_created_at
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(CommentView::from).collect())
    }
}
