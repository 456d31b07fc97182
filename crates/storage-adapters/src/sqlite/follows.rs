use async_trait::async_trait;
use chrono::Utc;
use domains::{FollowRepository, Result, UserId};

use super::{db_error, to_usize, SqliteStore};

#[async_trait]
impl FollowRepository for SqliteStore {
    async fn is_following(&self, user: UserId, author: UserId) -> Result<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user)
        .bind(author)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(found != 0)
    }

    async fn create_follow(&self, user: UserId, author: UserId) -> Result<bool> {
        // The CHECK constraint would reject a self-follow as an error; treat it as a no-op.
        if user == author {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (user_id, author_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user)
        .bind(author)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_follow(&self, user: UserId, author: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user)
            .bind(author)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_followers(&self, author: UserId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(to_usize(count))
    }

    async fn count_following(&self, user: UserId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(to_usize(count))
    }
}
