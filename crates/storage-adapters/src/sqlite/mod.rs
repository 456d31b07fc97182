//! # SQLite store
//!
//! Implements every repository port from `domains` over one `SqlitePool`.
//! Schema lives in `migrations/` and is embedded at compile time.

mod comments;
mod follows;
mod groups;
mod posts;
mod users;

use std::str::FromStr;

use domains::{DomainError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{error, info};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url`.
    ///
    /// An in-memory database lives only as long as its connection, so those
    /// get a single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(db_error)?;

        info!(url, in_memory, "sqlite pool ready");
        Ok(Self { pool })
    }

    /// A migrated, private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| {
                error!(error = %err, "migration failed");
                DomainError::internal(err)
            })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    error!(error = %err, "database error");
    DomainError::internal(err)
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Internal`.
pub(crate) fn conflict_or_db_error(err: sqlx::Error, what: &str) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(what.to_string())
        }
        _ => db_error(err),
    }
}

pub(crate) fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub(crate) fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use domains::{
        CommentRepository, FollowRepository, GroupRepository, NewComment, NewGroup, NewPost,
        NewUser, Paginator, PostChanges, PostRepository, PostScope, User, UserRepository,
    };

    use super::*;

    async fn user(store: &SqliteStore, name: &str) -> User {
        store
            .create_user(NewUser {
                username: name.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
    }

    async fn post(store: &SqliteStore, author: &User, text: &str, group_id: Option<i64>) -> i64 {
        store
            .create_post(NewPost {
                author_id: author.id,
                text: text.into(),
                group_id,
                image: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = SqliteStore::in_memory().await.unwrap();
        user(&store, "leo").await;

        let err = store
            .create_user(NewUser {
                username: "leo".into(),
                password_hash: "other".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn credentials_carry_the_hash() {
        let store = SqliteStore::in_memory().await.unwrap();
        let leo = user(&store, "leo").await;

        let (found, hash) = store.find_credentials("leo").await.unwrap().unwrap();
        assert_eq!(found.id, leo.id);
        assert_eq!(hash, "hash");
        assert!(store.find_credentials("anna").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_windowed() {
        let store = SqliteStore::in_memory().await.unwrap();
        let leo = user(&store, "leo").await;
        for n in 1..=13 {
            post(&store, &leo, &format!("post {n}"), None).await;
        }

        let paginator = Paginator::new(10);
        let total = store.count_posts(PostScope::All).await.unwrap();
        assert_eq!(total, 13);

        let first = store
            .list_posts(PostScope::All, paginator.window(total, Some("1")))
            .await
            .unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].post.text, "post 13");

        let second = store
            .list_posts(PostScope::All, paginator.window(total, Some("2")))
            .await
            .unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].post.text, "post 1");
    }

    #[tokio::test]
    async fn group_scope_joins_group() {
        let store = SqliteStore::in_memory().await.unwrap();
        let leo = user(&store, "leo").await;
        let cats = store
            .create_group(NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: "All about cats".into(),
            })
            .await
            .unwrap();
        post(&store, &leo, "in group", Some(cats.id)).await;
        post(&store, &leo, "no group", None).await;

        let scope = PostScope::Group(cats.id);
        let listed = store
            .list_posts(scope, Paginator::new(10).window(1, None))
            .await
            .unwrap();
        assert_eq!(store.count_posts(scope).await.unwrap(), 1);
        assert_eq!(listed[0].post.text, "in group");
        assert_eq!(listed[0].group.as_ref().map(|g| g.slug.as_str()), Some("cats"));
        assert_eq!(listed[0].author.username, "leo");
    }

    #[tokio::test]
    async fn update_keeps_id_and_image_unless_replaced() {
        let store = SqliteStore::in_memory().await.unwrap();
        let leo = user(&store, "leo").await;
        let created = store
            .create_post(NewPost {
                author_id: leo.id,
                text: "original".into(),
                group_id: None,
                image: Some("posts/aa/bb/old.gif".into()),
            })
            .await
            .unwrap();

        let edited = store
            .update_post(
                created.id,
                PostChanges {
                    text: "edited".into(),
                    group_id: None,
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.id, created.id);
        assert_eq!(edited.text, "edited");
        assert_eq!(edited.image.as_deref(), Some("posts/aa/bb/old.gif"));

        let missing = store
            .update_post(
                999,
                PostChanges {
                    text: "x".into(),
                    group_id: None,
                    image: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn follow_pair_is_unique_and_feeds_the_follow_scope() {
        let store = SqliteStore::in_memory().await.unwrap();
        let reader = user(&store, "reader").await;
        let author = user(&store, "author").await;
        post(&store, &author, "followed post", None).await;

        assert!(store.create_follow(reader.id, author.id).await.unwrap());
        assert!(!store.create_follow(reader.id, author.id).await.unwrap());
        assert!(store.is_following(reader.id, author.id).await.unwrap());
        assert_eq!(store.count_followers(author.id).await.unwrap(), 1);
        assert_eq!(store.count_following(reader.id).await.unwrap(), 1);

        let reader_feed = PostScope::FollowedBy(reader.id);
        let author_feed = PostScope::FollowedBy(author.id);
        assert_eq!(store.count_posts(reader_feed).await.unwrap(), 1);
        assert_eq!(store.count_posts(author_feed).await.unwrap(), 0);

        assert!(store.delete_follow(reader.id, author.id).await.unwrap());
        assert!(!store.delete_follow(reader.id, author.id).await.unwrap());
        assert_eq!(store.count_followers(author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn comments_list_oldest_first_with_author() {
        let store = SqliteStore::in_memory().await.unwrap();
        let leo = user(&store, "leo").await;
        let anna = user(&store, "anna").await;
        let post_id = post(&store, &leo, "post", None).await;

        for (author, text) in [(&anna, "first"), (&leo, "second")] {
            store
                .create_comment(NewComment {
                    post_id,
                    author_id: author.id,
                    text: text.into(),
                })
                .await
                .unwrap();
        }

        let comments = store.list_comments(post_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.text, "first");
        assert_eq!(comments[0].author.username, "anna");
    }
}
