use async_trait::async_trait;
use domains::{Group, GroupId, GroupRepository, NewGroup, Result};
use sqlx::FromRow;

use super::{conflict_or_db_error, db_error, SqliteStore};

#[derive(FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
        }
    }
}

#[async_trait]
impl GroupRepository for SqliteStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let result =
            sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
                .bind(&group.title)
                .bind(&group.slug)
                .bind(&group.description)
                .execute(&self.pool)
                .await
                .map_err(|err| conflict_or_db_error(err, "group slug already taken"))?;

        Ok(Group {
            id: result.last_insert_rowid(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        })
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Group::from))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Group::from))
    }
}
