//! Seeds the database with the groups posts can be filed under (there is
//! no route for creating them) and an optional demo account.
//!
//! `SEED_DEMO_PASSWORD` enables the demo user `demo`.

use anyhow::Context;
use auth_adapters::Argon2PasswordHasher;
use configs::Settings;
use domains::{DomainError, GroupRepository, NewGroup, NewUser, PasswordHasher, UserRepository};
use storage_adapters::SqliteStore;
use tracing::{info, warn};

const GROUPS: &[(&str, &str, &str)] = &[
    ("Cats", "cats", "Everything about cats"),
    ("Travel", "travel", "Notes from the road"),
    ("Rust", "rust", "Systems programming, fearlessly"),
];

const DEMO_USERNAME: &str = "demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let settings = Settings::load().context("failed to load settings")?;
    let store = SqliteStore::connect(&settings.database.url, 1)
        .await
        .context("failed to open database")?;
    store.migrate().await.context("failed to run migrations")?;

    for (title, slug, description) in GROUPS {
        if store.find_group_by_slug(slug).await?.is_some() {
            info!(slug, "group exists, skipping");
            continue;
        }
        let group = store
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            })
            .await?;
        info!(id = group.id, slug, "group created");
    }

    match std::env::var("SEED_DEMO_PASSWORD") {
        Ok(password) => seed_demo_user(&store, &password).await?,
        Err(_) => warn!("SEED_DEMO_PASSWORD not set, skipping demo user"),
    }

    Ok(())
}

async fn seed_demo_user(store: &SqliteStore, password: &str) -> anyhow::Result<()> {
    let password_hash = Argon2PasswordHasher::new().hash_password(password)?;
    let created = store
        .create_user(NewUser {
            username: DEMO_USERNAME.to_string(),
            password_hash,
        })
        .await;

    match created {
        Ok(user) => info!(id = user.id, username = DEMO_USERNAME, "demo user created"),
        Err(DomainError::Conflict(_)) => info!(username = DEMO_USERNAME, "demo user exists, skipping"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
