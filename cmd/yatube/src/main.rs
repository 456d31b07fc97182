//! # Yatube server
//!
//! Loads settings, wires the adapters selected at compile time into the
//! services, and serves the router until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{router, AppState, Backends, WebConfig};
use auth_adapters::{Argon2PasswordHasher, JwtSessionTokens};
use configs::{CacheBackend, CacheSettings, LogFormat, LogSettings, Settings};
use domains::{PageCache, Paginator};
use storage_adapters::{LocalMediaStorage, MemoryPageCache, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings.log);

    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to open database")?,
    );
    store.migrate().await.context("failed to run migrations")?;

    let session_ttl = i64::try_from(settings.auth.session_ttl_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .context("auth.session_ttl_secs is out of range")?;

    let backends = Backends {
        users: store.clone(),
        groups: store.clone(),
        posts: store.clone(),
        comments: store.clone(),
        follows: store,
        media: Arc::new(LocalMediaStorage::new(
            &settings.media.root,
            settings.media.url_prefix.clone(),
        )),
        cache: page_cache(&settings.cache)?,
        hasher: Arc::new(Argon2PasswordHasher::new()),
        tokens: Arc::new(JwtSessionTokens::new(&settings.auth.jwt_secret, session_ttl)),
    };
    let web = WebConfig {
        index_cache_ttl: Duration::from_secs(settings.cache.index_ttl_secs),
        secure_cookie: settings.auth.secure_cookie,
        max_upload_bytes: settings.server.max_upload_bytes,
        media_root: settings.media.root.clone().into(),
        media_url_prefix: settings.media.url_prefix.clone(),
    };
    let state = AppState::new(backends, Paginator::new(settings.pagination.page_size), web);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, cache = ?settings.cache.backend, "yatube listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("yatube stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn page_cache(settings: &CacheSettings) -> anyhow::Result<Arc<dyn PageCache>> {
    match settings.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryPageCache::new())),
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            use secrecy::ExposeSecret;

            let url = settings
                .redis_url
                .as_ref()
                .context("cache.redis_url is required for the redis backend")?;
            let cache = storage_adapters::RedisPageCache::connect(url.expose_secret(), "yatube:")
                .context("failed to build redis pool")?;
            Ok(Arc::new(cache))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => anyhow::bail!("cache.backend = \"redis\" needs the `redis` feature"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
