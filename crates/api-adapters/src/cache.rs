//! Whole-page caching for the index route.
//!
//! Entries are keyed by viewer and full request target and are never
//! invalidated by writes; they only leave through expiry or an explicit clear.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, error, warn};

use crate::extractors::MaybeUser;
use crate::state::AppState;

pub fn page_key(viewer: &MaybeUser, target: &str) -> String {
    let who = viewer
        .user()
        .map_or_else(|| "anon".to_string(), |user| user.id.to_string());
    format!("page:index:{who}:{target}")
}

pub async fn cache_index_page(
    State(state): State<AppState>,
    viewer: MaybeUser,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let target = request.uri().path_and_query().map_or("/", |pq| pq.as_str());
    let key = page_key(&viewer, target);

    match state.cache.get_page(&key).await {
        Ok(Some(body)) => {
            state.metrics.page_cache_hits.inc();
            debug!(key = %key, "page cache hit");
            return Html(body).into_response();
        }
        Ok(None) => {}
        Err(err) => {
            warn!(error = %err, key = %key, "page cache unavailable, rendering uncached");
            return next.run(request).await;
        }
    }

    state.metrics.page_cache_misses.inc();
    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(error = %err, "cannot buffer index page");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Ok(text) = std::str::from_utf8(&bytes) {
        let ttl = state.web.index_cache_ttl;
        if let Err(err) = state.cache.put_page(&key, text.to_string(), ttl).await {
            warn!(error = %err, key = %key, "cannot store page in cache");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domains::User;

    use super::*;

    #[test]
    fn key_separates_viewers_and_queries() {
        let anon = MaybeUser(None);
        let leo = MaybeUser(Some(User {
            id: 7,
            username: "leo".into(),
            created_at: Utc::now(),
        }));

        insta::assert_snapshot!(page_key(&anon, "/"), @"page:index:anon:/");
        insta::assert_snapshot!(page_key(&leo, "/?page=2"), @"page:index:7:/?page=2");
    }
}
