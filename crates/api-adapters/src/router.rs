use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::cache::cache_index_page;
use crate::handlers::{auth, follows, ops, posts};
use crate::state::AppState;

/// Builds the whole application: pages, account routes, media files and
/// the operational endpoints.
pub fn router(state: AppState) -> Router {
    let cached_index = Router::new()
        .route("/", get(posts::index))
        .route_layer(middleware::from_fn_with_state(state.clone(), cache_index_page));

    let media_prefix = match state.web.media_url_prefix.trim_matches('/') {
        "" => "/media".to_string(),
        prefix => format!("/{prefix}"),
    };

    Router::new()
        .merge(cached_index)
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/profile/{username}/follow/", get(follows::profile_follow))
        .route("/profile/{username}/unfollow/", get(follows::profile_unfollow))
        .route("/posts/{id}/", get(posts::post_detail))
        .route(
            "/posts/{id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/posts/{id}/comment/", post(posts::add_comment))
        .route(
            "/create/",
            get(posts::post_create_form).post(posts::post_create),
        )
        .route("/follow/", get(posts::follow_index))
        .route("/auth/signup/", get(auth::signup_form).post(auth::signup))
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", get(auth::logout))
        .route("/metrics", get(ops::metrics))
        .route("/health", get(ops::health))
        .nest_service(&media_prefix, ServeDir::new(&state.web.media_root))
        .fallback(ops::not_found)
        .layer(DefaultBodyLimit::max(state.web.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
