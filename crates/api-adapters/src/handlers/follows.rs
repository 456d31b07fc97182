use axum::extract::{Path, State};
use axum::response::Redirect;
use services::{FollowOutcome, UnfollowOutcome};

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub async fn profile_follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> ApiResult<Redirect> {
    if state.follows.follow(&user, &username).await? == FollowOutcome::Followed {
        state.metrics.follows_created.inc();
    }
    Ok(Redirect::to(&format!("/profile/{username}/")))
}

pub async fn profile_unfollow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> ApiResult<Redirect> {
    if state.follows.unfollow(&user, &username).await? == UnfollowOutcome::Unfollowed {
        state.metrics.follows_removed.inc();
    }
    Ok(Redirect::to(&format!("/profile/{username}/")))
}
