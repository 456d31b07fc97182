//! Listing, detail, create/edit and comment handlers.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use domains::{DomainError, FormErrors, PostId, User};
use services::CommentInput;
use tracing::debug;

use crate::error::{render, ApiResult};
use crate::extractors::{CurrentUser, MaybeUser, PageQuery, PostIdPath, PostSubmission};
use crate::state::AppState;
use crate::views::{
    CommentItem, ErrorList, FollowPage, GroupChoice, GroupPage, IndexPage, Nav, PageNav,
    PostCard, PostDetailPage, PostFormPage, ProfilePage,
};

fn detail_url(id: PostId) -> String {
    format!("/posts/{id}/")
}

fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

pub async fn index(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let page = state.feeds.index(query.requested()).await?;

    render(IndexPage {
        nav: Nav::for_viewer(viewer.user()),
        cards: PostCard::page(&page, state.media.as_ref()),
        pager: PageNav::of(&page),
    })
}

pub async fn group_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let feed = state.feeds.group(&slug, query.requested()).await?;

    render(GroupPage {
        nav: Nav::for_viewer(viewer.user()),
        title: feed.group.title.clone(),
        description: feed.group.description.clone(),
        cards: PostCard::page(&feed.page, state.media.as_ref()),
        pager: PageNav::of(&feed.page),
    })
}

pub async fn profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let feed = state
        .feeds
        .profile(&username, viewer.user(), query.requested())
        .await?;

    render(ProfilePage {
        nav: Nav::for_viewer(viewer.user()),
        can_follow: viewer.user().is_some_and(|user| user.id != feed.author.id),
        author: feed.author.username.clone(),
        post_count: feed.page.total,
        followers: feed.followers,
        follows: feed.follows,
        following: feed.following,
        cards: PostCard::page(&feed.page, state.media.as_ref()),
        pager: PageNav::of(&feed.page),
    })
}

pub async fn post_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    PostIdPath(id): PostIdPath,
) -> ApiResult<Html<String>> {
    let detail = state.posts.detail(id).await?;
    let viewer = viewer.user();

    render(PostDetailPage {
        nav: Nav::for_viewer(viewer),
        card: PostCard::new(&detail.post, state.media.as_ref()),
        title: detail.post.post.to_string(),
        author_posts: detail.author_posts,
        comments: detail.comments.iter().map(CommentItem::from).collect(),
        can_edit: viewer.is_some_and(|user| user.id == detail.post.author.id),
        can_comment: viewer.is_some(),
    })
}

/// Values the post form is (re-)displayed with.
struct FormState {
    text: String,
    group: String,
    current_image: Option<String>,
    errors: FormErrors,
}

async fn render_post_form(
    state: &AppState,
    user: &User,
    edit: Option<PostId>,
    form: FormState,
) -> ApiResult<Response> {
    let groups = state.posts.groups().await?;
    let action = match edit {
        Some(id) => format!("/posts/{id}/edit/"),
        None => "/create/".to_string(),
    };

    let page = render(PostFormPage {
        nav: Nav::for_viewer(Some(user)),
        is_edit: edit.is_some(),
        action,
        groups: GroupChoice::list(&groups, &form.group),
        text: form.text,
        current_image: form.current_image,
        errors: ErrorList::from(&form.errors),
    })?;
    Ok(page.into_response())
}

pub async fn post_create_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    let blank = FormState {
        text: String::new(),
        group: String::new(),
        current_image: None,
        errors: FormErrors::new(),
    };
    render_post_form(&state, &user, None, blank).await
}

pub async fn post_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PostSubmission(input): PostSubmission,
) -> ApiResult<Response> {
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.posts.create(&user, input).await {
        Ok(_) => {
            state.metrics.posts_created.inc();
            Ok(Redirect::to(&profile_url(&user.username)).into_response())
        }
        Err(DomainError::Validation(errors)) => {
            let form = FormState {
                text,
                group,
                current_image: None,
                errors,
            };
            render_post_form(&state, &user, None, form).await
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PostIdPath(id): PostIdPath,
) -> ApiResult<Response> {
    let view = match state.posts.editable(&user, id).await {
        Ok(view) => view,
        Err(DomainError::Forbidden(_)) => return Ok(Redirect::to(&detail_url(id)).into_response()),
        Err(err) => return Err(err.into()),
    };

    let form = FormState {
        text: view.post.text,
        group: view.post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        current_image: view.post.image.as_deref().map(|path| state.media.url(path)),
        errors: FormErrors::new(),
    };
    render_post_form(&state, &user, Some(id), form).await
}

pub async fn post_edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PostIdPath(id): PostIdPath,
    PostSubmission(input): PostSubmission,
) -> ApiResult<Response> {
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.posts.edit(&user, id, input).await {
        Ok(_) => {
            state.metrics.posts_edited.inc();
            Ok(Redirect::to(&detail_url(id)).into_response())
        }
        Err(DomainError::Forbidden(_)) => Ok(Redirect::to(&detail_url(id)).into_response()),
        Err(DomainError::Validation(errors)) => {
            let current = state.posts.editable(&user, id).await?;
            let form = FormState {
                text,
                group,
                current_image: current.post.image.as_deref().map(|path| state.media.url(path)),
                errors,
            };
            render_post_form(&state, &user, Some(id), form).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Invalid comments are dropped without feedback; either way the reader
/// lands back on the post.
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PostIdPath(id): PostIdPath,
    Form(input): Form<CommentInput>,
) -> ApiResult<Redirect> {
    match state.posts.add_comment(&user, id, input).await {
        Ok(_) => {
            state.metrics.comments_created.inc();
        }
        Err(DomainError::Validation(errors)) => {
            debug!(post_id = id, ?errors, "comment rejected");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(Redirect::to(&detail_url(id)))
}

pub async fn follow_index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let page = state.feeds.follow_feed(&user, query.requested()).await?;

    render(FollowPage {
        nav: Nav::for_viewer(Some(&user)),
        cards: PostCard::page(&page, state.media.as_ref()),
        pager: PageNav::of(&page),
    })
}
