//! Sign-up, login and logout. The session lives in one cookie holding a
//! signed token.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use domains::{DomainError, FormErrors};
use serde::Deserialize;
use services::{LoginInput, SignupInput};

use crate::error::{render, ApiResult};
use crate::extractors::{expired_session_cookie, safe_next, session_cookie, MaybeUser};
use crate::state::AppState;
use crate::views::{ErrorList, LoggedOutPage, LoginPage, Nav, SignupPage};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn signup_form(viewer: MaybeUser) -> ApiResult<Html<String>> {
    render(SignupPage {
        nav: Nav::for_viewer(viewer.user()),
        username: String::new(),
        errors: ErrorList::default(),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<SignupInput>,
) -> ApiResult<Response> {
    let username = input.username.clone();

    match state.accounts.signup(input).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(session.token, state.web.secure_cookie));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(DomainError::Validation(errors)) => {
            let page = render(SignupPage {
                nav: Nav::for_viewer(None),
                username,
                errors: ErrorList::from(&errors),
            })?;
            Ok(page.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

fn login_page(username: String, next: String, errors: &FormErrors) -> ApiResult<Html<String>> {
    render(LoginPage {
        nav: Nav::for_viewer(None),
        username,
        next,
        errors: ErrorList::from(errors),
    })
}

pub async fn login_form(Query(query): Query<NextQuery>) -> ApiResult<Html<String>> {
    login_page(String::new(), query.next.unwrap_or_default(), &FormErrors::new())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginInput>,
) -> ApiResult<Response> {
    let username = input.username.clone();
    let next = input.next.clone();

    match state.accounts.login(input).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(session.token, state.web.secure_cookie));
            let target = safe_next(next.as_deref());
            Ok((jar, Redirect::to(target)).into_response())
        }
        Err(DomainError::Validation(errors)) => {
            let page = login_page(username, next.unwrap_or_default(), &errors)?;
            Ok(page.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(jar: CookieJar) -> ApiResult<Response> {
    let page = render(LoggedOutPage {
        nav: Nav::for_viewer(None),
    })?;
    Ok((jar.remove(expired_session_cookie()), page).into_response())
}
