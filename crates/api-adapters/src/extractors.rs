//! Request extractors: the session user, typed path ids, and the post
//! form in either encoding.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domains::{ImageUpload, PostId, User};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use services::PostInput;

use crate::error::{not_found_page, ApiError};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "yatube_session";

/// The session user, if any. Resolved once per request and memoized in
/// the request extensions, so the cache middleware and the handler share it.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<MaybeUser>() {
            return Ok(resolved.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let user = match jar.get(SESSION_COOKIE) {
            Some(cookie) => state.accounts.resolve(cookie.value()).await?,
            None => None,
        };

        let resolved = MaybeUser(user);
        parts.extensions.insert(resolved.clone());
        Ok(resolved)
    }
}

/// A logged-in user. Anonymous requests are redirected to the login page
/// with `next` pointing back at the original URL.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        user.map(CurrentUser).ok_or_else(|| login_redirect(&parts.uri))
    }
}

pub fn login_redirect(uri: &Uri) -> Response {
    let next = uri.path_and_query().map_or("/", |pq| pq.as_str());
    Redirect::to(&format!("/auth/login/?next={}", encode_next(next))).into_response()
}

/// Query-value escaping that leaves unreserved characters and `/` readable.
const NEXT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

fn encode_next(value: &str) -> String {
    utf8_percent_encode(value, NEXT_VALUE).to_string()
}

/// Only same-site paths are valid redirect targets after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Numeric `{id}` path segment; anything else is a 404.
#[derive(Debug, Clone, Copy)]
pub struct PostIdPath(pub PostId);

impl FromRequestParts<AppState> for PostIdPath {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found_page(Some(parts.uri.path().to_string())))?;

        raw.parse::<PostId>()
            .map(PostIdPath)
            .map_err(|_| not_found_page(Some(parts.uri.path().to_string())))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn requested(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Post form body: `multipart/form-data` when a file may be attached,
/// plain urlencoded otherwise.
pub struct PostSubmission(pub PostInput);

impl FromRequest<AppState> for PostSubmission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA);

        if !is_multipart {
            let Form(input) = Form::<PostInput>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self(input));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        let bad_part = |err: axum::extract::multipart::MultipartError| ApiError::BadRequest(err.body_text());

        let mut input = PostInput::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("text") => input.text = field.text().await.map_err(bad_part)?,
                Some("group") => input.group = field.text().await.map_err(bad_part)?,
                Some("image") => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(bad_part)?;
                    input.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                _ => {}
            }
        }

        Ok(Self(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_keeps_slashes_and_escapes_query() {
        insta::assert_snapshot!(encode_next("/create/"), @"/create/");
        insta::assert_snapshot!(encode_next("/follow/?page=2"), @"/follow/%3Fpage%3D2");
        insta::assert_snapshot!(encode_next("/group/café/"), @"/group/caf%C3%A9/");
    }

    #[test]
    fn login_redirect_carries_next() {
        let response = login_redirect(&"/posts/3/edit/".parse().unwrap());
        assert_eq!(response.headers()["location"], "/auth/login/?next=/posts/3/edit/");
    }

    #[test]
    fn only_local_paths_are_safe() {
        assert_eq!(safe_next(Some("/follow/")), "/follow/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let cookie = session_cookie("tok".into(), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
