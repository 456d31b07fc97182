//! Web-layer errors and their HTTP rendering.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::DomainError;
use thiserror::Error;
use tracing::{debug, error};

use crate::views::{Nav, NotFoundPage, ServerErrorPage};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Renders a page template as an HTML response body.
pub fn render<T: Template>(page: T) -> ApiResult<Html<String>> {
    Ok(Html(page.render()?))
}

pub fn not_found_page(path: Option<String>) -> Response {
    let page = NotFoundPage {
        nav: Nav { username: None },
        path,
    };
    match page.render() {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(err) => {
            error!(error = %err, "cannot render 404 page");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn server_error_page() -> Response {
    let page = ServerErrorPage {
        nav: Nav { username: None },
    };
    match page.render() {
        Ok(body) => (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(DomainError::NotFound { entity, key }) => {
                debug!(entity, key = %key, "not found");
                not_found_page(None)
            }
            ApiError::Domain(DomainError::Unauthorized) => {
                Redirect::to("/auth/login/").into_response()
            }
            ApiError::Domain(DomainError::Forbidden(reason)) => {
                debug!(reason = %reason, "forbidden");
                StatusCode::FORBIDDEN.into_response()
            }
            ApiError::Domain(DomainError::Validation(errors)) => {
                debug!(?errors, "unhandled validation error");
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::Domain(DomainError::Conflict(reason)) => {
                (StatusCode::CONFLICT, reason).into_response()
            }
            ApiError::BadRequest(reason) => {
                debug!(reason = %reason, "bad request");
                (StatusCode::BAD_REQUEST, reason).into_response()
            }
            err @ (ApiError::Domain(DomainError::Internal(_)) | ApiError::Render(_)) => {
                error!(error = %err, "request failed");
                server_error_page()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::from(DomainError::not_found("post", 42)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_maps_to_500() {
        let response = ApiError::from(DomainError::internal("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_redirects_to_login() {
        let response = ApiError::from(DomainError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/auth/login/");
    }
}
