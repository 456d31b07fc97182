//! Test harness: the real router over in-memory SQLite, a temporary media
//! directory and the in-process page cache, driven with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use api_adapters::{router, AppState, Backends, WebConfig, SESSION_COOKIE};
use auth_adapters::{Argon2PasswordHasher, JwtSessionTokens};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use domains::{
    Group, GroupRepository, NewGroup, NewPost, NewUser, Paginator, Post, PostRepository,
    PostScope, SessionTokens, User, UserRepository,
};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use secrecy::SecretString;
use storage_adapters::{LocalMediaStorage, MemoryPageCache, SqliteStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// 1x2 transparent GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<SqliteStore>,
    pub media_dir: TempDir,
    tokens: Arc<JwtSessionTokens>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    /// Number of post cards on a listing page.
    pub fn post_cards(&self) -> usize {
        self.body.matches(r#"<article class="post">"#).count()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

/// A multipart file part.
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_ttl(Duration::from_secs(20)).await
    }

    pub async fn spawn_with_ttl(index_cache_ttl: Duration) -> Self {
        let store = Arc::new(SqliteStore::in_memory().await.expect("in-memory sqlite"));
        let media_dir = tempfile::tempdir().expect("media dir");
        let tokens = Arc::new(JwtSessionTokens::new(
            &SecretString::from("integration-test-secret".to_string()),
            chrono::Duration::hours(1),
        ));

        let backends = Backends {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store.clone(),
            media: Arc::new(LocalMediaStorage::new(media_dir.path(), "/media")),
            cache: Arc::new(MemoryPageCache::new()),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            tokens: tokens.clone(),
        };
        let web = WebConfig {
            index_cache_ttl,
            media_root: media_dir.path().to_path_buf(),
            ..WebConfig::default()
        };
        let state = AppState::new(backends, Paginator::default(), web);

        Self {
            router: router(state.clone()),
            state,
            store,
            media_dir,
            tokens,
        }
    }

    /// A stored user plus a `Cookie` header value logging them in.
    pub async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .expect("create user");
        let token = self.tokens.issue(&user).expect("issue token");
        (user, format!("{SESSION_COOKIE}={token}"))
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("Posts about {title}"),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, group: Option<&Group>) -> Post {
        let text: String = Sentence(3..8).fake();
        self.post_with_text(author, &text, group).await
    }

    pub async fn post_with_text(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|group| group.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    pub async fn post_count(&self) -> usize {
        self.store
            .count_posts(PostScope::All)
            .await
            .expect("count posts")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_string())).expect("request"))
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        upload: Option<Upload<'_>>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let body = multipart_body(fields, upload);
        self.send(request.body(Body::from(body)).expect("request"))
            .await
    }
}

fn multipart_body(fields: &[(&str, &str)], upload: Option<Upload<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(upload) = upload {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                upload.file_name, upload.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(upload.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
