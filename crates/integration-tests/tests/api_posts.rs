use axum::http::StatusCode;
use domains::{CommentRepository, PostRepository};
use integration_tests::TestApp;

#[tokio::test]
async fn create_post_adds_one_and_redirects_to_profile() {
    let app = TestApp::spawn().await;
    let (_, cookie) = app.user("leo").await;
    let cats = app.group("Cats", "cats").await;
    let before = app.post_count().await;

    let response = app
        .post_form(
            "/create/",
            &format!("text=Fresh+post&group={}", cats.id),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/profile/leo/");
    assert_eq!(app.post_count().await, before + 1);

    let page = app.get("/group/cats/", None).await;
    assert!(page.body.contains("Fresh post"));
}

#[tokio::test]
async fn anonymous_create_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/create/", "text=sneaky", None).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/auth/login/?next=/create/");
    assert_eq!(app.post_count().await, 0);

    let form = app.get("/create/", None).await;
    assert_eq!(form.location(), "/auth/login/?next=/create/");
}

#[tokio::test]
async fn blank_text_redisplays_the_form() {
    let app = TestApp::spawn().await;
    let (_, cookie) = app.user("leo").await;

    let response = app.post_form("/create/", "text=+++&group=", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("This field is required."));
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn unknown_group_is_an_invalid_choice() {
    let app = TestApp::spawn().await;
    let (_, cookie) = app.user("leo").await;

    let response = app
        .post_form("/create/", "text=hello&group=999", Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Select a valid choice."));
    assert!(response.body.contains(">hello</textarea>"));
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn author_edit_changes_text_and_keeps_id() {
    let app = TestApp::spawn().await;
    let (leo, cookie) = app.user("leo").await;
    let post = app.post_with_text(&leo, "original", None).await;

    let form = app.get(&format!("/posts/{}/edit/", post.id), Some(&cookie)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains(">original</textarea>"));

    let response = app
        .post_form(
            &format!("/posts/{}/edit/", post.id),
            "text=edited&group=",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), format!("/posts/{}/", post.id));

    let stored = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.post.id, post.id);
    assert_eq!(stored.post.text, "edited");
    assert_eq!(app.post_count().await, 1);
}

#[tokio::test]
async fn non_author_edit_redirects_and_changes_nothing() {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    let (_, anna_cookie) = app.user("anna").await;
    let post = app.post_with_text(&leo, "original", None).await;
    let edit_url = format!("/posts/{}/edit/", post.id);

    let form = app.get(&edit_url, Some(&anna_cookie)).await;
    assert_eq!(form.status, StatusCode::SEE_OTHER);
    assert_eq!(form.location(), format!("/posts/{}/", post.id));

    let response = app
        .post_form(&edit_url, "text=hijacked&group=", Some(&anna_cookie))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), format!("/posts/{}/", post.id));

    let stored = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.post.text, "original");
    assert_eq!(stored.author.id, leo.id);
}

#[tokio::test]
async fn detail_shows_post_and_author_count() {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    app.post(&leo, None).await;
    let post = app.post_with_text(&leo, "The detailed post", None).await;

    let response = app.get(&format!("/posts/{}/", post.id), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("The detailed post"));
    assert!(response.body.contains("Posts by this author: 2"));
    assert!(!response.body.contains("Edit post"));
    assert!(!response.body.contains(r#"name="text""#));
}

#[tokio::test]
async fn unknown_or_malformed_post_is_404() {
    let app = TestApp::spawn().await;

    assert_eq!(app.get("/posts/999/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/posts/abc/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/group/nope/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/profile/nobody/", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_renders_not_found_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/unexisting_page/", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found"));
    assert!(response.body.contains("/unexisting_page/"));
}

#[tokio::test]
async fn comment_appears_on_detail() {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    let (_, anna_cookie) = app.user("anna").await;
    let post = app.post(&leo, None).await;

    let response = app
        .post_form(
            &format!("/posts/{}/comment/", post.id),
            "text=Nice+one",
            Some(&anna_cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), format!("/posts/{}/", post.id));

    let detail = app.get(&format!("/posts/{}/", post.id), Some(&anna_cookie)).await;
    assert!(detail.body.contains("Nice one"));
    assert!(detail.body.contains(r#"href="/profile/anna/""#));
}

#[tokio::test]
async fn empty_comment_is_dropped_silently() {
    let app = TestApp::spawn().await;
    let (leo, cookie) = app.user("leo").await;
    let post = app.post(&leo, None).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", post.id), "text=", Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), format!("/posts/{}/", post.id));
    assert!(app.store.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_comment_redirects_to_login() {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    let post = app.post(&leo, None).await;
    let url = format!("/posts/{}/comment/", post.id);

    let response = app.post_form(&url, "text=hi", None).await;

    assert_eq!(response.location(), format!("/auth/login/?next={url}"));
    assert!(app.store.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_on_missing_post_is_404() {
    let app = TestApp::spawn().await;
    let (_, cookie) = app.user("leo").await;

    let response = app.post_form("/posts/42/comment/", "text=hi", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
