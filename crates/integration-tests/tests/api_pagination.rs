use axum::http::StatusCode;
use integration_tests::TestApp;

async fn app_with_thirteen_posts() -> TestApp {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    let cats = app.group("Cats", "cats").await;
    for _ in 0..13 {
        app.post(&leo, Some(&cats)).await;
    }
    app
}

#[tokio::test]
async fn every_listing_splits_thirteen_posts_into_ten_and_three() {
    let app = app_with_thirteen_posts().await;

    for base in ["/", "/group/cats/", "/profile/leo/"] {
        let first = app.get(base, None).await;
        assert_eq!(first.status, StatusCode::OK, "{base}");
        assert_eq!(first.post_cards(), 10, "{base} page 1");

        let second = app.get(&format!("{base}?page=2"), None).await;
        assert_eq!(second.post_cards(), 3, "{base} page 2");
    }
}

#[tokio::test]
async fn follow_feed_paginates_too() {
    let app = app_with_thirteen_posts().await;
    let (_, cookie) = app.user("reader").await;
    app.get("/profile/leo/follow/", Some(&cookie)).await;

    assert_eq!(app.get("/follow/", Some(&cookie)).await.post_cards(), 10);
    assert_eq!(app.get("/follow/?page=2", Some(&cookie)).await.post_cards(), 3);
}

#[tokio::test]
async fn out_of_range_pages_clamp() {
    let app = app_with_thirteen_posts().await;

    assert_eq!(app.get("/group/cats/?page=99", None).await.post_cards(), 3);
    assert_eq!(app.get("/group/cats/?page=0", None).await.post_cards(), 10);
    assert_eq!(app.get("/group/cats/?page=abc", None).await.post_cards(), 10);
}

#[tokio::test]
async fn newest_post_comes_first() {
    let app = TestApp::spawn().await;
    let (leo, _) = app.user("leo").await;
    app.post_with_text(&leo, "older post", None).await;
    app.post_with_text(&leo, "newer post", None).await;

    let body = app.get("/profile/leo/", None).await.body;
    let newer = body.find("newer post").unwrap();
    let older = body.find("older post").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn empty_listing_has_one_empty_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/?page=3", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.post_cards(), 0);
}
