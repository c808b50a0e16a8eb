mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use magazzino_api::{app_router, config::AppConfig, AppState};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let raw = r#"{
        "database_url": "sqlite::memory:",
        "session_secret": "0123456789abcdef0123456789abcdef"
    }"#;
    serde_json::from_str(raw).expect("valid test config")
}

#[tokio::test]
async fn health_is_public_and_pages_require_login() {
    let db = common::test_db().await;
    let app = app_router(AppState::new(db, test_config()));

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::get("/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    let response = app
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_sets_session_cookie_that_unlocks_pages() {
    let db = common::test_db().await;
    let state = AppState::new(db.clone(), test_config());
    state
        .services
        .auth
        .ensure_admin("admin@example.com", "segretissimo")
        .await
        .unwrap();
    let app = app_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "email=admin%40example.com&password=segretissimo",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let session = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_rerenders_login_without_cookie() {
    let db = common::test_db().await;
    let state = AppState::new(db.clone(), test_config());
    state
        .services
        .auth
        .ensure_admin("admin@example.com", "segretissimo")
        .await
        .unwrap();
    let app = app_router(state);

    let response = app
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=admin%40example.com&password=sbagliata"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}
