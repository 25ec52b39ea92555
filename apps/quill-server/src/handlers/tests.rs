//! Handler tests over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use quill_infra::{
    Argon2PasswordService, InMemoryRateLimiter, InMemoryStore, JwtConfig, JwtTokenService,
    LocalMediaStorage, RateLimitConfig,
};

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

use super::configure_routes;

const STAFF_EMAIL: &str = "editor@example.com";

fn test_state() -> AppState {
    let media_root = std::env::temp_dir().join(format!("quill-test-{}", uuid::Uuid::new_v4()));
    AppState::with_parts(
        Arc::new(InMemoryStore::new()),
        "memory",
        Arc::new(LocalMediaStorage::new(media_root)),
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".into(),
            ..JwtConfig::default()
        })),
        Arc::new(Argon2PasswordService::new()),
        vec![STAFF_EMAIL.to_string()],
    )
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

/// Register an account and return its bearer header value.
macro_rules! register {
    ($app:expr, $username:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": $username,
                "email": $email,
                "password": "correct-horse",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", body["access_token"].as_str().unwrap())
    }};
}

fn location<B>(res: &actix_web::dev::ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn health_reports_backend_and_request_id() {
    let app = init_app!(test_state());

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("X-Request-ID", "req-42"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["request_id"], "req-42");
}

#[actix_web::test]
async fn anonymous_post_creation_is_forbidden() {
    let app = init_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .set_json(json!({ "title": "Hi", "content": "There" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri("/posts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"], json!([]));
}

#[actix_web::test]
async fn malformed_token_is_unauthorized() {
    let app = init_app!(test_state());

    let req = test::TestRequest::get()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn created_post_redirects_and_carries_its_tags() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({
            "title": "First",
            "content": "Hello",
            "tags_str": "news, django ; web",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let post_url = location(&res);
    assert!(post_url.starts_with("/posts/"));

    let req = test::TestRequest::get().uri(&post_url).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let mut names: Vec<_> = body["post"]["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["django", "news", "web"]);
    assert_eq!(body["post"]["author"]["username"], "ann");
    assert_eq!(body["comment_form"], json!({ "content": "" }));
    assert_eq!(body["sidebar"]["uncategorized_count"], 1);
}

#[actix_web::test]
async fn invalid_post_form_is_re_presented() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({ "title": "", "content": "Body", "tags_str": "a; b" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(body["form"]["form"]["content"], "Body");
    assert_eq!(body["form"]["form"]["tags_str"], "a; b");
    assert!(body["request_id"].is_string());
}

#[actix_web::test]
async fn over_long_tag_is_rejected_before_saving() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");
    let tags = format!("news; {}", "t".repeat(60));

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({ "title": "Tagged", "content": "Body", "tags_str": tags }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["errors"][0]["field"], "tags_str");
    assert_eq!(body["form"]["form"]["tags_str"], tags.as_str());

    let req = test::TestRequest::get().uri("/tags").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn stale_token_cannot_write_after_account_deletion() {
    let app = init_app!(test_state());
    let bob = register!(app, "bob", "bob@example.com");
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, bob))
        .set_json(json!({ "title": "Bob's", "content": "Body" }))
        .to_request();
    let post_url = location(&test::call_service(&app, req).await);

    let req = test::TestRequest::delete()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "title": "Ghost", "content": "Body" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("{post_url}/comments"))
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({ "content": "boo" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn comments_redirect_to_their_anchor() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "title": "Post", "content": "Body" }))
        .to_request();
    let post_url = location(&test::call_service(&app, req).await);

    let req = test::TestRequest::post()
        .uri(&format!("{post_url}/comments"))
        .set_json(json!({ "content": "anonymous" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("{post_url}/comments"))
        .insert_header((header::AUTHORIZATION, token.clone()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), post_url);

    let req = test::TestRequest::post()
        .uri(&format!("{post_url}/comments"))
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "content": "  nice post  " }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let comment_url = location(&res);
    assert!(comment_url.starts_with(&format!("{post_url}#comment-")));

    let req = test::TestRequest::get().uri(&post_url).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["comments"][0]["content"], "nice post");
    assert_eq!(body["comments"][0]["url"], comment_url);
}

#[actix_web::test]
async fn non_owner_cannot_edit_or_delete() {
    let app = init_app!(test_state());
    let owner = register!(app, "ann", "ann@example.com");
    let other = register!(app, "bob", "bob@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, owner))
        .set_json(json!({ "title": "Mine", "content": "Body" }))
        .to_request();
    let post_url = location(&test::call_service(&app, req).await);

    let req = test::TestRequest::post()
        .uri(&format!("{post_url}/edit"))
        .insert_header((header::AUTHORIZATION, other.clone()))
        .set_json(json!({ "title": "Theirs", "content": "Body" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("{post_url}/delete"))
        .insert_header((header::AUTHORIZATION, other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri(&post_url).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["title"], "Mine");
}

#[actix_web::test]
async fn category_admin_is_staff_only() {
    let app = init_app!(test_state());
    let staff = register!(app, "editor", STAFF_EMAIL);
    let user = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/categories")
        .insert_header((header::AUTHORIZATION, user))
        .set_json(json!({ "name": "Programming" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/categories")
        .insert_header((header::AUTHORIZATION, staff.clone()))
        .set_json(json!({ "name": "Programming" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["slug"], "programming");

    let req = test::TestRequest::post()
        .uri("/categories")
        .insert_header((header::AUTHORIZATION, staff))
        .set_json(json!({ "name": "Programming" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn list_filters_resolve_headings() {
    let app = init_app!(test_state());

    let req = test::TestRequest::get()
        .uri("/posts/category/no_category")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["heading"]["kind"], "uncategorized");
    assert_eq!(body["heading"]["label"], "Uncategorized");

    let req = test::TestRequest::get()
        .uri("/posts/tag/missing")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn uploads_are_stored_and_served() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/media/files?filename=report.TXT")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_payload("hello")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/blog/files/"));
    assert!(url.ends_with(".txt"));

    let req = test::TestRequest::get().uri(&url).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, "hello");

    let req = test::TestRequest::post()
        .uri("/media/images?filename=empty.png")
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn registration_rejects_an_email_without_domain() {
    let app = init_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "ann", "email": "a@", "password": "correct-horse" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["message"], "Enter a valid email address.");
}

#[actix_web::test]
async fn deleted_account_leaves_posts_without_author() {
    let app = init_app!(test_state());
    let token = register!(app, "ann", "ann@example.com");

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "title": "Orphan", "content": "Body" }))
        .to_request();
    let post_url = location(&test::call_service(&app, req).await);

    let req = test::TestRequest::delete()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&post_url).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["author"], Value::Null);
}

#[actix_web::test]
async fn writes_are_rate_limited_but_reads_are_not() {
    let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    }));
    let app = test::init_service(
        App::new()
            .wrap(RateLimitMiddleware::new(limiter))
            .app_data(web::Data::new(test_state()))
            .configure(configure_routes),
    )
    .await;

    for _ in 0..3 {
        let req = test::TestRequest::get().uri("/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let login = || {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "nobody@example.com", "password": "whatever1" }))
            .to_request()
    };
    let res = test::call_service(&app, login()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(&app, login()).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
}
