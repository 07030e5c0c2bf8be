//! Integration Tests: HTTP surface
//!
//! Drives the `/api/v1` routes through actix's test service with the JWT
//! middleware in place and the in-memory backends behind the engine.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::Harness;
use post_service::handlers::{self, UploadLimit};
use post_service::middleware::{mint_token, JwtAuthMiddleware, MetricsMiddleware};
use post_service::models::Visibility;
use post_service::services::CreatePostInput;
use serde_json::Value;
use uuid::Uuid;

const SECRET: &str = "http-test-secret";

fn bearer(user: Uuid) -> (&'static str, String) {
    let token = mint_token(SECRET, user, chrono::Duration::minutes(5)).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.engine.clone()))
                .app_data(web::Data::new(UploadLimit(common::MAX_IMAGE_BYTES)))
                .app_data(handlers::json_config())
                .service(
                    web::scope("/api/v1")
                        .wrap(JwtAuthMiddleware::new(SECRET))
                        .wrap(MetricsMiddleware)
                        .configure(handlers::configure),
                ),
        )
        .await
    };
}

async fn seed_post(h: &Harness, author: Uuid, visibility: Visibility) -> Uuid {
    h.engine
        .posts
        .create_post(
            author,
            CreatePostInput {
                caption: Some("seeded".into()),
                visibility: Some(visibility),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

#[actix_web::test]
async fn requests_without_token_are_rejected() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/api/v1/feed").to_request();
    let resp = test::try_call_service(&app, req).await;
    let status = match resp {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn feed_returns_enriched_posts() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    seed_post(&h, alice, Visibility::Public).await;
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?limit=10")
        .insert_header(bearer(alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["author"]["username"], "alice");
    assert_eq!(body["has_more"], false);
}

#[actix_web::test]
async fn multipart_create_publishes_post() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let app = app!(h);

    let boundary = "----post-service-test";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nhello world\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"visibility\"\r\n\r\nfriends\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(alice))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let post: Value = test::read_body_json(resp).await;
    assert_eq!(post["caption"], "hello world");
    assert_eq!(post["visibility"], "friends");
    assert!(post["image_url"].as_str().unwrap().ends_with(".png"));
    assert_eq!(h.record(alice).await.posts.len(), 1);
}

#[actix_web::test]
async fn reaction_toggle_over_http() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = seed_post(&h, alice, Visibility::Public).await;
    let app = app!(h);

    let react = |kind: &'static str| {
        test::TestRequest::post()
            .uri(&format!("/api/v1/posts/{}/reactions", post))
            .insert_header(bearer(bob))
            .set_json(serde_json::json!({ "type": kind }))
            .to_request()
    };

    let resp = test::call_service(&app, react("like")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["reaction"]["type"], "like");

    let resp = test::call_service(&app, react("like")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "removed");

    let resp = test::call_service(&app, react("")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn comment_and_delete_flow() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = seed_post(&h, alice, Visibility::Public).await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/comments", post))
        .insert_header(bearer(bob))
        .set_json(serde_json::json!({ "text": "great shot" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", post))
        .insert_header(bearer(bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["kind"], "unauthorized");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/comments/{}", comment_id))
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", post))
        .insert_header(bearer(alice))
        .to_request();
    let deletion: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(deletion["reconciliation_pending"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", post))
        .insert_header(bearer(alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn save_and_share_over_http() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = seed_post(&h, alice, Visibility::Public).await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/save", post))
        .insert_header(bearer(bob))
        .to_request();
    let toggled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(toggled["saved"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/saved")
        .insert_header(bearer(bob))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["saved_posts"][0]["id"], post.to_string());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/share", post))
        .insert_header(bearer(bob))
        .set_json(serde_json::json!({ "caption": "via alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let share: Value = test::read_body_json(resp).await;
    assert_eq!(share["original_post_id"], post.to_string());
    assert_eq!(share["caption"], "via alice");
}
