//! End-to-end tests over the assembled router: in-memory database, real
//! JWT auth, temp-dir media storage.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use reach_api::auth::AppStateInner;
use reach_api::routes;

const TEST_SECRET: &str = "integration-test-secret";

async fn app() -> Router {
    let db = reach_db::Database::open_in_memory().unwrap();
    let media_dir = std::env::temp_dir().join(format!(
        "reach-http-test-{}-{}",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));
    let media = reach_media::Storage::new(media_dir).await.unwrap();
    routes::router(Arc::new(AppStateInner {
        db,
        media,
        jwt_secret: TEST_SECRET.to_string(),
        public_url: "http://localhost:3000".to_string(),
    }))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Register a user and return (token, user_id).
async fn register(app: &Router, username: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": "hunter2hunter2", "role": role })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user_id"].as_str().unwrap().to_string(),
    )
}

async fn create_goal(app: &Router, token: &str, name: &str, target: f64) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/goals",
            Some(token),
            Some(json!({ "name": name, "target_value": target })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "goal creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_job(app: &Router, token: &str, title: &str, price: f64, goal: Option<(&str, f64)>) -> String {
    let mut req = json!({ "title": title, "description": "a campaign", "price": price });
    if let Some((goal_id, pct)) = goal {
        req["goal_id"] = json!(goal_id);
        req["goal_contribution_percent"] = json!(pct);
    }
    let (status, body) = send(app, request("POST", "/jobs", Some(token), Some(req))).await;
    assert_eq!(status, StatusCode::CREATED, "job creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = app().await;
    let (status, _) = send(&app, request("GET", "/jobs/new", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("GET", "/jobs/new", Some("not-a-jwt"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn callback_redirects_by_role() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, _) = register(&app, "nova", "influencer").await;

    let response = app
        .clone()
        .oneshot(request("GET", "/auth/callback", Some(&business), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/business");

    let response = app
        .clone()
        .oneshot(request("GET", "/auth/callback", Some(&influencer), None))
        .await
        .unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/influencer");
}

#[tokio::test]
async fn register_login_round_trip() {
    let app = app().await;
    register(&app, "acme", "business").await;

    // Duplicate username is a conflict.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "acme", "password": "hunter2hunter2", "role": "business" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "acme", "password": "hunter2hunter2" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "business");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "acme", "password": "wrong-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_completion_credits_goal_once() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let goal = create_goal(&app, &business, "q3 revenue", 1000.0).await;
    let job = create_job(&app, &business, "campaign", 100.0, Some((&goal, 50.0))).await;

    let (status, body) = send(
        &app,
        request("POST", &format!("/jobs/{job}/complete"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "completion failed: {body}");
    assert_eq!(body["credited"], 50.0);
    assert_eq!(body["already_completed"], false);
    assert_eq!(body["job"]["status"], "completed");

    // Second attempt: no double credit.
    let (status, body) = send(
        &app,
        request("POST", &format!("/jobs/{job}/complete"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credited"], 0.0);
    assert_eq!(body["already_completed"], true);

    let (_, body) = send(&app, request("GET", &format!("/goals/{goal}"), Some(&business), None)).await;
    assert_eq!(body["current_value"], 50.0);
}

#[tokio::test]
async fn completing_someone_elses_job_is_forbidden() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (rival, _) = register(&app, "rival", "business").await;
    let job = create_job(&app, &business, "campaign", 100.0, None).await;

    let (status, _) = send(
        &app,
        request("POST", &format!("/jobs/{job}/complete"), Some(&rival), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/jobs/{}/complete", uuid::Uuid::new_v4()),
            Some(&business),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn new_jobs_shrink_as_the_influencer_engages() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, _) = register(&app, "nova", "influencer").await;
    let job = create_job(&app, &business, "campaign", 100.0, None).await;

    let (_, body) = send(&app, request("GET", "/jobs/new", Some(&influencer), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/jobs/{job}/proposals"),
            Some(&influencer),
            Some(json!({ "message": "pick me" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Proposed-to jobs disappear from the feed.
    let (_, body) = send(&app, request("GET", "/jobs/new", Some(&influencer), None)).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Duplicate proposal is a conflict.
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/jobs/{job}/proposals"),
            Some(&influencer),
            Some(json!({ "message": "again" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn proposal_acceptance_hires_and_is_terminal() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, influencer_id) = register(&app, "nova", "influencer").await;
    let job = create_job(&app, &business, "campaign", 100.0, None).await;

    send(
        &app,
        request(
            "POST",
            &format!("/jobs/{job}/proposals"),
            Some(&influencer),
            Some(json!({ "message": "pick me" })),
        ),
    )
    .await;

    let (_, body) = send(
        &app,
        request("GET", &format!("/jobs/{job}/proposals"), Some(&business), None),
    )
    .await;
    let proposal = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request("POST", &format!("/proposals/{proposal}/accept"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (_, body) = send(&app, request("GET", &format!("/jobs/{job}"), Some(&business), None)).await;
    assert_eq!(body["hired_influencers"][0], influencer_id.as_str());

    // Terminal status sticks; flipping to rejected is refused.
    let (status, _) = send(
        &app,
        request("POST", &format!("/proposals/{proposal}/reject"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_requires_the_job_id_query_parameter() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let job = create_job(&app, &business, "campaign", 100.0, None).await;

    // Missing jobId: 400, nothing deleted.
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/jobs/{job}"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, request("GET", &format!("/jobs/{job}"), Some(&business), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/jobs/{job}?jobId={job}"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "campaign");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/jobs/{job}?jobId={job}"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn saved_jobs_round_trip() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, _) = register(&app, "nova", "influencer").await;
    let job = create_job(&app, &business, "campaign", 100.0, None).await;

    let (status, _) = send(
        &app,
        request("PUT", &format!("/jobs/{job}/save"), Some(&influencer), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, request("GET", "/jobs/saved", Some(&influencer), None)).await;
    assert_eq!(body["data"][0]["id"], job.as_str());

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/jobs/{job}/save"), Some(&influencer), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, request("GET", "/jobs/saved", Some(&influencer), None)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn contract_acceptance_books_and_settles_earnings() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, influencer_id) = register(&app, "nova", "influencer").await;
    let job = create_job(&app, &business, "campaign", 250.0, None).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/contracts",
            Some(&business),
            Some(json!({ "job_id": job, "influencer_id": influencer_id, "terms": "net 30" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "contract creation failed: {body}");
    let contract = body["id"].as_str().unwrap().to_string();

    // Only the named influencer may resolve it.
    let (status, _) = send(
        &app,
        request("POST", &format!("/contracts/{contract}/accept"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("POST", &format!("/contracts/{contract}/accept"), Some(&influencer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (_, body) = send(&app, request("GET", "/earnings", Some(&influencer), None)).await;
    let earning = &body["data"][0];
    assert_eq!(earning["amount"], 250.0);
    assert_eq!(earning["status"], "unpaid");
    assert!(earning["payment_date"].is_null());
    let earning_id = earning["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request("POST", &format!("/earnings/{earning_id}/pay"), Some(&business), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");
    assert!(!body["payment_date"].is_null());
}

#[tokio::test]
async fn messaging_round_trip_with_bounds() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    let (influencer, influencer_id) = register(&app, "nova", "influencer").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/conversations",
            Some(&business),
            Some(json!({ "participant_id": influencer_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation = body["id"].as_str().unwrap().to_string();

    // Over-long content is rejected.
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/conversations/{conversation}/messages"),
            Some(&business),
            Some(json!({ "content": "x".repeat(2001) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/conversations/{conversation}/messages"),
            Some(&business),
            Some(json!({ "content": "hello nova" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/conversations/{conversation}/messages"),
            Some(&influencer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["content"], "hello nova");
    assert_eq!(body[0]["status"], "delivered");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/conversations/{conversation}/read"),
            Some(&influencer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 1);

    // Outsiders are shut out.
    let (outsider, _) = register(&app, "lurker", "influencer").await;
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/conversations/{conversation}/messages"),
            Some(&outsider),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn influencer_directory_projects_public_fields() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;
    register(&app, "nova", "influencer").await;

    let (status, body) = send(&app, request("GET", "/influencers", Some(&business), None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], "nova");
    assert!(entries[0].get("password").is_none());
}

#[tokio::test]
async fn upload_and_download_media() {
    let app = app().await;
    let (business, _) = register(&app, "acme", "business").await;

    let boundary = "reach-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\nContent-Type: image/png\r\n\r\nfake-png-bytes\r\n--{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, format!("Bearer {business}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    let public_id = body["public_id"].as_str().unwrap().to_string();
    assert!(public_id.ends_with(".png"));
    assert!(body["url"].as_str().unwrap().contains(&public_id));

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/media/{public_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"fake-png-bytes");

    let (status, _) = send(
        &app,
        request("GET", "/media/0123456789abcdef0123456789abcdef.png", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_checks_guard_creation_endpoints() {
    let app = app().await;
    let (influencer, _) = register(&app, "nova", "influencer").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/jobs",
            Some(&influencer),
            Some(json!({ "title": "nope", "description": "-", "price": 10.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (business, _) = register(&app, "acme", "business").await;
    let job = create_job(&app, &business, "campaign", 10.0, None).await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/jobs/{job}/proposals"),
            Some(&business),
            Some(json!({ "message": "self-deal" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
