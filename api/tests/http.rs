use std::time::Duration;

use ask_server::{
    config::{AuthConfig, SigningSecret, TranscriptConfig},
    rest, store,
    token::{Profile, TokenIssuer},
    transcription::{TranscriptionPoller, FALLBACK_LABEL},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-test-secret";

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    store::init_schema(&pool).await.unwrap();
    pool
}

fn auth_config(secret: Option<&str>) -> AuthConfig {
    let mut config = AuthConfig::new(secret.and_then(SigningSecret::new));
    config.cookie_secure = false;
    config
}

async fn app_with(auth: AuthConfig, labeler: TranscriptionPoller) -> (Router, SqlitePool) {
    let pool = memory_pool().await;
    let state = AppState::new(pool.clone(), auth, labeler);
    (rest::router(state), pool)
}

async fn app() -> (Router, SqlitePool) {
    app_with(
        auth_config(Some(SECRET)),
        TranscriptionPoller::from_config(&TranscriptConfig::default()),
    )
    .await
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_header(mut request: Request<Body>, name: header::HeaderName, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .append(name, value.parse().unwrap());
    request
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn signup(app: &Router, email: &str, name: &str, password: &str) -> Value {
    let response = send(
        app,
        post_json(
            "/api/auth/signup",
            json!({"email": email, "name": name, "password": password}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

/// Signs in and returns the token and the `Set-Cookie` value.
async fn signin(app: &Router, email: &str, password: &str) -> (String, String) {
    let response = send(
        app,
        post_json("/api/auth/signin", json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = json_body(response).await;
    (body["token"].as_str().unwrap().to_string(), cookie)
}

#[tokio::test]
async fn signin_then_resolve_from_bearer_and_cookie() {
    let (app, _) = app().await;
    let user = signup(&app, "Ada@Example.com", "Ada", "correct horse").await;
    assert_eq!(user["email"], "ada@example.com");
    assert!(user.get("password_hash").is_none());

    let (token, cookie) = signin(&app, "ada@example.com", "correct horse").await;
    assert!(cookie.starts_with(&format!("session={token};")));
    assert!(cookie.contains("HttpOnly"));

    let response = send(
        &app,
        with_header(get("/api/auth/me"), header::AUTHORIZATION, &format!("Bearer {token}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = json_body(response).await;
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["name"], "Ada");

    let response = send(
        &app,
        with_header(get("/api/auth/me"), header::COOKIE, &format!("session={token}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["email"], "ada@example.com");
}

#[tokio::test]
async fn unauthenticated_requests_get_one_generic_message() {
    let (app, _) = app().await;
    let profile = Profile {
        email: "x@example.com".to_string(),
        name: "X".to_string(),
    };
    let other_secret = TokenIssuer::new(auth_config(Some("other")))
        .issue("1", &profile)
        .unwrap();

    for request in [
        get("/api/auth/me"),
        with_header(get("/api/auth/me"), header::AUTHORIZATION, "Bearer garbage"),
        with_header(
            get("/api/auth/me"),
            header::AUTHORIZATION,
            &format!("Bearer {other_secret}"),
        ),
        with_header(get("/api/asks"), header::COOKIE, "session=a.b.c"),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Unauthorized"}));
    }
}

#[tokio::test]
async fn bearer_identity_wins_over_cookie_identity() {
    let (app, _) = app().await;
    signup(&app, "a@example.com", "Alice", "password-a").await;
    signup(&app, "b@example.com", "Bob", "password-b").await;
    let (token_a, _) = signin(&app, "a@example.com", "password-a").await;
    let (token_b, _) = signin(&app, "b@example.com", "password-b").await;

    let request = with_header(
        with_header(get("/api/auth/me"), header::AUTHORIZATION, &format!("Bearer {token_a}")),
        header::COOKIE,
        &format!("session={token_b}"),
    );
    let me = json_body(send(&app, request).await).await;
    assert_eq!(me["name"], "Alice");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let (app, _) = app().await;
    signup(&app, "a@example.com", "Alice", "password-a").await;

    let wrong = send(
        &app,
        post_json("/api/auth/signin", json!({"email": "a@example.com", "password": "nope"})),
    )
    .await;
    let unknown = send(
        &app,
        post_json("/api/auth/signin", json!({"email": "z@example.com", "password": "nope"})),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong).await, json_body(unknown).await);
}

#[tokio::test]
async fn missing_secret_fails_signin_as_internal_error() {
    let (app, _) = app_with(
        auth_config(None),
        TranscriptionPoller::from_config(&TranscriptConfig::default()),
    )
    .await;
    signup(&app, "a@example.com", "Alice", "password-a").await;

    let response = send(
        &app,
        post_json("/api/auth/signin", json!({"email": "a@example.com", "password": "password-a"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (app, _) = app().await;
    signup(&app, "a@example.com", "Alice", "password-a").await;
    let response = send(
        &app,
        post_json(
            "/api/auth/signup",
            json!({"email": "A@example.com", "name": "Al", "password": "password-b"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn legacy_plaintext_signin_upgrades_the_credential() {
    let (app, pool) = app().await;
    let (user_id,): (i64,) =
        sqlx::query_as("INSERT INTO users (email, name) VALUES ('old@example.com', 'Old') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO credentials (user_id, scheme, secret) VALUES (?, 'plaintext', 'hunter2')")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let rejected = send(
        &app,
        post_json("/api/auth/signin", json!({"email": "old@example.com", "password": "hunter3"})),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    signin(&app, "old@example.com", "hunter2").await;

    let schemes: Vec<(String,)> = sqlx::query_as("SELECT scheme FROM credentials WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(schemes, vec![("argon2".to_string(),)]);

    signin(&app, "old@example.com", "hunter2").await;
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let (app, _) = app().await;
    signup(&app, "a@example.com", "Alice", "password-a").await;
    let (token, _) = signin(&app, "a@example.com", "password-a").await;
    let bearer = format!("Bearer {token}");

    let rejected = send(
        &app,
        with_header(
            post_json(
                "/api/auth/password",
                json!({"current_password": "wrong", "new_password": "password-new"}),
            ),
            header::AUTHORIZATION,
            &bearer,
        ),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let changed = send(
        &app,
        with_header(
            post_json(
                "/api/auth/password",
                json!({"current_password": "password-a", "new_password": "password-new"}),
            ),
            header::AUTHORIZATION,
            &bearer,
        ),
    )
    .await;
    assert_eq!(changed.status(), StatusCode::NO_CONTENT);

    signin(&app, "a@example.com", "password-new").await;
}

#[tokio::test]
async fn signout_clears_the_cookie() {
    let (app, _) = app().await;
    let response = send(&app, post_json("/api/auth/signout", json!({}))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn untitled_ask_without_transcription_gets_fallback_label() {
    let (app, _) = app().await;
    signup(&app, "a@example.com", "Alice", "password-a").await;
    let (token, _) = signin(&app, "a@example.com", "password-a").await;

    let response = send(
        &app,
        with_header(
            post_json("/api/asks", json!({"video_url": "https://cdn/pitch.mp4", "title": "  "})),
            header::AUTHORIZATION,
            &format!("Bearer {token}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["title"], FALLBACK_LABEL);
}

#[tokio::test]
async fn untitled_ask_is_labelled_from_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-9", "status": "queued"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/transcript/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-9",
            "status": "completed",
            "text": "hello world this is my startup pitch video"
        })))
        .mount(&server)
        .await;

    let transcript = TranscriptConfig {
        api_key: Some("test-key".to_string()),
        base_url: format!("{}/v2", server.uri()),
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    };
    let (app, _) = app_with(
        auth_config(Some(SECRET)),
        TranscriptionPoller::from_config(&transcript),
    )
    .await;
    signup(&app, "a@example.com", "Alice", "password-a").await;
    let (token, cookie) = signin(&app, "a@example.com", "password-a").await;
    let session = cookie.split(';').next().unwrap().to_string();

    let response = send(
        &app,
        with_header(
            post_json("/api/asks", json!({"video_url": "https://cdn/pitch.mp4"})),
            header::COOKIE,
            &session,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["title"], "hello world this is my startup pitch");

    let response = send(
        &app,
        with_header(
            post_json("/api/asks", json!({"video_url": "https://cdn/b.mp4", "title": "Seed round"})),
            header::AUTHORIZATION,
            &format!("Bearer {token}"),
        ),
    )
    .await;
    assert_eq!(json_body(response).await["title"], "Seed round");

    let listed = json_body(
        send(
            &app,
            with_header(get("/api/asks"), header::AUTHORIZATION, &format!("Bearer {token}")),
        )
        .await,
    )
    .await;
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|ask| ask["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Seed round", "hello world this is my startup pitch"]);
}
