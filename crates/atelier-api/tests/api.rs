use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use atelier_api::session::InMemorySessionStore;
use atelier_api::{AppStateInner, router};
use atelier_db::Database;

const PASSWORD: &str = "kiln-fired-secret";

fn build_app(admin_password: Option<&str>, secure_cookies: bool) -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory database"),
        sessions: Box::new(InMemorySessionStore::default()),
        admin_password: admin_password.map(str::to_string),
        secure_cookies,
        base_url: "http://localhost:3000".into(),
    });
    router(state)
}

fn app_with_password(admin_password: Option<&str>) -> Router {
    build_app(admin_password, false)
}

fn app() -> Router {
    app_with_password(Some(PASSWORD))
}

fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("router is infallible")
}

async fn body_json(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

async fn body_text(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn set_cookie(res: &Response) -> String {
    res.headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Logs in and returns the `name=value` pair to send back as a Cookie header.
async fn login(app: &Router) -> String {
    let res = send(
        app,
        request(Method::POST, "/admin/auth/login", Some(json!({ "password": PASSWORD })), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    set_cookie(&res).split(';').next().unwrap().to_string()
}

async fn is_authenticated(app: &Router, cookie: Option<&str>) -> bool {
    let res = send(app, request(Method::GET, "/admin/auth/check", None, cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["authenticated"].as_bool().unwrap()
}

// -- Public forms --

#[tokio::test]
async fn enrollment_without_content_type_is_a_validation_error() {
    let app = app();
    let body = json!({ "name": "Ana", "email": "a@b.com", "workshop": "Wheel Throwing" });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/enrollment")
        .body(Body::from(body.to_string()))
        .unwrap();

    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].as_str().unwrap().starts_with("Invalid request body: "));

    let res = send(&app, request(Method::GET, "/admin/data", None, Some(&login(&app).await))).await;
    assert!(body_json(res).await["enrollments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn enrollment_with_wrong_content_type_is_a_validation_error() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/enrollment")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"name":"Ana","email":"a@b.com","workshop":"Glazing"}"#))
        .unwrap();

    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].as_str().unwrap().starts_with("Invalid request body: "));
}

#[tokio::test]
async fn minimal_enrollment_is_created_with_defaults() {
    let app = app();
    let res = send(
        &app,
        request(
            Method::POST,
            "/enrollment",
            Some(json!({ "name": "Ana", "email": "a@b.com", "workshop": "Pottery" })),
            None,
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(data["id"].as_i64().unwrap() > 0);
    assert_eq!(data["name"], "Ana");
    assert_eq!(data["phone"], Value::Null);
    assert_eq!(data["preferredDate"], Value::Null);
    assert_eq!(data["message"], Value::Null);
    assert_eq!(data["locale"], "en");
    assert!(data["createdAt"].is_string());
}

#[tokio::test]
async fn enrollment_ids_strictly_increase() {
    let app = app();
    let mut ids = Vec::new();
    for name in ["Ana", "Bram", "Cem"] {
        let res = send(
            &app,
            request(
                Method::POST,
                "/enrollment",
                Some(json!({ "name": name, "email": "x@y.com", "workshop": "Weaving", "locale": "tr" })),
                None,
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        ids.push(body_json(res).await["data"]["id"].as_i64().unwrap());
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids: {ids:?}");
}

#[tokio::test]
async fn enrollment_missing_required_fields_is_rejected_and_not_stored() {
    let app = app();
    let cases = [
        json!({ "email": "a@b.com", "workshop": "Pottery" }),
        json!({ "name": "Ana", "workshop": "Pottery" }),
        json!({ "name": "Ana", "email": "a@b.com" }),
        json!({ "name": "", "email": "a@b.com", "workshop": "Pottery" }),
        json!({}),
    ];

    for body in cases {
        let res = send(&app, request(Method::POST, "/enrollment", Some(body.clone()), None)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {body}");
        assert_eq!(body_json(res).await["error"], "Missing required fields");
    }

    let cookie = login(&app).await;
    let res = send(&app, request(Method::GET, "/admin/data", None, Some(&cookie))).await;
    let data = body_json(res).await;
    assert_eq!(data["data"]["enrollments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn client_supplied_id_or_timestamp_is_rejected() {
    let app = app();
    for extra in [json!({ "createdAt": "2000-01-01T00:00:00Z" }), json!({ "id": 1 })] {
        let mut body = json!({ "name": "Ana", "email": "a@b.com", "workshop": "Pottery" });
        body.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());

        let res = send(&app, request(Method::POST, "/enrollment", Some(body), None)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(res).await["error"].is_string());
    }
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/contact-submission")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn contact_submission_requires_all_fields() {
    let app = app();

    let res = send(
        &app,
        request(
            Method::POST,
            "/contact-submission",
            Some(json!({ "name": "Ana", "email": "a@b.com", "subject": "Hi" })),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(
        &app,
        request(
            Method::POST,
            "/contact-submission",
            Some(json!({ "name": "Ana", "email": "a@b.com", "subject": "Hi", "message": "Private lessons?", "locale": "nl" })),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["data"]["subject"], "Hi");
    assert_eq!(body["data"]["locale"], "nl");
}

// -- Session gate --

#[tokio::test]
async fn login_with_correct_password_sets_session_cookie() {
    let app = app();
    let res = send(
        &app,
        request(Method::POST, "/admin/auth/login", Some(json!({ "password": PASSWORD })), None),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie(&res);
    assert!(cookie.starts_with("admin-session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));
    assert_eq!(body_json(res).await["success"], true);

    let pair = cookie.split(';').next().unwrap();
    assert!(is_authenticated(&app, Some(pair)).await);
}

#[tokio::test]
async fn production_login_marks_cookie_secure() {
    let app = build_app(Some(PASSWORD), true);
    let res = send(
        &app,
        request(Method::POST, "/admin/auth/login", Some(json!({ "password": PASSWORD })), None),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie(&res);
    assert!(cookie.starts_with("admin-session="));
    assert!(cookie.split(';').any(|attr| attr.trim() == "Secure"), "got {cookie}");
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = app();
    let res = send(
        &app,
        request(Method::POST, "/admin/auth/login", Some(json!({ "password": "guess" })), None),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(res).await["error"], "Invalid password");
    assert!(!is_authenticated(&app, None).await);
}

#[tokio::test]
async fn login_without_configured_password_is_a_configuration_error() {
    let app = app_with_password(None);
    let res = send(
        &app,
        request(Method::POST, "/admin/auth/login", Some(json!({ "password": "" })), None),
    )
    .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(res).await["error"], "Admin password not configured");
}

#[tokio::test]
async fn forged_cookie_is_not_authenticated() {
    let app = app();
    assert!(!is_authenticated(&app, Some("admin-session=authenticated")).await);

    let res = send(
        &app,
        request(Method::GET, "/admin/users", None, Some("admin-session=authenticated")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookie_and_ends_session() {
    let app = app();
    let cookie = login(&app).await;

    let res = send(&app, request(Method::POST, "/admin/auth/logout", None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = set_cookie(&res);
    assert!(cleared.starts_with("admin-session="));
    assert!(cleared.contains("Max-Age=0"));

    assert!(!is_authenticated(&app, Some(&cookie)).await);

    // Idempotent without a session.
    let res = send(&app, request(Method::POST, "/admin/auth/logout", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

// -- Admin data --

#[tokio::test]
async fn admin_data_requires_session() {
    let app = app();
    let res = send(&app, request(Method::GET, "/admin/data", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "Unauthorized");
}

#[tokio::test]
async fn admin_data_lists_newest_first() {
    let app = app();
    for name in ["First", "Second"] {
        send(
            &app,
            request(
                Method::POST,
                "/enrollment",
                Some(json!({ "name": name, "email": "a@b.com", "workshop": "Pottery" })),
                None,
            ),
        )
        .await;
        send(
            &app,
            request(
                Method::POST,
                "/contact-submission",
                Some(json!({ "name": name, "email": "a@b.com", "subject": "s", "message": "m" })),
                None,
            ),
        )
        .await;
    }

    let cookie = login(&app).await;
    let first = body_json(send(&app, request(Method::GET, "/admin/data", None, Some(&cookie))).await).await;
    let second = body_json(send(&app, request(Method::GET, "/admin/data", None, Some(&cookie))).await).await;

    assert_eq!(first, second);
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["enrollments"][0]["name"], "Second");
    assert_eq!(first["data"]["enrollments"][1]["name"], "First");
    assert_eq!(first["data"]["submissions"][0]["name"], "Second");
    assert_eq!(first["data"]["submissions"].as_array().unwrap().len(), 2);
}

// -- Admin users --

#[tokio::test]
async fn user_endpoints_require_session() {
    let app = app();
    let cases = [
        request(Method::GET, "/admin/users", None, None),
        request(Method::POST, "/admin/users", Some(json!({ "username": "a", "email": "a@x.com" })), None),
        request(Method::DELETE, "/admin/users?id=1", None, None),
    ];
    for req in cases {
        let res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn duplicate_admin_user_is_a_conflict() {
    let app = app();
    let cookie = login(&app).await;
    let alice = json!({ "username": "alice", "email": "alice@x.com" });

    let res = send(&app, request(Method::POST, "/admin/users", Some(alice.clone()), Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["lastLogin"], Value::Null);

    let res = send(&app, request(Method::POST, "/admin/users", Some(alice), Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Username or email already exists");

    let same_email = json!({ "username": "alicia", "email": "alice@x.com" });
    let res = send(&app, request(Method::POST, "/admin/users", Some(same_email), Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(&app, request(Method::GET, "/admin/users", None, Some(&cookie))).await;
    let users = body_json(res).await;
    assert_eq!(users["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_user_missing_fields_is_rejected() {
    let app = app();
    let cookie = login(&app).await;
    let res = send(
        &app,
        request(Method::POST, "/admin/users", Some(json!({ "username": "bob" })), Some(&cookie)),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Username and email are required");
}

#[tokio::test]
async fn over_long_username_is_rejected_and_not_stored() {
    let app = app();
    let cookie = login(&app).await;
    let user = json!({ "username": "u".repeat(101), "email": "long@x.com" });

    let res = send(&app, request(Method::POST, "/admin/users", Some(user), Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["error"],
        "Field 'username' must be at most 100 characters"
    );

    let res = send(&app, request(Method::GET, "/admin/users", None, Some(&cookie))).await;
    assert!(body_json(res).await["users"].as_array().unwrap().is_empty());

    let user = json!({ "username": "u".repeat(100), "email": "long@x.com" });
    let res = send(&app, request(Method::POST, "/admin/users", Some(user), Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn users_are_listed_oldest_first_and_deleted_by_id() {
    let app = app();
    let cookie = login(&app).await;

    let mut ids = Vec::new();
    for (username, role) in [("alice", "admin"), ("bob", "editor")] {
        let res = send(
            &app,
            request(
                Method::POST,
                "/admin/users",
                Some(json!({ "username": username, "email": format!("{username}@x.com"), "role": role })),
                Some(&cookie),
            ),
        )
        .await;
        ids.push(body_json(res).await["user"]["id"].as_i64().unwrap());
    }

    let users = body_json(send(&app, request(Method::GET, "/admin/users", None, Some(&cookie))).await).await;
    assert_eq!(users["users"][0]["username"], "alice");
    assert_eq!(users["users"][1]["username"], "bob");
    assert_eq!(users["users"][1]["role"], "editor");

    let uri = format!("/admin/users?id={}", ids[0]);
    let res = send(&app, request(Method::DELETE, &uri, None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["success"], true);

    let users = body_json(send(&app, request(Method::GET, "/admin/users", None, Some(&cookie))).await).await;
    assert_eq!(users["users"].as_array().unwrap().len(), 1);
    assert_eq!(users["users"][0]["username"], "bob");
}

#[tokio::test]
async fn deleting_unknown_user_succeeds_without_change() {
    let app = app();
    let cookie = login(&app).await;
    send(
        &app,
        request(
            Method::POST,
            "/admin/users",
            Some(json!({ "username": "alice", "email": "alice@x.com" })),
            Some(&cookie),
        ),
    )
    .await;

    let res = send(&app, request(Method::DELETE, "/admin/users?id=424242", None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let users = body_json(send(&app, request(Method::GET, "/admin/users", None, Some(&cookie))).await).await;
    assert_eq!(users["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_without_valid_id_is_rejected() {
    let app = app();
    let cookie = login(&app).await;

    let res = send(&app, request(Method::DELETE, "/admin/users", None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "User ID is required");

    let res = send(&app, request(Method::DELETE, "/admin/users?id=abc", None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// -- Dashboard --

#[tokio::test]
async fn dashboard_redirects_to_login_without_session() {
    let app = app();
    let res = send(&app, request(Method::GET, "/admin", None, None)).await;

    assert!(res.status().is_redirection());
    assert_eq!(res.headers()[header::LOCATION], "/admin/login");

    let res = send(&app, request(Method::GET, "/admin/login", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Admin Login"));
}

#[tokio::test]
async fn dashboard_renders_records_for_operator() {
    let app = app();
    send(
        &app,
        request(
            Method::POST,
            "/enrollment",
            Some(json!({ "name": "Ana", "email": "a@b.com", "workshop": "Pottery", "locale": "nl" })),
            None,
        ),
    )
    .await;
    let cookie = login(&app).await;

    let res = send(&app, request(Method::GET, "/admin", None, Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Admin Dashboard"));
    assert!(html.contains("Workshop Enrollments (1)"));
    assert!(html.contains("<td>NL</td>"));
    assert!(html.contains("No contact submissions yet."));

    let res = send(&app, request(Method::GET, "/admin/login", None, Some(&cookie))).await;
    assert!(res.status().is_redirection());
}

#[tokio::test]
async fn health_check_works() {
    let app = app();
    let res = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "ok");
}
