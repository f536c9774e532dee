use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::json;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt;

use trackr_api::create_app;

async fn setup() -> Result<(Router, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_auth_edge.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool).await?;

    Ok((app, dir))
}

fn signup(body: serde_json::Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

fn login(body: serde_json::Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

async fn into_parts(resp: Response) -> Result<(StatusCode, serde_json::Value)> {
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn signup_input_validation() -> Result<()> {
    let (app, _dir) = setup().await?;

    // short password
    let resp = app
        .clone()
        .oneshot(signup(json!({
            "name": "Short Pass",
            "email": "short@trackr.gov",
            "password": "short",
            "role": "STAFF"
        }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // malformed email
    let resp = app
        .clone()
        .oneshot(signup(json!({
            "name": "Bad Email",
            "email": "not-an-email",
            "password": "password123",
            "role": "STAFF"
        }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // the top tier cannot self-register
    let resp = app
        .clone()
        .oneshot(signup(json!({
            "name": "Wannabe Admin",
            "email": "admin@trackr.gov",
            "password": "password123",
            "role": "ADMIN"
        }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // unknown role string
    let resp = app
        .clone()
        .oneshot(signup(json!({
            "name": "No Role",
            "email": "norole@trackr.gov",
            "password": "password123",
            "role": "SUPERUSER"
        }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // missing fields
    let resp = app
        .clone()
        .oneshot(signup(json!({ "email": "missing@trackr.gov" }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let (app, _dir) = setup().await?;

    let body = json!({
        "name": "First",
        "email": "dup@trackr.gov",
        "password": "password123",
        "role": "STAFF"
    });

    let resp = app.clone().oneshot(signup(body.clone())?).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.clone().oneshot(signup(body)?).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let (app, _dir) = setup().await?;

    let resp = app
        .clone()
        .oneshot(signup(json!({
            "name": "Valid User",
            "email": "valid@trackr.gov",
            "password": "password123",
            "role": "STAFF"
        }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // wrong password for an existing account
    let resp = app
        .clone()
        .oneshot(login(json!({ "email": "valid@trackr.gov", "password": "wrongpassword" }))?)
        .await?;
    let (wrong_pw_status, wrong_pw_body) = into_parts(resp).await?;

    // nonexistent account
    let resp = app
        .clone()
        .oneshot(login(json!({ "email": "nobody@trackr.gov", "password": "password123" }))?)
        .await?;
    let (no_user_status, no_user_body) = into_parts(resp).await?;

    // Same status, same body: the caller cannot enumerate accounts.
    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);

    // missing fields are a plain 400
    let resp = app
        .clone()
        .oneshot(login(json!({ "email": "valid@trackr.gov" }))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn protected_api_rejects_missing_and_invalid_sessions() -> Result<()> {
    let (app, _dir) = setup().await?;

    // no cookie at all
    let resp = app
        .clone()
        .oneshot(Request::builder().method("GET").uri("/api/tickets").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // cookie present but not a token
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tickets")
                .header(header::COOKIE, "auth-token=garbage")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = into_parts(
        app.clone()
            .oneshot(Request::builder().method("GET").uri("/api/auth/me").body(Body::empty())?)
            .await?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("error").is_some());

    Ok(())
}
