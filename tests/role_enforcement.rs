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
use uuid::Uuid;

use trackr_api::create_app;
use trackr_api::policy::Role;
use trackr_api::utils::{hash_password, utc_now};

async fn setup() -> Result<(Router, SqlitePool, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_roles.db");
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
    let app = create_app(pool.clone()).await?;

    Ok((app, pool, dir))
}

/// Provisions a credential directly, the way the seed tool does; signup
/// would refuse ADMIN.
async fn insert_user(pool: &SqlitePool, email: &str, role: Role) -> Result<Uuid> {
    let user_id = Uuid::new_v4();
    let now = utc_now();
    let password_hash = hash_password("password123")?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, department, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(email)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind("IT Department")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(user_id)
}

async fn login(app: &Router, email: &str) -> Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "password123" }).to_string(),
        ))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .context("missing set-cookie")?
        .to_str()?;
    Ok(set_cookie.split(';').next().context("empty cookie")?.to_string())
}

fn request(method: &str, uri: &str, cookie: &str, body: Option<serde_json::Value>) -> Result<Request<Body>> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header("content-type", "application/json");
    Ok(match body {
        Some(body) => builder.body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    })
}

async fn json_body(resp: Response) -> Result<serde_json::Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn ticket_visibility_and_management() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    insert_user(&pool, "staff@trackr.gov", Role::Staff).await?;
    insert_user(&pool, "officer@trackr.gov", Role::ItOfficer).await?;
    let staff = login(&app, "staff@trackr.gov").await?;
    let officer = login(&app, "officer@trackr.gov").await?;

    // one ticket from each
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/tickets",
            &staff,
            Some(json!({ "title": "Broken monitor", "description": "Flickers constantly" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let staff_ticket = json_body(resp).await?;
    let staff_ticket_id = staff_ticket["id"].as_str().context("ticket id")?.to_string();
    assert_eq!(staff_ticket["status"], json!("OPEN"));
    assert_eq!(staff_ticket["priority"], json!("MEDIUM"));

    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/tickets",
            &officer,
            Some(json!({ "title": "Printer jam", "description": "Paper stuck", "priority": "HIGH" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // staff sees only their own ticket, the officer sees both
    let resp = app.clone().oneshot(request("GET", "/api/tickets", &staff, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let staff_view = json_body(resp).await?;
    assert_eq!(staff_view.as_array().map(Vec::len), Some(1));
    assert_eq!(staff_view[0]["title"], json!("Broken monitor"));

    let resp = app.clone().oneshot(request("GET", "/api/tickets", &officer, None)?).await?;
    let officer_view = json_body(resp).await?;
    assert_eq!(officer_view.as_array().map(Vec::len), Some(2));

    // staff may not manage tickets, and the denied request must not write
    let resp = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/tickets/{staff_ticket_id}"),
            &staff,
            Some(json!({ "status": "RESOLVED" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let status: String = sqlx::query_scalar("SELECT status FROM tickets WHERE id = ?")
        .bind(Uuid::parse_str(&staff_ticket_id)?)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, "OPEN", "denied PATCH must not mutate the store");

    // the officer can
    let resp = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/tickets/{staff_ticket_id}"),
            &officer,
            Some(json!({ "status": "IN_PROGRESS", "resolution": "Swapping the cable" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await?;
    assert_eq!(updated["status"], json!("IN_PROGRESS"));
    assert_eq!(updated["resolution"], json!("Swapping the cable"));

    Ok(())
}

#[tokio::test]
async fn asset_and_maintenance_role_gates() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    insert_user(&pool, "staff@trackr.gov", Role::Staff).await?;
    insert_user(&pool, "officer@trackr.gov", Role::ItOfficer).await?;
    insert_user(&pool, "admin@trackr.gov", Role::Admin).await?;
    let staff = login(&app, "staff@trackr.gov").await?;
    let officer = login(&app, "officer@trackr.gov").await?;
    let admin = login(&app, "admin@trackr.gov").await?;

    let new_asset = json!({
        "assetTag": "ASSET-100",
        "assetType": "LAPTOP",
        "department": "Finance",
        "serialNumber": "SN-100",
        "cpu": "Ryzen 7"
    });

    // staff cannot create assets
    let resp = app
        .clone()
        .oneshot(request("POST", "/api/assets", &staff, Some(new_asset.clone()))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM assets").fetch_one(&pool).await?;
    assert_eq!(count, 0);

    // the officer can
    let resp = app
        .clone()
        .oneshot(request("POST", "/api/assets", &officer, Some(new_asset))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let asset = json_body(resp).await?;
    let asset_id = asset["id"].as_str().context("asset id")?.to_string();

    // staff still gets the read-only view
    let resp = app.clone().oneshot(request("GET", "/api/assets", &staff, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let listing = json_body(resp).await?;
    assert_eq!(listing.as_array().map(Vec::len), Some(1));
    assert_eq!(listing[0]["assetTag"], json!("ASSET-100"));
    assert_eq!(listing[0]["ticketCount"], json!(0));

    // update is officer territory too
    let resp = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/assets/{asset_id}"),
            &staff,
            Some(json!({ "ram": "64GB" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/assets/{asset_id}"),
            &officer,
            Some(json!({ "ram": "64GB" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // deletion is admin-only: the officer is turned away
    let resp = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/assets/{asset_id}"), &officer, None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/assets/{asset_id}"), &admin, None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // maintenance is gated to officer/admin for both read and write
    let resp = app.clone().oneshot(request("GET", "/api/maintenance", &staff, None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.clone().oneshot(request("GET", "/api/maintenance", &officer, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/maintenance",
            &staff,
            Some(json!({ "assetId": asset_id, "action": "Check", "description": "Routine" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn dashboard_sections_follow_the_role() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    insert_user(&pool, "staff@trackr.gov", Role::Staff).await?;
    insert_user(&pool, "officer@trackr.gov", Role::ItOfficer).await?;
    let staff = login(&app, "staff@trackr.gov").await?;
    let officer = login(&app, "officer@trackr.gov").await?;

    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/tickets",
            &staff,
            Some(json!({ "title": "Slow laptop", "description": "Takes minutes to boot" })),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // the officer view carries fleet-wide sections
    let resp = app.clone().oneshot(request("GET", "/api/dashboard", &officer, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["activeTickets"], json!(1));
    assert_eq!(body["totalAssets"], json!(0));
    assert!(body.get("pendingRepairs").is_some());

    // the staff view never includes them
    let resp = app.clone().oneshot(request("GET", "/api/dashboard", &staff, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["activeTickets"], json!(1));
    assert!(body.get("totalAssets").is_none());
    assert!(body.get("pendingRepairs").is_none());

    Ok(())
}
