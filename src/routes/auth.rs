use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::user::{
    DbUser, LoginRequest, LoginResponse, MeResponse, PublicUser, SignupRequest, SignupResponse,
    SignupUser, User,
};
use crate::policy::Role;
use crate::session::{self, SessionUser};
use crate::utils::{hash_password, is_valid_email, utc_now, verify_password};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let missing = || AppError::bad_request("Missing required fields");
    let name = payload.name.filter(|v| !v.trim().is_empty()).ok_or_else(missing)?;
    let email = payload.email.filter(|v| !v.trim().is_empty()).ok_or_else(missing)?;
    let password = payload.password.filter(|v| !v.is_empty()).ok_or_else(missing)?;
    let role = payload.role.ok_or_else(missing)?;

    // ADMIN accounts are provisioned out-of-band; self-service signup only
    // hands out the two lower tiers.
    let role = Role::parse(&role)
        .filter(|role| Role::SELF_SERVICE.contains(role))
        .ok_or_else(|| AppError::bad_request("Invalid role selected"))?;

    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Invalid email format"));
    }

    // Fast-path duplicate check; the UNIQUE constraint on email is the
    // real guarantee (see the insert below).
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = hash_password(&password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, department, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(&payload.department)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| AppError::conflict_on_unique(err, "Email already registered"))?;

    tracing::info!(user_id = %user_id, role = %role, "user signed up");

    // Signup never authenticates; the caller logs in separately.
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "Account created successfully. Please sign in.".to_string(),
            user: SignupUser {
                id: user_id,
                email,
                name,
                role,
            },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued, cookie set", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
        _ => return Err(AppError::bad_request("Email and password are required")),
    };

    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, department, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    // Unknown email and wrong password must be indistinguishable to the
    // caller.
    let db_user = db_user.ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    if !verify_password(&password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let user: User = db_user.try_into()?;
    let token = state.jwt.encode(user.id, &user.email, user.role)?;
    let cookie = session::auth_cookie(&token, state.jwt.max_age_secs());

    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: PublicUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared"))
)]
pub async fn logout() -> impl IntoResponse {
    // Idempotent: overwrites the cookie with an expired empty value whether
    // or not a session was present.
    (
        [(header::SET_COOKIE, session::logout_cookie())],
        Json(json!({ "success": true })),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session identity", body = MeResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn me(session: SessionUser) -> Json<MeResponse> {
    // Answered from the verified claims alone: a session stays usable for
    // its whole lifetime even if the credential row changed or vanished.
    Json(MeResponse {
        user_id: session.user_id,
        email: session.email,
        role: session.role,
    })
}
