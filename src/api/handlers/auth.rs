use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::{AuthService, SESSION_COOKIE},
    domain::{CreateUserRequest, Role, User},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub role: Role,
    pub message: String,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let email = request.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }

    if request.password.len() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".to_string()));
    }

    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::BadRequest("Full name is required".to_string()));
    }

    let ctx = &state.service_context;
    let password_hash = AuthService::hash_password(&request.password)?;
    let user = ctx.user_repo.create(&email, full_name, &password_hash).await?;
    ctx.user_repo.grant_role(user.id, Role::User).await?;

    let (session, token) = ctx.auth_service.create_session(user.id).await?;
    let cookie = ctx.auth_service.create_session_cookie(&token);

    tracing::info!("New account {} (session {})", user.email, session.id);

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(AuthResponse {
            user,
            role: Role::User,
            message: "Account created".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let ctx = &state.service_context;
    let email = req.email.trim().to_lowercase();

    let password_hash = ctx
        .user_repo
        .password_hash(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !AuthService::verify_password(&req.password, &password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let user = ctx
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let role = Role::highest(&ctx.user_repo.roles(user.id).await?);

    let (session, token) = ctx.auth_service.create_session(user.id).await?;
    let cookie = ctx.auth_service.create_session_cookie(&token);
    tracing::debug!(
        "Session {} for {} expires {}",
        session.id,
        user.email,
        session.expires_at
    );

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            user,
            role,
            message: "Login successful".to_string(),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        // Logging out with a stale cookie should still clear it.
        if let Err(e) = state
            .service_context
            .auth_service
            .invalidate_session(session_cookie.value())
            .await
        {
            tracing::warn!("Failed to invalidate session: {}", e);
        }
    }

    Ok((
        jar.add(AuthService::create_logout_cookie()),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<AuthResponse> {
    Json(AuthResponse {
        user: current.user,
        role: current.role,
        message: "Authenticated".to_string(),
    })
}
