use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::{Role, User},
    error::{AppError, Result},
};

#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolve the session cookie to a user and their highest role.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> Result<Option<CurrentUser>> {
    let Some(session_cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let ctx = &state.service_context;
    let Some(session) = ctx.auth_service.validate_session(session_cookie.value()).await? else {
        return Ok(None);
    };

    let Some(user) = ctx.user_repo.find_by_id(session.user_id).await? else {
        return Ok(None);
    };

    let roles = ctx.user_repo.roles(user.id).await?;
    Ok(Some(CurrentUser {
        user,
        role: Role::highest(&roles),
    }))
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = current_user(&state, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = current_user(&state, &jar)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        tracing::warn!("User {} denied admin access", user.user.email);
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
