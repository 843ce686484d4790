use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Studiobook API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Booking and payments backend for a photography studio",
        "endpoints": {
            "health": "/health",
            "auth": "/auth",
            "api": "/api",
            "admin": "/admin"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1")
        .execute(&state.service_context.db_pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    let (status, health) = if database == "ok" {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": health,
            "database": database,
            "payment_gateway": state.service_context.gateway.is_some(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
