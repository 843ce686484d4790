pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
    storage::uploads::UPLOADS_URL_PREFIX,
};
use state::AppState;

/// Files accepted in a single multipart upload request, at the per-file size limit.
const MAX_FILES_PER_UPLOAD: usize = 10;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let uploads_dir = service_context.upload_store.root().to_path_buf();
    let upload_limit = settings.storage.max_file_size_mb * 1024 * 1024 * MAX_FILES_PER_UPLOAD;
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/api", api_routes(app_state.clone(), upload_limit))
        .nest("/admin", admin_routes(app_state.clone()))
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(uploads_dir))
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth))
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

fn api_routes(state: AppState, upload_limit: usize) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/bookings",
            get(handlers::bookings::list_mine).post(handlers::bookings::create),
        )
        .route(
            "/uploads",
            post(handlers::uploads::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/:file", delete(handlers::uploads::delete))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    Router::new()
        .route("/packages", get(handlers::packages::list))
        .route("/bookings/quote", post(handlers::bookings::quote))
        // Gateway callbacks and post-checkout verification carry no session.
        .route("/payments/verify", post(handlers::payments::verify))
        .route(
            "/payments/webhook/paystack",
            post(handlers::payments::paystack_webhook),
        )
        .merge(protected)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route("/bookings", get(handlers::admin::list_bookings))
        .route("/bookings/:id", get(handlers::admin::get_booking))
        .route("/bookings/:id/status", put(handlers::admin::update_booking_status))
        .route("/bookings/:id/confirm", post(handlers::admin::confirm_booking))
        .route("/payments", get(handlers::admin::list_payments))
        .route("/transfers/banks", get(handlers::transfers::list_banks))
        .route(
            "/transfers/recipients",
            get(handlers::transfers::list_recipients).post(handlers::transfers::create_recipient),
        )
        .route(
            "/transfers",
            get(handlers::transfers::list_transfers).post(handlers::transfers::initiate),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_admin))
}
