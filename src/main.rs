use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studiobook::{
    api,
    config::Settings,
    payments::{PaymentGateway, PaystackClient},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studiobook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Studiobook server on {}:{}", settings.server.host, settings.server.port);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let gateway: Option<Arc<dyn PaymentGateway>> = if settings.paystack.enabled {
        match settings.paystack.secret_key.clone() {
            Some(secret_key) => {
                tracing::info!("Paystack payments enabled");
                Some(Arc::new(PaystackClient::new(secret_key, &settings.paystack)))
            }
            None => {
                tracing::warn!("Paystack enabled but no secret key configured; falling back to manual payment");
                None
            }
        }
    } else {
        tracing::info!("Paystack disabled; bookings will await manual payment");
        None
    };

    let service_context = Arc::new(ServiceContext::new(db_pool, gateway, &settings));

    let removed = service_context.auth_service.cleanup_expired_sessions().await?;
    if removed > 0 {
        tracing::debug!("Removed {} expired sessions", removed);
    }

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app = api::create_app(service_context, Arc::new(settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
