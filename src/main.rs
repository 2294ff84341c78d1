use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gigbook::config::AppConfig;
use gigbook::db;
use gigbook::handlers;
use gigbook::services::notifications::emailjs::EmailJsProvider;
use gigbook::services::payments::stripe::StripeGateway;
use gigbook::services::reminders;
use gigbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    anyhow::ensure!(
        !config.stripe_secret_key.is_empty(),
        "STRIPE_SECRET_KEY must be set"
    );
    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhook signatures will not be verified");
    }

    let gateway = StripeGateway::new(config.stripe_secret_key.clone());
    let mailer = EmailJsProvider::new(
        config.email_api_url.clone(),
        config.email_service_id.clone(),
        config.email_template_id.clone(),
        config.email_user_id.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        gateway: Box::new(gateway),
        mailer: Box::new(mailer),
    });

    tokio::spawn(reminders::run_reminder_loop(Arc::clone(&state)));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id/pay", post(handlers::bookings::pay_booking))
        .route(
            "/api/create-payment-intent",
            post(handlers::payments::create_payment_intent),
        )
        .route(
            "/api/payment-confirmation",
            post(handlers::payments::confirm_payment),
        )
        .route("/webhook/stripe", post(handlers::webhook::stripe_webhook))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
