use chrono::Duration as ChronoDuration;
use hirepath_platform_access::{CallbackFlow, Origin};
use hirepath_server::{
    auth::{AppState, OAuthIdentityProvider, RequestOriginResolver, RestAccountDirectory},
    config::ServerConfig,
    create_app,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        environment = ?config.redirect.environment(),
        allowed_forwarded_hosts = config.redirect.allowed_forwarded_hosts().len(),
        "Loaded configuration"
    );

    let public_origin = Origin::parse(&config.public_origin).expect("invalid PUBLIC_ORIGIN");

    let identity_client = Arc::new(
        OAuthIdentityProvider::new(
            &config.identity,
            ChronoDuration::minutes(config.session.duration_minutes),
        )
        .expect("failed to create identity provider client"),
    );
    let directory =
        Arc::new(RestAccountDirectory::new(&config.directory).expect("failed to create directory client"));

    let callback_flow = CallbackFlow::new(identity_client.clone(), directory, config.redirect);

    let app_state = Arc::new(AppState::new(
        callback_flow,
        identity_client,
        RequestOriginResolver::new(config.request_scheme, public_origin),
        config.session,
    ));

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
