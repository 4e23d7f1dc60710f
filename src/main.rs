use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_seats::{config::Config, controllers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    // В production логи в JSON для сборщика
    if config.app.environment == "production" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting cinema seats API ({})", config.app.environment);

    // Хранилище, клиент билетов и реестр сессий
    let app_state = AppState::new(config.clone())
        .await
        .map_err(|e| anyhow::anyhow!("failed to initialize application state: {e}"))?;
    info!("Application state ready");

    // --- Background tasks ---

    // Закрываем экраны, брошенные без DELETE, раз в минуту
    let sessions = app_state.sessions.clone();
    let idle_ttl = config.seating.session_idle_ttl();
    task::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let reaped = sessions.reap_idle(idle_ttl).await;
            if reaped > 0 {
                info!("Reaped {} idle seat session(s)", reaped);
            }
        }
    });

    let app = controllers::app(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await?;

    Ok(())
}

// Останавливает опрос во всех открытых сессиях
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down, closing {} seat session(s)", state.sessions.len().await);
    state.sessions.close_all().await;
}
