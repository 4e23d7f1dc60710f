pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;
use tracing::{info, warn};

use services::{AvailabilityFetcher, LocalLogSource, SeatLayout, SeatSessions, TicketsApiSource};
use store::{BookingStore, MemoryBookingStore, RedisBookingStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<dyn BookingStore>,
    pub sessions: Arc<SeatSessions>,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let store: Arc<dyn BookingStore> = match &config.redis.url {
            Some(url) => Arc::new(
                RedisBookingStore::connect(url, config.redis.current_booking_ttl_seconds).await?,
            ),
            None => {
                warn!("REDIS_URL not set, booking log is kept in memory");
                Arc::new(MemoryBookingStore::new())
            }
        };

        let tickets_api = TicketsApiSource::from_config(&config.api, &config.circuit_breaker)?;
        info!("Ticket service at {}", config.api.base_url);

        let fetcher = Arc::new(AvailabilityFetcher::new(
            Arc::new(tickets_api),
            Arc::new(LocalLogSource::new(store.clone())),
        ));

        Ok(Self::with_parts(config, store, fetcher))
    }

    /// Собирает состояние из готовых частей.
    pub fn with_parts(
        config: config::Config,
        store: Arc<dyn BookingStore>,
        fetcher: Arc<AvailabilityFetcher>,
    ) -> Arc<Self> {
        let sessions = Arc::new(SeatSessions::new(
            fetcher,
            config.seating.clone(),
            SeatLayout::default(),
        ));

        Arc::new(Self {
            config,
            store,
            sessions,
        })
    }
}
