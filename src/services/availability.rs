//! Получение занятых мест для сеанса.
//!
//! Две взаимозаменяемые стратегии за одним трейтом `BookedSeatSource`:
//! 1.  **TicketsApiSource** - внешний API билетов, защищённый `CircuitBreaker`.
//! 2.  **LocalLogSource** - локальный журнал бронирований.
//!
//! `AvailabilityFetcher` сначала спрашивает API и переходит к журналу по
//! результату первой стратегии. Наружу уходит только ошибка неполного ключа.

use chrono::{Datelike, Local};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, CircuitBreakerConfig};
use crate::error::{SeatError, SeatResult};
use crate::models::{SeatId, ShowtimeKey, TicketsResponse};
use crate::services::circuit_breaker::CircuitBreaker;
use crate::store::BookingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilitySource {
    TicketsApi,
    LocalLog,
    /// Ни одна стратегия не ответила.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedSeats {
    pub seats: HashSet<SeatId>,
    pub source: AvailabilitySource,
}

/// Одна стратегия получения занятых мест.
pub trait BookedSeatSource: Send + Sync {
    fn source(&self) -> AvailabilitySource;

    fn booked_seats<'a>(
        &'a self,
        key: &'a ShowtimeKey,
        token: Option<&'a str>,
    ) -> BoxFuture<'a, SeatResult<HashSet<SeatId>>>;
}

/// Клиент внешнего API `GET /api/tickets`.
pub struct TicketsApiSource {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: CircuitBreaker,
}

impl TicketsApiSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration, breaker: CircuitBreaker) -> SeatResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeatError::FetchTransport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: breaker,
        })
    }

    pub fn from_config(api: &ApiConfig, breaker: &CircuitBreakerConfig) -> SeatResult<Self> {
        Self::new(
            api.base_url.clone(),
            Duration::from_secs(api.timeout_seconds),
            CircuitBreaker::from_config(breaker),
        )
    }

    /// Выполняет запрос через Circuit Breaker.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> SeatResult<T>
    where
        F: std::future::Future<Output = Result<T, reqwest::Error>>,
    {
        if !self.circuit_breaker.can_execute() {
            debug!("Circuit breaker is OPEN - skipping ticket service request");
            return Err(SeatError::FetchTransport("circuit breaker is open".to_string()));
        }

        match operation.await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                Err(SeatError::FetchTransport(e.to_string()))
            }
        }
    }

    async fn fetch(&self, key: &ShowtimeKey, token: Option<&str>) -> SeatResult<HashSet<SeatId>> {
        let url = format!("{}/api/tickets", self.base_url);

        let operation = async {
            let mut request = self.http_client.get(&url);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            request
                .send()
                .await?
                .error_for_status()?
                .json::<TicketsResponse>()
                .await
        };

        let response = self.execute_with_circuit_breaker(operation).await?;
        if !response.success {
            return Err(SeatError::FetchTransport(
                "ticket service reported failure".to_string(),
            ));
        }

        let seats: HashSet<SeatId> = response
            .data
            .into_iter()
            .filter(|ticket| key.matches_ticket(ticket))
            .flat_map(|ticket| ticket.seats)
            .collect();
        Ok(seats)
    }
}

impl BookedSeatSource for TicketsApiSource {
    fn source(&self) -> AvailabilitySource {
        AvailabilitySource::TicketsApi
    }

    fn booked_seats<'a>(
        &'a self,
        key: &'a ShowtimeKey,
        token: Option<&'a str>,
    ) -> BoxFuture<'a, SeatResult<HashSet<SeatId>>> {
        self.fetch(key, token).boxed()
    }
}

/// Занятые места из локального журнала бронирований.
pub struct LocalLogSource {
    store: Arc<dyn BookingStore>,
}

impl LocalLogSource {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}

impl BookedSeatSource for LocalLogSource {
    fn source(&self) -> AvailabilitySource {
        AvailabilitySource::LocalLog
    }

    fn booked_seats<'a>(
        &'a self,
        key: &'a ShowtimeKey,
        _token: Option<&'a str>,
    ) -> BoxFuture<'a, SeatResult<HashSet<SeatId>>> {
        async move {
            let reference_year = Local::now().year();
            let bookings = self.store.load_bookings().await?;

            let seats: HashSet<SeatId> = bookings
                .into_iter()
                .filter(|record| key.matches_local(record, reference_year))
                .flat_map(|record| record.selected_seats)
                .collect();
            Ok(seats)
        }
        .boxed()
    }
}

/// Единая точка "узнать занятые места для сеанса".
pub struct AvailabilityFetcher {
    primary: Arc<dyn BookedSeatSource>,
    fallback: Arc<dyn BookedSeatSource>,
}

impl AvailabilityFetcher {
    pub fn new(primary: Arc<dyn BookedSeatSource>, fallback: Arc<dyn BookedSeatSource>) -> Self {
        Self { primary, fallback }
    }

    /// Возвращает занятые места. Ошибка - только при неполном ключе,
    /// в этом случае сеть не трогается.
    pub async fn fetch_booked(&self, key: &ShowtimeKey, token: Option<&str>) -> SeatResult<BookedSeats> {
        key.ensure_complete()?;

        match self.primary.booked_seats(key, token).await {
            Ok(seats) if !seats.is_empty() => {
                debug!(
                    "{:?} returned {} booked seats for movie {}",
                    self.primary.source(),
                    seats.len(),
                    key.movie_id
                );
                return Ok(BookedSeats {
                    seats,
                    source: self.primary.source(),
                });
            }
            // Пустой ответ тоже проверяем по журналу: там могут быть брони,
            // сделанные, пока API был недоступен
            Ok(_) => debug!("No bookings reported for movie {}, consulting local log", key.movie_id),
            Err(e) => warn!("Ticket service fetch failed, falling back to local log: {}", e),
        }

        match self.fallback.booked_seats(key, token).await {
            Ok(seats) => {
                info!(
                    "{:?} returned {} booked seats for movie {}",
                    self.fallback.source(),
                    seats.len(),
                    key.movie_id
                );
                Ok(BookedSeats {
                    seats,
                    source: self.fallback.source(),
                })
            }
            Err(e) => {
                warn!("Local booking log unavailable: {}", e);
                Ok(BookedSeats {
                    seats: HashSet::new(),
                    source: AvailabilitySource::Unavailable,
                })
            }
        }
    }
}
