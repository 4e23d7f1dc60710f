//! Периодический опрос занятости мест.
//!
//! Задача стартует при входе на экран: первый запрос - сразу, дальше каждые
//! `refresh_interval`. При выходе вызывается `RefreshHandle::cancel`, и ответ,
//! пришедший после отмены, отбрасывается.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{SeatError, SeatResult};
use crate::middleware::SessionContext;
use crate::services::availability::AvailabilityFetcher;
use crate::services::reconciler::ReconcileOutcome;
use crate::services::session::SeatSession;

/// Один цикл "запросить и слить".
///
/// Запрос выполняется без блокировки сессии, поэтому клики во время запроса
/// принимаются. Слияние берёт блокировку и работает с текущим выбором.
pub async fn refresh_once(
    session: &Mutex<SeatSession>,
    fetcher: &AvailabilityFetcher,
    ctx: &SessionContext,
) -> SeatResult<ReconcileOutcome> {
    let key = session.lock().await.showtime().clone();

    match fetcher.fetch_booked(&key, ctx.token()).await {
        Ok(booked) => Ok(session.lock().await.apply_fetch(booked, Utc::now())),
        Err(e) => {
            if matches!(e, SeatError::IncompleteShowtimeKey { .. }) {
                session.lock().await.mark_incomplete(&e);
            }
            Err(e)
        }
    }
}

/// Токен отмены фоновой задачи опроса.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Отменяет задачу и дожидается её завершения.
    pub async fn shutdown(&mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn spawn_refresh(
    session: Arc<Mutex<SeatSession>>,
    fetcher: Arc<AvailabilityFetcher>,
    ctx: SessionContext,
    period: Duration,
) -> RefreshHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Первый tick срабатывает сразу
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown_rx.borrow() {
                break;
            }

            let cycle = tokio::select! {
                result = refresh_once(&session, &fetcher, &ctx) => result,
                _ = shutdown_rx.changed() => {
                    debug!("Refresh cancelled mid-flight, discarding response");
                    break;
                }
            };

            match cycle {
                Ok(ReconcileOutcome::Discarded) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Stopping seat refresh: {}", e);
                    break;
                }
            }
        }

        info!("Seat refresh task stopped");
    });

    RefreshHandle {
        shutdown: shutdown_tx,
        task: Some(task),
    }
}
