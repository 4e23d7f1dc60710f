use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::config::SeatingConfig;
use crate::error::{SeatError, SeatResult};
use crate::middleware::SessionContext;
use crate::models::ShowtimeKey;
use crate::services::availability::AvailabilityFetcher;
use crate::services::grid::SeatLayout;
use crate::services::refresh::{spawn_refresh, RefreshHandle};
use crate::services::session::SeatSession;

/// Открытый экран выбора мест и его задача опроса.
pub struct SessionEntry {
    pub session: Arc<Mutex<SeatSession>>,
    pub context: SessionContext,
    refresh: Mutex<RefreshHandle>,
    last_seen: std::sync::Mutex<Instant>,
}

impl SessionEntry {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    // Сначала гасим опрос, потом закрываем экран
    async fn stop(&self) {
        self.refresh.lock().await.shutdown().await;
        self.session.lock().await.close();
    }
}

/// Все открытые экраны выбора мест.
pub struct SeatSessions {
    fetcher: Arc<AvailabilityFetcher>,
    rules: SeatingConfig,
    layout: SeatLayout,
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
}

impl SeatSessions {
    pub fn new(fetcher: Arc<AvailabilityFetcher>, rules: SeatingConfig, layout: SeatLayout) -> Self {
        Self {
            fetcher,
            rules,
            layout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &Arc<AvailabilityFetcher> {
        &self.fetcher
    }

    /// Вход на экран: проверка ключа, пустая сетка и запуск опроса.
    pub async fn open(
        &self,
        showtime: ShowtimeKey,
        movie_title: Option<String>,
        context: SessionContext,
    ) -> SeatResult<Arc<SessionEntry>> {
        showtime.ensure_complete()?;

        let session = SeatSession::new(showtime, movie_title, self.layout.clone(), self.rules.clone());
        let id = session.id();
        let session = Arc::new(Mutex::new(session));

        let refresh = spawn_refresh(
            session.clone(),
            self.fetcher.clone(),
            context.clone(),
            self.rules.refresh_interval(),
        );

        let entry = Arc::new(SessionEntry {
            session,
            context,
            refresh: Mutex::new(refresh),
            last_seen: std::sync::Mutex::new(Instant::now()),
        });
        self.sessions.write().await.insert(id, entry.clone());

        info!("Seat session {} opened", id);
        Ok(entry)
    }

    /// Любое обращение к экрану продлевает ему жизнь.
    pub async fn get(&self, id: Uuid) -> SeatResult<Arc<SessionEntry>> {
        let entry = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SeatError::SessionNotFound)?;
        entry.touch();
        Ok(entry)
    }

    /// Выход с экрана: опрос останавливается, поздние ответы отбрасываются.
    pub async fn close(&self, id: Uuid) -> SeatResult<()> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(SeatError::SessionNotFound)?;

        entry.stop().await;

        info!("Seat session {} closed", id);
        Ok(())
    }

    /// Закрывает экраны, к которым не обращались дольше `max_idle`.
    /// Клиент мог уйти, не вызвав DELETE.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<(Uuid, Arc<SessionEntry>)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| entry.idle_for() >= max_idle)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry)))
                .collect()
        };

        for (id, entry) in &expired {
            entry.stop().await;
            info!("Seat session {} expired after inactivity", id);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Закрывает все экраны. Вызывается при остановке сервера.
    pub async fn close_all(&self) {
        let entries: Vec<Arc<SessionEntry>> = self.sessions.write().await.drain().map(|(_, e)| e).collect();
        for entry in entries {
            entry.stop().await;
        }
    }
}
