//! Состояние одного экрана выбора мест.
//!
//! `SeatSession` живёт от входа на экран до выхода с него. Клики пользователя
//! (см. `selection.rs`) и результаты опроса доступности (см. `reconciler.rs`)
//! меняют одно и то же состояние под одной блокировкой, поэтому слияние всегда
//! видит актуальный выбор, а не устаревшую копию.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::SeatingConfig;
use crate::error::SeatError;
use crate::models::{Seat, SeatId, ShowtimeKey};
use crate::services::availability::AvailabilitySource;
use crate::services::grid::{build_grid, SeatLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Часть выбранных мест выкупили другие. Висит до следующего клика или повтора.
    SeatConflict,
    /// Попытка выбрать больше максимума. Исчезает сама.
    SelectionLimit,
    /// Ключ сеанса неполный - экран нужно закрыть.
    IncompleteShowtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notice {
    pub fn sticky(kind: NoticeKind, error: &SeatError) -> Self {
        Self {
            kind,
            message: error.to_string(),
            expires_at: None,
        }
    }

    pub fn transient(kind: NoticeKind, error: &SeatError, expires_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: error.to_string(),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug)]
pub struct SeatSession {
    pub(crate) id: Uuid,
    pub(crate) showtime: ShowtimeKey,
    pub(crate) movie_title: Option<String>,
    pub(crate) layout: SeatLayout,
    pub(crate) rules: SeatingConfig,
    pub(crate) seats: Vec<Seat>,
    pub(crate) selection: Vec<SeatId>,
    pub(crate) booked: HashSet<SeatId>,
    pub(crate) notice: Option<Notice>,
    pub(crate) last_updated: Option<DateTime<Utc>>,
    pub(crate) last_source: Option<AvailabilitySource>,
    pub(crate) closed: bool,
    pub(crate) redirect_to_catalog: bool,
}

/// Снимок экрана для клиента.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMapView {
    pub session_id: Uuid,
    pub showtime: ShowtimeKey,
    pub movie_title: Option<String>,
    pub seats: Vec<Seat>,
    pub selected_seats: Vec<SeatId>,
    pub max_seats: usize,
    pub max_reached: bool,
    pub ticket_price_minor: i64,
    pub total_price_minor: i64,
    pub notice: Option<Notice>,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: Option<AvailabilitySource>,
    pub redirect_to_catalog: bool,
}

impl SeatSession {
    /// Новый экран: занятых мест ещё нет, выбор пуст.
    pub fn new(
        showtime: ShowtimeKey,
        movie_title: Option<String>,
        layout: SeatLayout,
        rules: SeatingConfig,
    ) -> Self {
        let seats = build_grid(&layout, &HashSet::new(), &Vec::new());
        Self {
            id: Uuid::new_v4(),
            showtime,
            movie_title,
            layout,
            rules,
            seats,
            selection: Vec::new(),
            booked: HashSet::new(),
            notice: None,
            last_updated: None,
            last_source: None,
            closed: false,
            redirect_to_catalog: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn showtime(&self) -> &ShowtimeKey {
        &self.showtime
    }

    pub fn movie_title(&self) -> Option<&str> {
        self.movie_title.as_deref()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn selection(&self) -> &[SeatId] {
        &self.selection
    }

    pub fn booked(&self) -> &HashSet<SeatId> {
        &self.booked
    }

    pub fn rules(&self) -> &SeatingConfig {
        &self.rules
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn total_price_minor(&self) -> i64 {
        self.selection.len() as i64 * self.rules.ticket_price_minor
    }

    /// Активное уведомление. Просроченное удаляется при чтении.
    pub fn active_notice(&mut self, now: DateTime<Utc>) -> Option<&Notice> {
        if self.notice.as_ref().is_some_and(|notice| notice.is_expired(now)) {
            self.notice = None;
        }
        self.notice.as_ref()
    }

    /// Снимает уведомление о конфликте. Вызывается на клик и на явный повтор.
    pub fn dismiss_conflict(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.kind == NoticeKind::SeatConflict)
        {
            self.notice = None;
        }
    }

    /// Явный повтор запроса пользователем.
    pub fn retry(&mut self) {
        self.dismiss_conflict();
    }

    pub(crate) fn raise_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub(crate) fn notice_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = Duration::from_std(self.rules.notice_ttl()).unwrap_or_else(|_| Duration::seconds(3));
        now + ttl
    }

    pub(crate) fn rebuild_grid(&mut self) {
        self.seats = build_grid(&self.layout, &self.booked, &self.selection);
    }

    /// Ключ сеанса оказался неполным: дальше опрашивать бессмысленно.
    pub fn mark_incomplete(&mut self, error: &SeatError) {
        self.redirect_to_catalog = true;
        self.notice = Some(Notice::sticky(NoticeKind::IncompleteShowtime, error));
    }

    /// Выход с экрана. Ответы опроса, пришедшие после этого, отбрасываются.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn snapshot(&mut self, now: DateTime<Utc>) -> SeatMapView {
        let notice = self.active_notice(now).cloned();
        SeatMapView {
            session_id: self.id,
            showtime: self.showtime.clone(),
            movie_title: self.movie_title.clone(),
            seats: self.seats.clone(),
            selected_seats: self.selection.clone(),
            max_seats: self.rules.max_seats,
            max_reached: self.selection.len() >= self.rules.max_seats,
            ticket_price_minor: self.rules.ticket_price_minor,
            total_price_minor: self.total_price_minor(),
            notice,
            last_updated: self.last_updated,
            source: self.last_source,
            redirect_to_catalog: self.redirect_to_catalog,
        }
    }
}
