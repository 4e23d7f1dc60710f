use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SeatError;
use crate::models::SeatId;
use crate::services::availability::{AvailabilitySource, BookedSeats};
use crate::services::session::{Notice, NoticeKind, SeatSession};

/// Результат слияния свежих данных о занятости с экраном.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ReconcileOutcome {
    /// Данные применены. `evicted` - места, снятые из выбора из-за конфликта.
    Applied { evicted: Vec<SeatId> },
    /// Ни один источник не ответил - остаёмся на последних известных данных.
    Stale,
    /// Экран уже закрыт, ответ отброшен.
    Discarded,
}

impl SeatSession {
    /// Сливает свежий набор занятых мест с текущим выбором пользователя.
    ///
    /// Конфликтующие места удаляются из выбора с сохранением порядка остальных,
    /// пользователю показывается уведомление. Не затронутый выбор не трогается.
    pub fn apply_fetch(&mut self, fresh: BookedSeats, now: DateTime<Utc>) -> ReconcileOutcome {
        if self.closed {
            debug!("Session {} closed, discarding availability update", self.id);
            return ReconcileOutcome::Discarded;
        }
        if fresh.source == AvailabilitySource::Unavailable {
            warn!(
                "No availability source answered for session {}, keeping last known state",
                self.id
            );
            return ReconcileOutcome::Stale;
        }

        let evicted: Vec<SeatId> = self
            .selection
            .iter()
            .filter(|id| fresh.seats.contains(*id))
            .cloned()
            .collect();

        if !evicted.is_empty() {
            self.selection.retain(|id| !fresh.seats.contains(id));
            let error = SeatError::SeatConflict {
                seats: evicted.clone(),
            };
            self.raise_notice(Notice::sticky(NoticeKind::SeatConflict, &error));
            info!(
                "Session {}: {} selected seat(s) booked by others: {:?}",
                self.id,
                evicted.len(),
                evicted
            );
        }

        self.booked = fresh.seats;
        self.rebuild_grid();
        self.last_updated = Some(now);
        self.last_source = Some(fresh.source);

        ReconcileOutcome::Applied { evicted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatStatus;
    use crate::services::session::tests::{session, status_of};
    use std::collections::HashSet;

    fn booked(ids: &[&str]) -> BookedSeats {
        BookedSeats {
            seats: ids.iter().map(|id| SeatId::from(*id)).collect(),
            source: AvailabilitySource::TicketsApi,
        }
    }

    fn selection(session: &SeatSession) -> Vec<&str> {
        session.selection().iter().map(SeatId::as_str).collect()
    }

    #[test]
    fn conflict_evicts_only_taken_seats() {
        let mut session = session();
        let now = Utc::now();
        session.toggle_seat(&"A1".into(), now).unwrap();
        session.toggle_seat(&"A2".into(), now).unwrap();

        let outcome = session.apply_fetch(booked(&["A2"]), now);

        assert_eq!(outcome, ReconcileOutcome::Applied { evicted: vec!["A2".into()] });
        assert_eq!(selection(&session), vec!["A1"]);
        assert_eq!(status_of(&session, "A1"), Some(SeatStatus::Selected));
        assert_eq!(status_of(&session, "A2"), Some(SeatStatus::Unavailable));
        assert_eq!(status_of(&session, "A3"), Some(SeatStatus::Available));
        let notice = session.active_notice(now).cloned().unwrap();
        assert_eq!(notice.kind, NoticeKind::SeatConflict);
        assert!(notice.expires_at.is_none());
    }

    #[test]
    fn empty_fetch_keeps_selection() {
        let mut session = session();
        let now = Utc::now();
        session.toggle_seat(&"B5".into(), now).unwrap();

        let outcome = session.apply_fetch(booked(&[]), now);

        assert_eq!(outcome, ReconcileOutcome::Applied { evicted: vec![] });
        assert_eq!(selection(&session), vec!["B5"]);
        assert_eq!(status_of(&session, "B5"), Some(SeatStatus::Selected));
        assert!(session.active_notice(now).is_none());
        assert_eq!(session.last_updated(), Some(now));
    }

    #[test]
    fn eviction_preserves_order_of_remaining_seats() {
        let mut session = session();
        let now = Utc::now();
        for id in ["E1", "E2", "E3", "E5", "E6"] {
            session.toggle_seat(&id.into(), now).unwrap();
        }

        session.apply_fetch(booked(&["E2", "E5", "G7"]), now);

        assert_eq!(selection(&session), vec!["E1", "E3", "E6"]);
    }

    #[test]
    fn evicted_seat_never_comes_back_on_its_own() {
        let mut session = session();
        let now = Utc::now();
        session.toggle_seat(&"C7".into(), now).unwrap();
        session.apply_fetch(booked(&["C7"]), now);
        session.apply_fetch(booked(&[]), now);

        assert!(session.selection().is_empty());
        assert_eq!(status_of(&session, "C7"), Some(SeatStatus::Available));
    }

    #[test]
    fn selection_and_booked_are_disjoint_after_merge() {
        let mut session = session();
        let now = Utc::now();
        for id in ["A1", "B2", "C3", "D5"] {
            session.toggle_seat(&id.into(), now).unwrap();
        }

        session.apply_fetch(booked(&["B2", "D5", "H12"]), now);

        let chosen: HashSet<&SeatId> = session.selection().iter().collect();
        assert!(session.booked().iter().all(|id| !chosen.contains(id)));
    }

    #[test]
    fn closed_session_discards_updates() {
        let mut session = session();
        session.close();

        let outcome = session.apply_fetch(booked(&["A1"]), Utc::now());

        assert_eq!(outcome, ReconcileOutcome::Discarded);
        assert!(session.booked().is_empty());
        assert!(session.last_updated().is_none());
    }

    #[test]
    fn unanswered_fetch_keeps_last_known_bookings() {
        let mut session = session();
        let now = Utc::now();
        session.apply_fetch(booked(&["F6"]), now);

        let outcome = session.apply_fetch(
            BookedSeats {
                seats: HashSet::new(),
                source: AvailabilitySource::Unavailable,
            },
            now + chrono::Duration::seconds(30),
        );

        assert_eq!(outcome, ReconcileOutcome::Stale);
        assert_eq!(status_of(&session, "F6"), Some(SeatStatus::Unavailable));
        assert_eq!(session.last_updated(), Some(now));
    }
}
