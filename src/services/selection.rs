use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{SeatError, SeatResult};
use crate::models::{SeatId, SeatStatus};
use crate::services::session::{Notice, NoticeKind, SeatSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// Клик по занятому месту ничего не меняет.
    Ignored,
}

impl SeatSession {
    /// Применяет один клик пользователя.
    ///
    /// Выбор упорядочен по времени клика и ограничен `max_seats`. После любого
    /// клика сетка перестраивается сразу, не дожидаясь следующего опроса.
    pub fn toggle_seat(&mut self, seat_id: &SeatId, now: DateTime<Utc>) -> SeatResult<ToggleOutcome> {
        // Любой клик снимает уведомление о конфликте
        self.dismiss_conflict();

        let status = self
            .seats
            .iter()
            .find(|seat| &seat.id == seat_id)
            .map(|seat| seat.status)
            .ok_or_else(|| SeatError::UnknownSeat(seat_id.clone()))?;

        let outcome = match status {
            SeatStatus::Unavailable => {
                debug!("Ignoring click on booked seat {}", seat_id);
                return Ok(ToggleOutcome::Ignored);
            }
            SeatStatus::Selected => {
                self.selection.retain(|id| id != seat_id);
                ToggleOutcome::Deselected
            }
            SeatStatus::Available => {
                if self.selection.len() >= self.rules.max_seats {
                    let error = SeatError::SelectionLimitExceeded {
                        max: self.rules.max_seats,
                    };
                    let deadline = self.notice_deadline(now);
                    self.raise_notice(Notice::transient(NoticeKind::SelectionLimit, &error, deadline));
                    return Err(error);
                }
                self.selection.push(seat_id.clone());
                ToggleOutcome::Selected
            }
        };

        self.rebuild_grid();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::tests::{session, status_of};

    #[test]
    fn click_selects_then_deselects() {
        let mut session = session();
        let now = Utc::now();

        assert_eq!(session.toggle_seat(&"B5".into(), now), Ok(ToggleOutcome::Selected));
        assert_eq!(status_of(&session, "B5"), Some(SeatStatus::Selected));

        assert_eq!(session.toggle_seat(&"B5".into(), now), Ok(ToggleOutcome::Deselected));
        assert_eq!(status_of(&session, "B5"), Some(SeatStatus::Available));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn selection_keeps_click_order() {
        let mut session = session();
        let now = Utc::now();
        for id in ["C7", "A1", "H12", "A2"] {
            session.toggle_seat(&id.into(), now).unwrap();
        }
        session.toggle_seat(&"A1".into(), now).unwrap();

        let order: Vec<&str> = session.selection().iter().map(SeatId::as_str).collect();
        assert_eq!(order, vec!["C7", "H12", "A2"]);
    }

    #[test]
    fn booked_seat_click_is_a_no_op() {
        let mut session = session();
        session.booked.insert("D3".into());
        session.rebuild_grid();

        let outcome = session.toggle_seat(&"D3".into(), Utc::now());
        assert_eq!(outcome, Ok(ToggleOutcome::Ignored));
        assert!(session.selection().is_empty());
        assert_eq!(status_of(&session, "D3"), Some(SeatStatus::Unavailable));
    }

    #[test]
    fn eleventh_seat_is_rejected() {
        let mut session = session();
        let now = Utc::now();
        let ids = ["A1", "A2", "A3", "A5", "A6", "A7", "A8", "A10", "A11", "A12"];
        for id in ids {
            assert_eq!(session.toggle_seat(&id.into(), now), Ok(ToggleOutcome::Selected));
        }
        assert_eq!(session.selection().len(), 10);

        let rejected = session.toggle_seat(&"B1".into(), now);
        assert_eq!(rejected, Err(SeatError::SelectionLimitExceeded { max: 10 }));
        assert_eq!(session.selection().len(), 10);
        assert_eq!(status_of(&session, "B1"), Some(SeatStatus::Available));

        let notice = session.active_notice(now).cloned().unwrap();
        assert_eq!(notice.kind, NoticeKind::SelectionLimit);
        assert!(notice.expires_at.is_some());
        assert!(session.active_notice(now + chrono::Duration::seconds(3)).is_none());

        // Снять одно место и выбрать другое - можно
        session.toggle_seat(&"A1".into(), now).unwrap();
        assert_eq!(session.toggle_seat(&"B1".into(), now), Ok(ToggleOutcome::Selected));
    }

    #[test]
    fn unknown_seat_leaves_state_untouched() {
        let mut session = session();
        let before = session.seats().to_vec();

        let result = session.toggle_seat(&"A4".into(), Utc::now());
        assert_eq!(result, Err(SeatError::UnknownSeat("A4".into())));
        assert_eq!(session.seats(), before.as_slice());
    }

    #[test]
    fn click_dismisses_conflict_notice() {
        let mut session = session();
        let conflict = SeatError::SeatConflict { seats: vec!["A1".into()] };
        session.raise_notice(Notice::sticky(NoticeKind::SeatConflict, &conflict));

        session.toggle_seat(&"A2".into(), Utc::now()).unwrap();
        assert!(session.active_notice(Utc::now()).is_none());
    }
}
