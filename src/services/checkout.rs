//! Передача выбора мест на шаг оплаты.

use chrono::{DateTime, Datelike, Local, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SeatError, SeatResult};
use crate::middleware::SessionContext;
use crate::models::showtime::{normalize_date, normalize_time};
use crate::models::{CurrentBooking, LocalBookingRecord, SeatId};
use crate::services::session::{Notice, NoticeKind, SeatSession};
use crate::store::BookingStore;

impl SeatSession {
    /// Проверяет, можно ли переходить к оплате, и собирает текущую бронь.
    pub fn prepare_booking(&mut self, ctx: &SessionContext, now: DateTime<Utc>) -> SeatResult<CurrentBooking> {
        if self.selection.is_empty() {
            return Err(SeatError::EmptySelection);
        }
        if !ctx.logged_in() {
            return Err(SeatError::LoginRequired);
        }

        let taken: Vec<SeatId> = self
            .selection
            .iter()
            .filter(|id| self.booked.contains(*id))
            .cloned()
            .collect();
        if !taken.is_empty() {
            let error = SeatError::SeatConflict { seats: taken };
            self.raise_notice(Notice::sticky(NoticeKind::SeatConflict, &error));
            return Err(error);
        }

        Ok(CurrentBooking {
            booking_id: Uuid::new_v4(),
            showtime: self.showtime.clone(),
            movie_title: self.movie_title.clone(),
            selected_seats: self.selection.clone(),
            ticket_price_minor: self.rules.ticket_price_minor,
            total_price_minor: self.total_price_minor(),
            booking_time: now,
        })
    }
}

/// Запись для локального журнала: дата и время в нормализованном виде.
pub fn journal_record(booking: &CurrentBooking, reference_year: i32) -> LocalBookingRecord {
    LocalBookingRecord {
        movie_id: booking.showtime.movie_id.clone(),
        movie_title: booking.movie_title.clone(),
        theater_name: booking.showtime.theater_name.clone(),
        theater_screen: booking.showtime.screen.clone(),
        date: normalize_date(&booking.showtime.date, reference_year),
        time: normalize_time(&booking.showtime.time),
        selected_seats: booking.selected_seats.clone(),
        booking_time: Some(booking.booking_time),
    }
}

/// Сохраняет текущую бронь для шага оплаты и дописывает её в журнал.
///
/// Повторная передача тех же мест той же сессии возвращает уже сохранённую
/// бронь и журнал не трогает.
pub async fn proceed_to_payment(
    session_id: Uuid,
    booking: CurrentBooking,
    store: &dyn BookingStore,
) -> SeatResult<CurrentBooking> {
    if let Some(existing) = store.load_current_booking(session_id).await? {
        if existing.showtime == booking.showtime && existing.selected_seats == booking.selected_seats {
            debug!(
                "Session {} already handed off as booking {}",
                session_id, existing.booking_id
            );
            return Ok(existing);
        }
    }

    store.save_current_booking(session_id, &booking).await?;

    let record = journal_record(&booking, Local::now().year());
    store.append_booking(&record).await?;

    info!(
        "Session {} handed {} seat(s) to payment, booking {}",
        session_id,
        booking.selected_seats.len(),
        booking.booking_id
    );
    Ok(booking)
}
