use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SeatId, ShowtimeKey};

/// Запись о проданных билетах, как её отдаёт внешний API `/api/tickets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub movie_id: String,
    pub theater_name: String,
    #[serde(default)]
    pub screen: Option<String>,
    #[serde(default)]
    pub seats: Vec<SeatId>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Конверт ответа внешнего API.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketsResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<TicketRecord>,
}

/// Запись локального журнала бронирований. Используется, когда внешний API недоступен.
/// Поля в camelCase - формат журнала, который пишет клиентская часть.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBookingRecord {
    pub movie_id: String,
    #[serde(default)]
    pub movie_title: Option<String>,
    pub theater_name: String,
    #[serde(default)]
    pub theater_screen: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub selected_seats: Vec<SeatId>,
    #[serde(default)]
    pub booking_time: Option<DateTime<Utc>>,
}

/// Текущая бронь, которую шаг выбора мест передаёт шагу оплаты.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentBooking {
    pub booking_id: Uuid,
    pub showtime: ShowtimeKey,
    pub movie_title: Option<String>,
    pub selected_seats: Vec<SeatId>,
    pub ticket_price_minor: i64,
    pub total_price_minor: i64,
    pub booking_time: DateTime<Utc>,
}

/// Итог к оплате: билеты плюс сервисный сбор за каждое место.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub seats: usize,
    pub subtotal_minor: i64,
    pub service_fee_minor: i64,
    pub total_minor: i64,
}

impl CurrentBooking {
    pub fn payment_summary(&self, service_fee_per_seat_minor: i64) -> PaymentSummary {
        let seats = self.selected_seats.len();
        let service_fee_minor = seats as i64 * service_fee_per_seat_minor;
        PaymentSummary {
            seats,
            subtotal_minor: self.total_price_minor,
            service_fee_minor,
            total_minor: self.total_price_minor + service_fee_minor,
        }
    }
}
