use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::SeatId;

/// Ошибки выбора мест. Ни одна из них не должна "ронять" сессию:
/// каждая превращается в no-op, исправление модели или уведомление.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    /// Ключ сеанса неполный - сессию нужно закрыть и вернуть пользователя в каталог.
    #[error("Missing booking information: {}", missing.join(", "))]
    IncompleteShowtimeKey { missing: Vec<String> },

    /// Сбой сети или протокола. Восстанавливается через локальный журнал.
    #[error("Ticket service unavailable: {0}")]
    FetchTransport(String),

    #[error("You can select a maximum of {max} seats per booking.")]
    SelectionLimitExceeded { max: usize },

    #[error("Some of your selected seats have been booked by others. Please select different seats.")]
    SeatConflict { seats: Vec<SeatId> },

    #[error("Seat {0} does not exist in this hall")]
    UnknownSeat(SeatId),

    #[error("Select at least one seat to continue")]
    EmptySelection,

    #[error("You need to login to complete your booking.")]
    LoginRequired,

    #[error("Seat selection session not found")]
    SessionNotFound,

    #[error("Booking store error: {0}")]
    Store(String),
}

impl SeatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SeatError::IncompleteShowtimeKey { .. } => StatusCode::BAD_REQUEST,
            SeatError::UnknownSeat(_) => StatusCode::BAD_REQUEST,
            SeatError::FetchTransport(_) => StatusCode::BAD_GATEWAY,
            SeatError::SelectionLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SeatError::EmptySelection => StatusCode::UNPROCESSABLE_ENTITY,
            SeatError::SeatConflict { .. } => StatusCode::CONFLICT,
            SeatError::LoginRequired => StatusCode::UNAUTHORIZED,
            SeatError::SessionNotFound => StatusCode::NOT_FOUND,
            SeatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ApiError {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for SeatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let details = match &self {
            SeatError::SeatConflict { seats } => seats.iter().map(ToString::to_string).collect(),
            SeatError::IncompleteShowtimeKey { missing } => missing.clone(),
            _ => Vec::new(),
        };

        let body = ApiError {
            success: false,
            message: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

pub type SeatResult<T> = Result<T, SeatError>;
