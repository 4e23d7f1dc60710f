use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{SeatError, SeatResult};
use crate::middleware::SessionContext;
use crate::models::{CurrentBooking, PaymentSummary, SeatId, ShowtimeKey};
use crate::services::checkout::proceed_to_payment;
use crate::services::refresh::refresh_once;
use crate::services::{ReconcileOutcome, SeatMapView, ToggleOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/seats/toggle", patch(toggle_seat))
        .route("/sessions/{id}/refresh", post(refresh_session))
        .route("/sessions/{id}/proceed", post(proceed))
        .route("/sessions/{id}/booking", get(get_booking))
}

/* ---------- DTO ---------- */

#[derive(Debug, Deserialize)]
struct OpenSessionRequest {
    #[serde(flatten)]
    showtime: ShowtimeKey,
    #[serde(default)]
    movie_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    seat_id: SeatId,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    outcome: ToggleOutcome,
    view: SeatMapView,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    outcome: ReconcileOutcome,
    view: SeatMapView,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking: CurrentBooking,
    payment: PaymentSummary,
}

/* ---------- SESSIONS ---------- */

// POST /api/sessions
async fn open_session(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Json(req): Json<OpenSessionRequest>,
) -> SeatResult<impl IntoResponse> {
    let entry = state.sessions.open(req.showtime, req.movie_title, ctx).await?;
    let view = entry.session.lock().await.snapshot(Utc::now());
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/sessions/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> SeatResult<Json<SeatMapView>> {
    let entry = state.sessions.get(id).await?;
    let view = entry.session.lock().await.snapshot(Utc::now());
    Ok(Json(view))
}

// DELETE /api/sessions/{id}
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> SeatResult<StatusCode> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- SEATS ---------- */

// PATCH /api/sessions/{id}/seats/toggle
async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> SeatResult<Json<ToggleResponse>> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.lock().await;
    let now = Utc::now();

    let outcome = session.toggle_seat(&req.seat_id, now)?;
    debug!("Session {} toggle {} -> {:?}", id, req.seat_id, outcome);

    Ok(Json(ToggleResponse {
        outcome,
        view: session.snapshot(now),
    }))
}

// POST /api/sessions/{id}/refresh
async fn refresh_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ctx: SessionContext,
) -> SeatResult<Json<RefreshResponse>> {
    let entry = state.sessions.get(id).await?;
    entry.session.lock().await.retry();

    // Токен из запроса важнее сохранённого при входе
    let ctx = if ctx.logged_in() { ctx } else { entry.context.clone() };
    let outcome = refresh_once(&entry.session, state.sessions.fetcher(), &ctx).await?;

    let view = entry.session.lock().await.snapshot(Utc::now());
    Ok(Json(RefreshResponse { outcome, view }))
}

/* ---------- PAYMENT HAND-OFF ---------- */

// POST /api/sessions/{id}/proceed
async fn proceed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ctx: SessionContext,
) -> SeatResult<Json<BookingResponse>> {
    let entry = state.sessions.get(id).await?;
    let booking = entry.session.lock().await.prepare_booking(&ctx, Utc::now())?;

    let booking = proceed_to_payment(id, booking, state.store.as_ref()).await?;

    // Пользователь ушёл на оплату: экран закрывается вместе с опросом
    if let Err(e) = state.sessions.close(id).await {
        debug!("Session {} already closed after hand-off: {}", id, e);
    }

    let payment = booking.payment_summary(state.config.seating.service_fee_minor);
    Ok(Json(BookingResponse { booking, payment }))
}

// GET /api/sessions/{id}/booking
// Сессия к этому моменту может быть уже закрыта, бронь читается из хранилища
async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> SeatResult<Json<BookingResponse>> {
    let booking = state
        .store
        .load_current_booking(id)
        .await?
        .ok_or(SeatError::SessionNotFound)?;

    let payment = booking.payment_summary(state.config.seating.service_fee_minor);
    Ok(Json(BookingResponse { booking, payment }))
}
