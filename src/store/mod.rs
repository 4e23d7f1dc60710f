//! Хранилище бронирований: журнал прошлых броней и текущая бронь сессии.
//!
//! Журнал служит запасным источником занятости мест, когда внешний API
//! недоступен. Текущая бронь - передача выбора мест на шаг оплаты.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SeatResult;
use crate::models::{CurrentBooking, LocalBookingRecord};

pub mod redis_store;

pub use self::redis_store::RedisBookingStore;

pub trait BookingStore: Send + Sync {
    fn load_bookings(&self) -> BoxFuture<'_, SeatResult<Vec<LocalBookingRecord>>>;

    fn append_booking<'a>(&'a self, record: &'a LocalBookingRecord) -> BoxFuture<'a, SeatResult<()>>;

    fn save_current_booking<'a>(
        &'a self,
        session_id: Uuid,
        booking: &'a CurrentBooking,
    ) -> BoxFuture<'a, SeatResult<()>>;

    fn load_current_booking(&self, session_id: Uuid) -> BoxFuture<'_, SeatResult<Option<CurrentBooking>>>;
}

/// Хранилище в памяти процесса. Используется без Redis и в тестах.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<Vec<LocalBookingRecord>>,
    current: RwLock<HashMap<Uuid, CurrentBooking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: Vec<LocalBookingRecord>) -> Self {
        Self {
            bookings: RwLock::new(bookings),
            current: RwLock::default(),
        }
    }
}

impl BookingStore for MemoryBookingStore {
    fn load_bookings(&self) -> BoxFuture<'_, SeatResult<Vec<LocalBookingRecord>>> {
        async move { Ok(self.bookings.read().await.clone()) }.boxed()
    }

    fn append_booking<'a>(&'a self, record: &'a LocalBookingRecord) -> BoxFuture<'a, SeatResult<()>> {
        async move {
            self.bookings.write().await.push(record.clone());
            Ok(())
        }
        .boxed()
    }

    fn save_current_booking<'a>(
        &'a self,
        session_id: Uuid,
        booking: &'a CurrentBooking,
    ) -> BoxFuture<'a, SeatResult<()>> {
        async move {
            self.current.write().await.insert(session_id, booking.clone());
            Ok(())
        }
        .boxed()
    }

    fn load_current_booking(&self, session_id: Uuid) -> BoxFuture<'_, SeatResult<Option<CurrentBooking>>> {
        async move { Ok(self.current.read().await.get(&session_id).cloned()) }.boxed()
    }
}
