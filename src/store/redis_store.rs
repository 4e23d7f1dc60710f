use futures::future::{BoxFuture, FutureExt};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{SeatError, SeatResult};
use crate::models::{CurrentBooking, LocalBookingRecord};
use crate::store::BookingStore;

const BOOKINGS_LOG_KEY: &str = "bookings:log";

fn current_booking_key(session_id: Uuid) -> String {
    format!("booking:current:{}", session_id)
}

fn store_error(e: impl std::fmt::Display) -> SeatError {
    SeatError::Store(e.to_string())
}

/// Журнал бронирований и текущие брони в Redis.
///
/// Журнал - список JSON-записей под ключом `bookings:log`, текущая бронь -
/// строка `booking:current:{session}` с TTL.
#[derive(Clone)]
pub struct RedisBookingStore {
    conn: MultiplexedConnection,
    current_booking_ttl: u64,
}

impl RedisBookingStore {
    pub async fn connect(redis_url: &str, current_booking_ttl: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis booking store connected");
        Ok(Self {
            conn,
            current_booking_ttl,
        })
    }
}

impl BookingStore for RedisBookingStore {
    fn load_bookings(&self) -> BoxFuture<'_, SeatResult<Vec<LocalBookingRecord>>> {
        async move {
            let mut conn = self.conn.clone();
            let raw: Vec<String> = conn
                .lrange(BOOKINGS_LOG_KEY, 0, -1)
                .await
                .map_err(store_error)?;

            // Битые записи пропускаем
            let bookings = raw
                .iter()
                .filter_map(|entry| match serde_json::from_str::<LocalBookingRecord>(entry) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping malformed booking log entry: {}", e);
                        None
                    }
                })
                .collect();
            Ok(bookings)
        }
        .boxed()
    }

    fn append_booking<'a>(&'a self, record: &'a LocalBookingRecord) -> BoxFuture<'a, SeatResult<()>> {
        async move {
            let data = serde_json::to_string(record).map_err(store_error)?;
            let mut conn = self.conn.clone();
            let _: i64 = conn.rpush(BOOKINGS_LOG_KEY, data).await.map_err(store_error)?;
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
            let data = serde_json::to_string(booking).map_err(store_error)?;
            let mut conn = self.conn.clone();
            let _: () = conn
                .set_ex(current_booking_key(session_id), data, self.current_booking_ttl)
                .await
                .map_err(store_error)?;
            Ok(())
        }
        .boxed()
    }

    fn load_current_booking(&self, session_id: Uuid) -> BoxFuture<'_, SeatResult<Option<CurrentBooking>>> {
        async move {
            let mut conn = self.conn.clone();
            let data: Option<String> = conn
                .get(current_booking_key(session_id))
                .await
                .map_err(store_error)?;

            data.map(|json| serde_json::from_str(&json).map_err(store_error))
                .transpose()
        }
        .boxed()
    }
}
