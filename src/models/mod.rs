pub mod booking;
pub mod seat;
pub mod showtime;

pub use booking::{CurrentBooking, LocalBookingRecord, PaymentSummary, TicketRecord, TicketsResponse};
pub use seat::{Seat, SeatId, SeatStatus};
pub use showtime::ShowtimeKey;
