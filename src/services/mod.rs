pub mod availability;
pub mod checkout;
pub mod circuit_breaker;
pub mod grid;
pub mod reconciler;
pub mod refresh;
pub mod registry;
pub mod selection;
pub mod session;

pub use availability::{AvailabilityFetcher, AvailabilitySource, BookedSeats, LocalLogSource, TicketsApiSource};
pub use grid::{build_grid, SeatLayout};
pub use reconciler::ReconcileOutcome;
pub use registry::SeatSessions;
pub use selection::ToggleOutcome;
pub use session::{Notice, NoticeKind, SeatMapView, SeatSession};
