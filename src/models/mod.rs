pub mod booking;
pub mod dates;
pub mod reservation;
pub mod statistics;

pub use booking::{AvailabilitySnapshot, Block, Booking, Entry, RemovedCounts};
pub use dates::{DateError, DateRange};
pub use reservation::{transition, RejectReason, ReservationEvent, ReservationState};
pub use statistics::{MonthlyStat, YearStats};
