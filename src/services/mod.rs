pub mod clock;
pub mod mail;
pub mod notifications;
pub mod payment;
pub mod reservation;
pub mod session;
pub mod statistics;
