pub mod booking;
pub mod clock;
pub mod session;
