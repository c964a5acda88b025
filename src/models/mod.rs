pub mod appointment;
pub mod customer;
pub mod session;

pub use appointment::{
    Appointment, AppointmentPatch, AppointmentStatus, NewAppointment, BOOKED_BY_ASSISTANT,
};
pub use customer::Customer;
pub use session::{BusinessContext, Session, SessionState, StatePatch, Turn};
