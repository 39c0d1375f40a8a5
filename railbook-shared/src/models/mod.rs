pub mod events;

pub use events::{SeatBookedEvent, TicketCancelledEvent};
