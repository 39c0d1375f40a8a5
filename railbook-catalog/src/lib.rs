pub mod seats;
pub mod train;

pub use seats::{SeatError, SeatGrid, SeatPosition, SeatState};
pub use train::Train;
