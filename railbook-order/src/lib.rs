pub mod booking;
pub mod ledger;
pub mod models;

pub use booking::{BookingDesk, CancellationPolicy, Outcome, Rejection};
pub use ledger::UserLedger;
pub use models::{Journey, Ticket, User};
