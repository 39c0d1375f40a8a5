pub mod error;
pub mod menu;
pub mod state;

pub use error::AppError;
pub use menu::run;
pub use state::AppState;
