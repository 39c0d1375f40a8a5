use railbook_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Reading the rider's input or writing the menu failed; the session cannot go on.
    #[error("Terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),

    /// Storage fault while serving one menu option. Reported, then the menu continues.
    #[error("{0}")]
    Core(#[from] CoreError),
}

impl AppError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Core(_))
    }
}
