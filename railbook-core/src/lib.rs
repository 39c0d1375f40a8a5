pub mod identity;
pub mod repository;
pub mod search;

pub use identity::{Argon2Hasher, CredentialHasher, Session};
pub use repository::{InMemoryRepository, Repository};
pub use search::{find_route, TrainDirectory};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Corrupt document: {0}")]
    Corrupt(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
