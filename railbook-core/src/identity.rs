use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::warn;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Password hashing oracle used by signup, login and session re-checks.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> CoreResult<String>;

    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Argon2id hasher producing PHC strings with a random salt.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hasher with explicit memory (KiB) and iteration cost.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> CoreResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| CoreError::IdentityError(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreError::IdentityError(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(p) => p,
            Err(e) => {
                warn!("Stored password digest is not a PHC string ({}), rejecting login", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Proof of a successful login.
///
/// Carries the stored password hash seen at login time instead of the password itself, so a
/// later read can re-check the session against the current user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Uuid,
    user_id: String,
    name: String,
    fingerprint: String,
}

impl Session {
    pub fn open(
        user_id: impl Into<String>,
        name: impl Into<String>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the stored credential is still the one this session was opened with.
    pub fn matches(&self, user_id: &str, stored_digest: &str) -> bool {
        self.user_id == user_id && self.fingerprint == stored_digest
    }
}
