use std::sync::Arc;

use railbook_core::{CoreResult, CredentialHasher, Repository};
use tracing::{info, warn};

use crate::models::User;

/// The loaded user collection and the repository it is written back to.
pub struct UserLedger {
    users: Vec<User>,
    repository: Arc<dyn Repository<User>>,
}

impl UserLedger {
    pub async fn load(repository: Arc<dyn Repository<User>>) -> CoreResult<Self> {
        let users = repository.load_all().await?;
        info!("Loaded {} users", users.len());
        Ok(Self { users, repository })
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.users.iter().any(|user| user.has_name(name))
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    pub fn get_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.user_id == user_id)
    }

    /// First user whose name matches (ignoring case) and whose hash verifies `password`.
    pub fn authenticate(
        &self,
        name: &str,
        password: &str,
        hasher: &dyn CredentialHasher,
    ) -> Option<&User> {
        self.users
            .iter()
            .find(|user| user.has_name(name) && hasher.verify(password, &user.hashed_password))
    }

    /// Appends a new user and persists the collection.
    ///
    /// The caller checks name uniqueness first. If the write fails the user is dropped again.
    pub async fn register(&mut self, user: User) -> CoreResult<()> {
        let user_id = user.user_id.clone();
        self.users.push(user);
        if let Err(e) = self.persist().await {
            warn!("Failed to persist new user {}: {}", user_id, e);
            self.users.retain(|user| user.user_id != user_id);
            return Err(e);
        }
        Ok(())
    }

    pub async fn persist(&self) -> CoreResult<()> {
        self.repository.save_all(&self.users).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbook_core::{Argon2Hasher, InMemoryRepository};

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let hasher = Argon2Hasher::with_cost(8, 1).unwrap();
        let repo = Arc::new(InMemoryRepository::<User>::new());
        let mut ledger = UserLedger::load(repo.clone()).await.unwrap();

        let digest = hasher.hash("pw").unwrap();
        ledger.register(User::new("Alice", "pw", digest)).await.unwrap();

        assert!(ledger.contains_name("alice"));
        assert_eq!(repo.snapshot().len(), 1);
        assert!(ledger.authenticate("ALICE", "pw", &hasher).is_some());
        assert!(ledger.authenticate("alice", "nope", &hasher).is_none());
        assert!(ledger.authenticate("carol", "pw", &hasher).is_none());
    }

    #[tokio::test]
    async fn test_failed_register_is_rolled_back() {
        let repo = Arc::new(InMemoryRepository::<User>::new());
        repo.fail_saves(true);
        let mut ledger = UserLedger::load(repo.clone()).await.unwrap();

        let result = ledger.register(User::new("dave", "pw", "digest")).await;
        assert!(result.is_err());
        assert!(!ledger.contains_name("dave"));
        assert!(repo.snapshot().is_empty());
    }
}
