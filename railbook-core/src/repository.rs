use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{CoreError, CoreResult};

/// Whole-collection persistence for one record type.
///
/// `load_all` returns an empty collection when nothing has been stored yet; `save_all`
/// replaces everything previously stored.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    async fn load_all(&self) -> CoreResult<Vec<T>>;

    async fn save_all(&self, records: &[T]) -> CoreResult<()>;
}

/// Repository kept in memory, with a save counter so callers can assert on persistence.
pub struct InMemoryRepository<T> {
    records: Mutex<Vec<T>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Number of successful `save_all` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every following `save_all` fail with a storage error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl<T: Clone> InMemoryRepository<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Clone + Send + Sync,
{
    async fn load_all(&self) -> CoreResult<Vec<T>> {
        let records = self
            .records
            .lock()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(records.clone())
    }

    async fn save_all(&self, records: &[T]) -> CoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("in-memory store rejected the write".to_string()));
        }
        let mut stored = self
            .records
            .lock()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        *stored = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
