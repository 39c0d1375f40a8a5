use async_trait::async_trait;
use railbook_core::{CoreError, CoreResult, Repository};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Keeps a whole collection as one pretty-printed JSON array on disk.
pub struct JsonFileRepository<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileRepository<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, err: impl std::fmt::Display) -> CoreError {
        CoreError::Storage(format!("failed to {} {}: {}", action, self.path.display(), err))
    }
}

#[async_trait]
impl<T> Repository<T> for JsonFileRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// A missing (or blank) file is an empty collection; unparseable content is an error.
    async fn load_all(&self) -> CoreResult<Vec<T>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, starting with an empty collection", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.storage_error("read", e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<T> = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Corrupt(format!("{}: {}", self.path.display(), e)))?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn save_all(&self, records: &[T]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let payload =
            serde_json::to_vec_pretty(records).map_err(|e| self.storage_error("encode", e))?;
        tokio::fs::write(&self.path, payload)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
