use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub train_file: PathBuf,
    pub user_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// Free the seat again when its ticket is cancelled
    #[serde(default)]
    pub release_seat_on_cancel: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layers built-in defaults, `<dir>/default`, `<dir>/<RUN_MODE>`, `<dir>/local` and
    /// `RAILBOOK_*` environment variables, later sources winning.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("storage.train_file", "data/trains.json")?
            .set_default("storage.user_file", "data/users.json")?
            .set_default("booking.release_seat_on_cancel", false)?
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::from(dir.join("local")).required(false))
            // e.g. `RAILBOOK_STORAGE__TRAIN_FILE=/tmp/trains.json`
            .add_source(
                config::Environment::with_prefix("RAILBOOK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("railbook-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_without_files() {
        let config = Config::load_from(scratch_dir()).unwrap();
        assert_eq!(config.storage.train_file, PathBuf::from("data/trains.json"));
        assert_eq!(config.storage.user_file, PathBuf::from("data/users.json"));
        assert!(!config.booking.release_seat_on_cancel);
    }

    #[test]
    fn test_default_file_overrides_builtins() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("default.toml"),
            "[storage]\ntrain_file = \"/srv/rail/trains.json\"\n\n[booking]\nrelease_seat_on_cancel = true\n",
        )
        .unwrap();

        let config = Config::load_from(&dir).unwrap();
        assert_eq!(config.storage.train_file, PathBuf::from("/srv/rail/trains.json"));
        assert_eq!(config.storage.user_file, PathBuf::from("data/users.json"));
        assert!(config.booking.release_seat_on_cancel);
    }
}
