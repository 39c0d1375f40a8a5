pub mod app_config;
pub mod json_repo;

pub use app_config::Config;
pub use json_repo::JsonFileRepository;
