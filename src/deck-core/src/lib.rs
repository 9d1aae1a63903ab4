pub mod catalog;
pub mod catalog_contract;
pub mod config;
pub mod logging;
pub mod memory;
pub mod models;
pub mod paths;
pub mod secrets;

pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use config::{
    CatalogConfig, Config, ConfigError, LogLevel, LoggingConfig, SearchConfig, ValidationError,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use memory::MemoryCatalog;
pub use models::{
    Page, PageCursor, PageRequest, PreviewUrl, RequestedPage, Track, TrackId, TrackPage,
};
pub use paths::{AppDirs, DirsError};
pub use secrets::{CredentialStore, SecretKind, SecretsError, SecretsResult};

pub const APP_NAME: &str = "preview-deck";
pub const APP_AUTHOR: &str = "PreviewDeck";
pub const APP_QUALIFIER: &str = "io";
