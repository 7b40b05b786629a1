pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod server;
pub mod storage;

pub use config::ServerConfig;
pub use ingest::{IngestionResult, IngestionService, UploadItem};
pub use server::Server;
pub use storage::StorageRoot;
