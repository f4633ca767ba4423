pub mod analytics;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod queries;

pub use cache::QueryCache;
pub use config::Config;
pub use error::{AppError, Result};
pub use queries::LogisticsQueries;
