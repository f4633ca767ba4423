use std::env;

/// Runtime configuration, built once and passed to each component
/// at construction. Nothing reads ambient global state after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub data_dir: String,
    pub batch_size: usize,
    pub max_connect_attempts: u32,
}

pub const DEFAULT_BATCH_SIZE: usize = 500;

impl Config {
    pub fn from_env() -> Self {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://logistics.db".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string()),
            batch_size: env::var("BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
            max_connect_attempts: env::var("MAX_CONNECT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    pub fn source_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.data_dir, file_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://logistics.db".to_string(),
            data_dir: ".".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_connect_attempts: 3,
        }
    }
}
