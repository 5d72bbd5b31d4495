use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
///
/// The feeds directory is required and validated at startup. The catalog
/// directory is optional; without one the built-in seed data is used. Redis
/// URL is optional; if absent, the server runs without caching.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    /// Directory holding one `<feed_id>.json` document per portal.
    pub feeds_dir: String,
    /// Directory holding one `<category_tag>.json` catalog document per category.
    pub catalog_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `FEEDS_DIR`: directory with one JSON feed file per portal
    ///
    /// Optional:
    /// - `CATALOG_DIR`: directory with per-category catalog files
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    pub fn from_env() -> Result<Self, AppError> {
        let feeds_dir = std::env::var("FEEDS_DIR")
            .map_err(|_| AppError::Config("FEEDS_DIR environment variable is required".to_string()))?;

        if !std::path::Path::new(&feeds_dir).is_dir() {
            return Err(AppError::Config(format!(
                "feeds directory not found: {feeds_dir}"
            )));
        }

        let catalog_dir = std::env::var("CATALOG_DIR").ok();
        let redis_url = std::env::var("REDIS_URL").ok();

        Ok(Self {
            redis_url,
            feeds_dir,
            catalog_dir,
        })
    }
}
