//! Configuration module
//!
//! Placeholder generation, backfill scheduling and media library location are
//! configured through explicit structs handed to the engine and the scheduler at
//! construction time. `Config::from_env` builds them from `LQIP_*` variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{hook_process_media, DEFAULT_SLUG, SUPPORTED_MIME_TYPES};

// Common constants
pub const DEFAULT_MAX_WIDTH: u32 = 8;
pub const DEFAULT_BLUR_STRENGTH: u32 = 1;
const FETCH_TIMEOUT_SECS: u64 = 10;
const BATCH_SIZE: usize = 10;
const MAX_EXECUTION_SECS: u64 = 30;
const BUDGET_RATIO: f64 = 0.9;
const CONTINUATION_DELAY_SECS: u64 = 5;
const POLL_INTERVAL_MS: u64 = 1000;
const UPLOAD_BASE_DIR: &str = "./uploads";
const UPLOAD_BASE_URL: &str = "http://localhost/wp-content/uploads";

/// Settings for the transform engine.
#[derive(Clone, Debug)]
pub struct PlaceholderConfig {
    /// Target width of the placeholder in pixels.
    pub max_width: u32,
    /// Number of sequential Gaussian blur passes.
    pub blur_strength: u32,
    /// Timeout applied to the public URL fallback fetch.
    pub fetch_timeout: Duration,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            blur_strength: DEFAULT_BLUR_STRENGTH,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        }
    }
}

/// Settings for the backfill scheduler.
#[derive(Clone, Debug)]
pub struct BackfillConfig {
    /// Maximum attachments fetched per iteration.
    pub batch_size: usize,
    /// Host execution-time limit for a single run.
    pub max_run_duration: Duration,
    /// Fraction of `max_run_duration` after which a run checkpoints.
    pub budget_ratio: f64,
    /// Delay before the continuation run fires.
    pub continuation_delay: Duration,
    /// How often the worker looks for due jobs.
    pub poll_interval: Duration,
    /// MIME types eligible for backfill.
    pub allowed_mime_types: Vec<String>,
    /// Name of the one-shot job event for this instance.
    pub hook_name: String,
}

impl BackfillConfig {
    /// Elapsed time after which a run stops and schedules a continuation.
    pub fn budget(&self) -> Duration {
        self.max_run_duration.mul_f64(self.budget_ratio)
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            max_run_duration: Duration::from_secs(MAX_EXECUTION_SECS),
            budget_ratio: BUDGET_RATIO,
            continuation_delay: Duration::from_secs(CONTINUATION_DELAY_SECS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            allowed_mime_types: SUPPORTED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            hook_name: hook_process_media(DEFAULT_SLUG),
        }
    }
}

/// Location of the media library on disk and on the web.
#[derive(Clone, Debug)]
pub struct UploadsConfig {
    pub base_dir: PathBuf,
    pub base_url: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(UPLOAD_BASE_DIR),
            base_url: UPLOAD_BASE_URL.to_string(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub placeholder: PlaceholderConfig,
    pub backfill: BackfillConfig,
    pub uploads: UploadsConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let slug = env::var("LQIP_SLUG").unwrap_or_else(|_| DEFAULT_SLUG.to_string());

        let allowed_mime_types = env::var("LQIP_ALLOWED_MIME_TYPES")
            .unwrap_or_else(|_| SUPPORTED_MIME_TYPES.join(","))
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Config {
            placeholder: PlaceholderConfig {
                max_width: env_or("LQIP_MAX_WIDTH", DEFAULT_MAX_WIDTH),
                blur_strength: env_or("LQIP_BLUR_STRENGTH", DEFAULT_BLUR_STRENGTH),
                fetch_timeout: Duration::from_secs(env_or(
                    "LQIP_FETCH_TIMEOUT_SECS",
                    FETCH_TIMEOUT_SECS,
                )),
            },
            backfill: BackfillConfig {
                batch_size: env_or("LQIP_BATCH_SIZE", BATCH_SIZE),
                max_run_duration: Duration::from_secs(env_or(
                    "LQIP_MAX_EXECUTION_SECS",
                    MAX_EXECUTION_SECS,
                )),
                budget_ratio: BUDGET_RATIO,
                continuation_delay: Duration::from_secs(CONTINUATION_DELAY_SECS),
                poll_interval: Duration::from_millis(env_or(
                    "LQIP_POLL_INTERVAL_MS",
                    POLL_INTERVAL_MS,
                )),
                allowed_mime_types,
                hook_name: hook_process_media(&slug),
            },
            uploads: UploadsConfig {
                base_dir: env::var("LQIP_UPLOAD_BASE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(UPLOAD_BASE_DIR)),
                base_url: env::var("LQIP_UPLOAD_BASE_URL")
                    .unwrap_or_else(|_| UPLOAD_BASE_URL.to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.placeholder.max_width == 0 {
            return Err(anyhow::anyhow!("LQIP_MAX_WIDTH must be at least 1"));
        }

        if self.backfill.batch_size == 0 {
            return Err(anyhow::anyhow!("LQIP_BATCH_SIZE must be at least 1"));
        }

        if self.backfill.max_run_duration.is_zero() {
            return Err(anyhow::anyhow!("LQIP_MAX_EXECUTION_SECS must be at least 1"));
        }

        if !(self.backfill.budget_ratio > 0.0 && self.backfill.budget_ratio <= 1.0) {
            return Err(anyhow::anyhow!("Budget ratio must be in (0, 1]"));
        }

        if let Some(unknown) = self
            .backfill
            .allowed_mime_types
            .iter()
            .find(|m| !SUPPORTED_MIME_TYPES.contains(&m.as_str()))
        {
            return Err(anyhow::anyhow!(
                "LQIP_ALLOWED_MIME_TYPES contains unsupported type '{}'",
                unknown
            ));
        }

        if self.uploads.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("LQIP_UPLOAD_BASE_URL must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.placeholder.max_width, 8);
        assert_eq!(config.placeholder.blur_strength, 1);
        assert_eq!(config.backfill.batch_size, 10);
        assert_eq!(config.backfill.max_run_duration, Duration::from_secs(30));
        assert_eq!(config.backfill.continuation_delay, Duration::from_secs(5));
        assert_eq!(config.backfill.hook_name, "image-base64_hook_process_media");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn budget_is_ninety_percent_of_run_duration() {
        let config = BackfillConfig::default();
        assert_eq!(config.budget(), Duration::from_secs(27));
    }

    #[test]
    fn validate_rejects_zero_width() {
        let mut config = Config::default();
        config.placeholder.max_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.backfill.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_mime_type() {
        let mut config = Config::default();
        config.backfill.allowed_mime_types.push("image/jpg".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("image/jpg"));
    }
}
