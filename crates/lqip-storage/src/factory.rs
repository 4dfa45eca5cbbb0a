use crate::{LocalSource, RemoteSource, SourceLoader, StorageResult};
use lqip_core::Config;
use std::sync::Arc;

/// Primary and fallback source for placeholder generation.
#[derive(Clone)]
pub struct Sources {
    pub local: Arc<dyn SourceLoader>,
    pub remote: Arc<dyn SourceLoader>,
}

/// Create the local and remote sources based on configuration
pub fn create_sources(config: &Config) -> StorageResult<Sources> {
    let local = LocalSource::new(config.uploads.base_dir.clone());
    let remote = RemoteSource::new(
        config.uploads.base_url.clone(),
        config.placeholder.fetch_timeout,
    )?;

    tracing::debug!(
        base_dir = %config.uploads.base_dir.display(),
        base_url = %config.uploads.base_url,
        fetch_timeout_ms = config.placeholder.fetch_timeout.as_millis() as u64,
        "Placeholder sources configured"
    );

    Ok(Sources {
        local: Arc::new(local),
        remote: Arc::new(remote),
    })
}
