use crate::traits::{validate_location, SourceBackend, SourceLoader, StorageError, StorageResult};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches source images from the public uploads URL.
///
/// Every request is bounded by the configured timeout so an unreachable host
/// cannot stall a backfill run.
#[derive(Clone, Debug)]
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSource {
    /// Create a new RemoteSource
    ///
    /// # Arguments
    /// * `base_url` - Public URL of the uploads directory (e.g., "https://example.com/wp-content/uploads")
    /// * `timeout` - Upper bound for each fetch, connect included
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Public URL for `location`.
    pub fn url_for(&self, location: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            location.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl SourceLoader for RemoteSource {
    async fn load(&self, location: &str) -> StorageResult<Vec<u8>> {
        validate_location(location)?;
        let url = self.url_for(location);
        let start = std::time::Instant::now();

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout(url.clone())
            } else {
                StorageError::DownloadFailed(format!("GET {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(url));
        }
        if !status.is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let data = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout(url.clone())
            } else {
                StorageError::DownloadFailed(format!("Reading body of {} failed: {}", url, e))
            }
        })?;

        tracing::debug!(
            url = %url,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote source fetched"
        );

        Ok(data.to_vec())
    }

    fn backend_type(&self) -> SourceBackend {
        SourceBackend::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let source = RemoteSource::new("https://example.com/uploads/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.url_for("2024/05/a.jpg"),
            "https://example.com/uploads/2024/05/a.jpg"
        );
    }

    #[tokio::test]
    async fn fetches_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/uploads/2024/05/a.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"png-bytes".as_slice())
            .create_async()
            .await;

        let source = RemoteSource::new(format!("{}/uploads", server.url()), Duration::from_secs(5))
            .unwrap();
        let data = source.load("2024/05/a.png").await.unwrap();

        assert_eq!(data, b"png-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/uploads/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let source = RemoteSource::new(format!("{}/uploads", server.url()), Duration::from_secs(5))
            .unwrap();
        let err = source.load("gone.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn unresponsive_host_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let source =
            RemoteSource::new(format!("http://{}/uploads", addr), Duration::from_millis(100))
                .unwrap();
        let start = std::time::Instant::now();
        let err = source.load("2024/05/slow.jpg").await.unwrap_err();

        assert!(matches!(err, StorageError::Timeout(_)), "got {err:?}");
        assert!(start.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[tokio::test]
    async fn server_error_is_download_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/uploads/broken.png")
            .with_status(500)
            .create_async()
            .await;

        let source = RemoteSource::new(format!("{}/uploads", server.url()), Duration::from_secs(5))
            .unwrap();
        let err = source.load("broken.png").await.unwrap_err();
        assert!(matches!(err, StorageError::DownloadFailed(_)));
    }
}
