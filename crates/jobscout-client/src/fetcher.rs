use std::collections::BTreeMap;
use std::time::Duration;

use jobscout_core::error::AppError;
use jobscout_core::traits::Fetcher;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

const DEFAULT_USER_AGENT: &str = "jobscout/0.1";

/// HTTP fetcher using reqwest.
///
/// Sends the configured headers with every request. Any non-2xx status is
/// an error; the body is returned as text.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn with_headers(
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(header_map(headers)?)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

/// Convert configured headers, rejecting names or values reqwest cannot send.
fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, AppError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::ConfigError(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::ConfigError(format!("Invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_accepts_valid_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), "Mozilla/5.0".to_string());
        headers.insert("Accept-Language".to_string(), "en-US".to_string());
        let map = header_map(&headers).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["user-agent"], "Mozilla/5.0");
    }

    #[test]
    fn test_header_map_rejects_invalid_name() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad Header".to_string(), "x".to_string());
        let err = header_map(&headers).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let fetcher =
            ReqwestFetcher::with_headers(&BTreeMap::new(), Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/offers").await.unwrap_err();
        assert!(err.is_transport());
    }
}
