//! HTTP client for the `agua-server` document endpoint.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, IF_MATCH};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::record::Record;

use super::{PutOutcome, RemoteDocument, RemoteError, RemoteStore};

/// Default timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the reachability probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a successful conditional collection write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBody {
    pub version: u64,
    pub updated_at: i64,
}

/// Body of a `412 Precondition Failed` answer to a conditional write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictBody {
    pub current_version: u64,
}

/// Remote store backed by an `agua-server` instance.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    server_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a client with the default request timeout.
    pub fn new(server_url: impl Into<String>, token: Option<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(server_url, token, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self {
            server_url: server_url.into(),
            token,
            client,
        })
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, build_http_url(&self.server_url, path));
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }
}

impl RemoteStore for HttpRemote {
    async fn fetch(&self) -> Result<RemoteDocument, RemoteError> {
        let response = self
            .request(Method::GET, "/document")
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoteDocument::default());
        }
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        // The document endpoint answers `null` before the first write.
        let doc: Option<RemoteDocument> =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(doc.unwrap_or_default())
    }

    async fn replace(&self, doc: &RemoteDocument) -> Result<(), RemoteError> {
        let response = self
            .request(Method::PUT, "/document")
            .json(doc)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn put_collection(
        &self,
        name: &str,
        records: &[Record],
        expected_version: u64,
    ) -> Result<PutOutcome, RemoteError> {
        let response = self
            .request(Method::PUT, &format!("/collections/{}", name))
            .header(IF_MATCH, expected_version.to_string())
            .json(records)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PRECONDITION_FAILED {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        if status == StatusCode::PRECONDITION_FAILED {
            let body: ConflictBody =
                serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))?;
            return Ok(PutOutcome::Conflict {
                current_version: body.current_version,
            });
        }

        let body: CommitBody =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(PutOutcome::Committed {
            version: body.version,
            updated_at: body.updated_at,
        })
    }
}

/// Returns true if the server's health endpoint answers successfully.
pub async fn check_server(server_url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(build_http_url(server_url, "/health")).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Builds an HTTP URL for a given path. A bare `host:port` gets `http://`.
fn build_http_url(server_url: &str, path: &str) -> String {
    let base_url = if server_url.starts_with("http://") || server_url.starts_with("https://") {
        server_url.to_string()
    } else {
        format!("http://{}", server_url)
    };

    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_url() {
        assert_eq!(
            build_http_url("http://localhost:8080", "/document"),
            "http://localhost:8080/document"
        );
        assert_eq!(
            build_http_url("https://sync.example.com/", "/document"),
            "https://sync.example.com/document"
        );
        assert_eq!(
            build_http_url("localhost:8080", "/collections/houses"),
            "http://localhost:8080/collections/houses"
        );
    }

    #[test]
    fn test_client_accessors() {
        let remote = HttpRemote::new("http://localhost:8080", None).unwrap();
        assert_eq!(remote.server_url(), "http://localhost:8080");
    }

    #[test]
    fn test_wire_bodies_are_camel_case() {
        let commit = serde_json::to_value(CommitBody {
            version: 3,
            updated_at: 42,
        })
        .unwrap();
        assert_eq!(commit, serde_json::json!({"version": 3, "updatedAt": 42}));

        let conflict: ConflictBody =
            serde_json::from_str(r#"{"currentVersion": 7}"#).unwrap();
        assert_eq!(conflict.current_version, 7);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port 9 (discard) is closed on test machines
        let remote =
            HttpRemote::with_timeout("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
        assert!(matches!(remote.fetch().await, Err(RemoteError::Http(_))));
        assert!(!check_server("http://127.0.0.1:9").await);
    }
}
