//! The remote a CLI device talks to, chosen from configuration.

use agua_core::{HttpRemote, PutOutcome, Record, RemoteDocument, RemoteError, RemoteStore};

use crate::config::SyncConfig;

/// `Unconfigured` behaves like an unreachable server: writes stay in the
/// outbound queue until a server URL is set.
#[derive(Debug, Clone)]
pub enum DeviceRemote {
    Http(HttpRemote),
    Unconfigured,
}

impl DeviceRemote {
    pub fn from_config(sync: &SyncConfig) -> Result<Self, RemoteError> {
        match &sync.server_url {
            Some(url) => Ok(DeviceRemote::Http(HttpRemote::with_timeout(
                url.clone(),
                sync.token.clone(),
                sync.request_timeout(),
            )?)),
            None => Ok(DeviceRemote::Unconfigured),
        }
    }
}

impl RemoteStore for DeviceRemote {
    async fn fetch(&self) -> Result<RemoteDocument, RemoteError> {
        match self {
            DeviceRemote::Http(remote) => remote.fetch().await,
            DeviceRemote::Unconfigured => Err(RemoteError::Offline),
        }
    }

    async fn replace(&self, doc: &RemoteDocument) -> Result<(), RemoteError> {
        match self {
            DeviceRemote::Http(remote) => remote.replace(doc).await,
            DeviceRemote::Unconfigured => Err(RemoteError::Offline),
        }
    }

    async fn put_collection(
        &self,
        name: &str,
        records: &[Record],
        expected_version: u64,
    ) -> Result<PutOutcome, RemoteError> {
        match self {
            DeviceRemote::Http(remote) => {
                remote.put_collection(name, records, expected_version).await
            }
            DeviceRemote::Unconfigured => Err(RemoteError::Offline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_is_offline() {
        let remote = DeviceRemote::from_config(&SyncConfig::default()).unwrap();
        assert!(matches!(remote, DeviceRemote::Unconfigured));
        assert!(matches!(remote.fetch().await, Err(RemoteError::Offline)));
    }

    #[test]
    fn test_configured_uses_http() {
        let sync = SyncConfig {
            server_url: Some("http://localhost:8080".to_string()),
            ..SyncConfig::default()
        };
        match DeviceRemote::from_config(&sync).unwrap() {
            DeviceRemote::Http(remote) => assert_eq!(remote.server_url(), "http://localhost:8080"),
            DeviceRemote::Unconfigured => panic!("expected an HTTP remote"),
        }
    }
}
