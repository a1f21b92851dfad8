use async_trait::async_trait;
use rtcgit_core::{AccessToken, GitHostKind, RepositoryReference, Result};
use rtcgit_host_client::{HostDetector, HostHttp, TokenValidator};
use rtcgit_runtime_config::ConnectorConfig;

/// Host detection and token validation as seen by a session.
#[async_trait]
pub trait HostProbe: Send + Sync {
    async fn detect(&self, repo: &RepositoryReference) -> GitHostKind;

    async fn validate_token(
        &self,
        kind: GitHostKind,
        origin: &str,
        token: &AccessToken,
    ) -> Result<bool>;
}

/// [`HostProbe`] backed by the real HTTP detector and validator.
#[derive(Debug, Clone)]
pub struct HttpHostProbe {
    detector: HostDetector,
    validator: TokenValidator,
}

impl HttpHostProbe {
    pub fn new(http: HostHttp, config: &ConnectorConfig) -> Self {
        Self {
            detector: HostDetector::new(http.clone(), config),
            validator: TokenValidator::new(http, config),
        }
    }
}

#[async_trait]
impl HostProbe for HttpHostProbe {
    async fn detect(&self, repo: &RepositoryReference) -> GitHostKind {
        self.detector.detect(repo).await
    }

    async fn validate_token(
        &self,
        kind: GitHostKind,
        origin: &str,
        token: &AccessToken,
    ) -> Result<bool> {
        self.validator.validate(kind, origin, token).await
    }
}
