use reqwest::header::ACCEPT;
use rtcgit_core::{AccessToken, ConnectorError, GitHostKind, Result};
use rtcgit_runtime_config::ConnectorConfig;
use tracing::debug;

use crate::http::HostHttp;

/// Checks a personal access token against the host's "current user" endpoint.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    http: HostHttp,
    github_api_url: String,
    gitlab_api_path: String,
}

impl TokenValidator {
    pub fn new(http: HostHttp, config: &ConnectorConfig) -> Self {
        Self {
            http,
            github_api_url: config.github.api_url.trim_end_matches('/').to_string(),
            gitlab_api_path: config.gitlab.api_path.trim_end_matches('/').to_string(),
        }
    }

    /// `Ok(true)` when the host accepts the token, `Ok(false)` when it
    /// rejects it. Only transport failures are errors.
    ///
    /// `origin` is the repository's `scheme://host[:port]`; GitHub ignores it.
    pub async fn validate(
        &self,
        kind: GitHostKind,
        origin: &str,
        token: &AccessToken,
    ) -> Result<bool> {
        let request = match kind {
            GitHostKind::GitHub => self
                .http
                .client()
                .get(format!("{}/user", self.github_api_url))
                .bearer_auth(token.expose())
                .header(ACCEPT, "application/vnd.github+json"),
            GitHostKind::GitLab => {
                let target = format!(
                    "{}{}/user",
                    origin.trim_end_matches('/'),
                    self.gitlab_api_path
                );
                self.http
                    .client()
                    .get(self.http.routing().request_url(&target))
                    .header("PRIVATE-TOKEN", token.expose())
            }
            other => return Err(ConnectorError::InvalidHost(other)),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;
        let status = resp.status();
        debug!("{kind} token check answered {status}");
        Ok(status.is_success())
    }
}
