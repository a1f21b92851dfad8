use rtcgit_core::{GitHostKind, RepositoryReference};
use rtcgit_runtime_config::ConnectorConfig;
use tracing::{debug, info};

use crate::http::HostHttp;

const GITHUB_HOST: &str = "github.com";
const GITLAB_HOST: &str = "gitlab.com";

/// Decides which kind of Git host serves a repository.
///
/// Resolution order: the repository's configured host hint, then the well
/// known public hosts, then an unauthenticated probe of the GitLab projects
/// API on the repository's origin. Detection never fails; anything that
/// cannot be confirmed is [`GitHostKind::Other`].
#[derive(Debug, Clone)]
pub struct HostDetector {
    http: HostHttp,
    api_path: String,
}

impl HostDetector {
    pub fn new(http: HostHttp, config: &ConnectorConfig) -> Self {
        Self {
            http,
            api_path: config.gitlab.api_path.trim_end_matches('/').to_string(),
        }
    }

    pub async fn detect(&self, repo: &RepositoryReference) -> GitHostKind {
        if let Some(hint) = repo.host_hint() {
            let kind = GitHostKind::from_hint(hint);
            debug!("Host of {} taken from configuration: {kind}", repo.url);
            return kind;
        }

        let info = repo.url_info();
        if info.origin().is_empty() {
            debug!("Unparseable repository URL {}", repo.url);
            return GitHostKind::Other;
        }

        match info.host().to_ascii_lowercase().as_str() {
            GITHUB_HOST => return GitHostKind::GitHub,
            GITLAB_HOST => return GitHostKind::GitLab,
            _ => {}
        }

        let probe = format!("{}{}/projects?per_page=1", info.origin(), self.api_path);
        let kind = match self
            .http
            .client()
            .get(self.http.routing().request_url(&probe))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => GitHostKind::GitLab,
            Ok(resp) => {
                debug!("GitLab probe of {} answered {}", info.origin(), resp.status());
                GitHostKind::Other
            }
            Err(e) => {
                debug!("GitLab probe of {} failed: {e}", info.origin());
                GitHostKind::Other
            }
        };
        info!("Detected {kind} at {}", info.origin());
        kind
    }
}
