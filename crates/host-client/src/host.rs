use std::sync::Arc;

use async_trait::async_trait;
use rtcgit_core::{
    AccessToken, CanonicalCommit, CanonicalIssue, CanonicalRequest, ConnectorError, GitHostKind,
    LinkedUrls, RepositoryReference, Result, WorkItem,
};
use rtcgit_runtime_config::ConnectorConfig;

use crate::comment::BackLink;
use crate::github::GitHubClient;
use crate::gitlab::GitLabClient;
use crate::http::HostHttp;
use crate::template::{PlaceholderRenderer, TemplateRenderer};

/// A repository together with the token that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoAccess {
    pub repo: RepositoryReference,
    pub token: AccessToken,
}

impl RepoAccess {
    pub fn new(repo: RepositoryReference, token: AccessToken) -> Self {
        Self { repo, token }
    }
}

/// Issue and request numbers start at 1; anything else (including the
/// sentinel) cannot exist upstream.
pub(crate) fn positive_id(id: i64) -> Option<u64> {
    u64::try_from(id).ok().filter(|number| *number > 0)
}

/// Reads and writes one Git host supports.
///
/// Listings return at most one page of the most recent items. Lookups by id
/// resolve to `None` when the item does not exist upstream.
#[async_trait]
pub trait GitHost: Send + Sync {
    fn kind(&self) -> GitHostKind;

    async fn list_recent_commits(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalCommit>>;

    /// Ends with the "create a new issue" sentinel.
    async fn list_recent_issues(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalIssue>>;

    async fn list_recent_requests(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalRequest>>;

    async fn get_commit_by_id(
        &self,
        access: &RepoAccess,
        sha: &str,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalCommit>>;

    async fn get_issue_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalIssue>>;

    async fn get_request_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalRequest>>;

    /// Create an issue from the repository's template (or the default one).
    async fn create_issue(&self, access: &RepoAccess, work_item: &WorkItem)
    -> Result<CanonicalIssue>;

    async fn add_comment_to_commit(
        &self,
        access: &RepoAccess,
        sha: &str,
        link: &BackLink,
    ) -> Result<()>;

    async fn add_comment_to_issue(&self, access: &RepoAccess, id: i64, link: &BackLink)
    -> Result<()>;

    async fn add_comment_to_request(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()>;
}

/// The single place a [`GitHostKind`] is turned into a client.
pub enum HostClient {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
    /// `Other`/`Unknown`: every operation fails with `UnsupportedHost`.
    Unsupported(GitHostKind),
}

impl HostClient {
    pub fn for_kind(kind: GitHostKind, http: HostHttp, config: &ConnectorConfig) -> Self {
        Self::with_renderer(kind, http, config, Arc::new(PlaceholderRenderer))
    }

    pub fn with_renderer(
        kind: GitHostKind,
        http: HostHttp,
        config: &ConnectorConfig,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        match kind {
            GitHostKind::GitHub => Self::GitHub(GitHubClient::new(http, config, renderer)),
            GitHostKind::GitLab => Self::GitLab(GitLabClient::new(http, config, renderer)),
            other => Self::Unsupported(other),
        }
    }

    fn inner(&self) -> Result<&dyn GitHost> {
        match self {
            Self::GitHub(client) => Ok(client as &dyn GitHost),
            Self::GitLab(client) => Ok(client as &dyn GitHost),
            Self::Unsupported(kind) => Err(ConnectorError::UnsupportedHost(*kind)),
        }
    }
}

#[async_trait]
impl GitHost for HostClient {
    fn kind(&self) -> GitHostKind {
        match self {
            Self::GitHub(_) => GitHostKind::GitHub,
            Self::GitLab(_) => GitHostKind::GitLab,
            Self::Unsupported(kind) => *kind,
        }
    }

    async fn list_recent_commits(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalCommit>> {
        self.inner()?.list_recent_commits(access, linked).await
    }

    async fn list_recent_issues(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalIssue>> {
        self.inner()?.list_recent_issues(access, linked).await
    }

    async fn list_recent_requests(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalRequest>> {
        self.inner()?.list_recent_requests(access, linked).await
    }

    async fn get_commit_by_id(
        &self,
        access: &RepoAccess,
        sha: &str,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalCommit>> {
        self.inner()?.get_commit_by_id(access, sha, linked).await
    }

    async fn get_issue_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalIssue>> {
        self.inner()?.get_issue_by_id(access, id, linked).await
    }

    async fn get_request_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalRequest>> {
        self.inner()?.get_request_by_id(access, id, linked).await
    }

    async fn create_issue(
        &self,
        access: &RepoAccess,
        work_item: &WorkItem,
    ) -> Result<CanonicalIssue> {
        self.inner()?.create_issue(access, work_item).await
    }

    async fn add_comment_to_commit(
        &self,
        access: &RepoAccess,
        sha: &str,
        link: &BackLink,
    ) -> Result<()> {
        self.inner()?.add_comment_to_commit(access, sha, link).await
    }

    async fn add_comment_to_issue(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        self.inner()?.add_comment_to_issue(access, id, link).await
    }

    async fn add_comment_to_request(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        self.inner()?.add_comment_to_request(access, id, link).await
    }
}
