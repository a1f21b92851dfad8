#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use rtcgit_core::{
    AccessToken, ArtifactKind, CanonicalCommit, CanonicalIssue, CanonicalRequest,
    ConnectorError, GitHostKind, LinkedUrls, RepositoryReference, Result, WorkItem, testing,
};
use rtcgit_host_client::{BackLink, GitHost, RepoAccess};
use rtcgit_linker::{HostProbe, LinkSelection, WorkItemService};

pub fn github_access() -> RepoAccess {
    RepoAccess::new(
        RepositoryReference::new("https://github.com/acme/widget.git"),
        AccessToken::new("ghp_test"),
    )
}

pub fn github_issue(number: u64, title: &str) -> CanonicalIssue {
    CanonicalIssue::from_github(&testing::github_issue(number, title), &LinkedUrls::new())
}

pub fn github_commit(sha: &str) -> CanonicalCommit {
    CanonicalCommit::from_github(&testing::github_commit(sha, "change"), &LinkedUrls::new())
}

pub fn github_request(number: u64) -> CanonicalRequest {
    CanonicalRequest::from_github(
        &testing::github_pull_request(number, "change"),
        &LinkedUrls::new(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: ArtifactKind,
    pub id: String,
    pub user: String,
}

/// In-memory Git host. Lists come from fixtures; writes are recorded.
pub struct FakeHost {
    pub kind: GitHostKind,
    pub created_issue: Option<CanonicalIssue>,
    /// Artifact ids whose back-link comment fails.
    pub failing_ids: HashSet<String>,
    pub comments: Mutex<Vec<Comment>>,
    pub list_calls: Mutex<usize>,
}

impl FakeHost {
    pub fn github() -> Self {
        Self {
            kind: GitHostKind::GitHub,
            created_issue: Some(github_issue(77, "Widget crashes on save")),
            failing_ids: HashSet::new(),
            comments: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
        }
    }

    pub fn failing_issue_creation(mut self) -> Self {
        self.created_issue = None;
        self
    }

    pub fn failing_comment_on(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn comment(&self, kind: ArtifactKind, id: String, link: &BackLink) -> Result<()> {
        self.comments.lock().unwrap().push(Comment {
            kind,
            id: id.clone(),
            user: link.user.clone(),
        });
        if self.failing_ids.contains(&id) {
            Err(ConnectorError::request_failed(
                "Couldn't add a comment to the GitHub issue or pull request",
                "Resource not accessible by integration",
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GitHost for FakeHost {
    fn kind(&self) -> GitHostKind {
        self.kind
    }

    async fn list_recent_commits(
        &self,
        _access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalCommit>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(vec![CanonicalCommit::from_github(
            &testing::github_commit("aaa", "first"),
            linked,
        )])
    }

    async fn list_recent_issues(
        &self,
        _access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalIssue>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(vec![
            CanonicalIssue::from_github(&testing::github_issue(1, "Bug"), linked),
            CanonicalIssue::new_issue_sentinel(self.kind),
        ])
    }

    async fn list_recent_requests(
        &self,
        _access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalRequest>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(vec![CanonicalRequest::from_github(
            &testing::github_pull_request(5, "Refactor"),
            linked,
        )])
    }

    async fn get_commit_by_id(
        &self,
        _access: &RepoAccess,
        _sha: &str,
        _linked: &LinkedUrls,
    ) -> Result<Option<CanonicalCommit>> {
        Ok(None)
    }

    async fn get_issue_by_id(
        &self,
        _access: &RepoAccess,
        _id: i64,
        _linked: &LinkedUrls,
    ) -> Result<Option<CanonicalIssue>> {
        Ok(None)
    }

    async fn get_request_by_id(
        &self,
        _access: &RepoAccess,
        _id: i64,
        _linked: &LinkedUrls,
    ) -> Result<Option<CanonicalRequest>> {
        Ok(None)
    }

    async fn create_issue(
        &self,
        _access: &RepoAccess,
        _work_item: &WorkItem,
    ) -> Result<CanonicalIssue> {
        self.created_issue
            .clone()
            .ok_or_else(|| ConnectorError::IssueCreationFailed {
                host: self.kind,
                message: "Issues are disabled for this repo".to_string(),
            })
    }

    async fn add_comment_to_commit(
        &self,
        _access: &RepoAccess,
        sha: &str,
        link: &BackLink,
    ) -> Result<()> {
        self.comment(ArtifactKind::Commit, sha.to_string(), link)
    }

    async fn add_comment_to_issue(
        &self,
        _access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        self.comment(ArtifactKind::Issue, id.to_string(), link)
    }

    async fn add_comment_to_request(
        &self,
        _access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        self.comment(ArtifactKind::Request, id.to_string(), link)
    }
}

/// In-memory RTC work item service.
#[derive(Default)]
pub struct FakeService {
    pub current_user: Option<String>,
    pub fail_persist: bool,
    pub tokens: Mutex<HashMap<String, AccessToken>>,
    pub linked: Mutex<LinkedUrls>,
    pub staged: Mutex<Vec<LinkSelection>>,
    pub saves: Mutex<usize>,
}

impl FakeService {
    pub fn with_user(user: &str) -> Self {
        Self {
            current_user: Some(user.to_string()),
            ..Self::default()
        }
    }

    pub fn with_token(self, origin: &str, token: &str) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .insert(origin.to_string(), AccessToken::new(token));
        self
    }

    /// Record `url` as linked from the work item, as a save elsewhere would.
    pub fn link(&self, url: &str) {
        self.linked.lock().unwrap().insert(url);
    }

    pub fn staged(&self) -> Vec<LinkSelection> {
        self.staged.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn stored_token(&self, origin: &str) -> Option<AccessToken> {
        self.tokens.lock().unwrap().get(origin).cloned()
    }
}

#[async_trait]
impl WorkItemService for FakeService {
    async fn registered_repositories(
        &self,
        project_area_id: &str,
    ) -> Result<Vec<RepositoryReference>> {
        if project_area_id == "_acme" {
            Ok(vec![
                RepositoryReference::new("https://github.com/acme/widget.git"),
                RepositoryReference::with_host_hint("https://git.example.com/acme/gadget", "GITLAB"),
            ])
        } else {
            Err(ConnectorError::WorkItemService(format!(
                "unknown project area {project_area_id}"
            )))
        }
    }

    async fn current_user_id(&self) -> Result<Option<String>> {
        Ok(self.current_user.clone())
    }

    async fn access_token_by_host(&self, host_origin: &str) -> Result<Option<AccessToken>> {
        Ok(self.stored_token(host_origin))
    }

    async fn save_access_token_by_host(
        &self,
        host_origin: &str,
        token: &AccessToken,
    ) -> Result<()> {
        self.tokens
            .lock()
            .unwrap()
            .insert(host_origin.to_string(), token.clone());
        Ok(())
    }

    async fn linked_artifact_urls(&self, _work_item: &WorkItem) -> Result<LinkedUrls> {
        Ok(self.linked.lock().unwrap().clone())
    }

    async fn add_links_to_work_item(
        &self,
        _work_item: &WorkItem,
        _repo: &RepositoryReference,
        links: &LinkSelection,
    ) -> Result<()> {
        self.staged.lock().unwrap().push(links.clone());
        Ok(())
    }

    async fn save_links_in_work_item(&self, _work_item: &WorkItem) -> Result<()> {
        if self.fail_persist {
            return Err(ConnectorError::WorkItemService(
                "The work item was modified by another user".to_string(),
            ));
        }
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Detection and validation without the network.
pub struct FakeProbe {
    pub kind: GitHostKind,
    pub valid_tokens: HashSet<String>,
    pub validations: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn new(kind: GitHostKind, valid_tokens: &[&str]) -> Self {
        Self {
            kind,
            valid_tokens: valid_tokens.iter().map(|token| token.to_string()).collect(),
            validations: Mutex::new(Vec::new()),
        }
    }

    pub fn validations(&self) -> Vec<String> {
        self.validations.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostProbe for FakeProbe {
    async fn detect(&self, repo: &RepositoryReference) -> GitHostKind {
        repo.host_hint()
            .map(GitHostKind::from_hint)
            .unwrap_or(self.kind)
    }

    async fn validate_token(
        &self,
        kind: GitHostKind,
        origin: &str,
        token: &AccessToken,
    ) -> Result<bool> {
        if !kind.is_supported() {
            return Err(ConnectorError::InvalidHost(kind));
        }
        self.validations.lock().unwrap().push(origin.to_string());
        Ok(self.valid_tokens.contains(token.expose()))
    }
}
