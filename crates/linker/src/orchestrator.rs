use futures::future::BoxFuture;
use rtcgit_core::{
    ArtifactKind, CanonicalCommit, CanonicalIssue, CanonicalRequest, ConnectorError, Result,
    WorkItem,
};
use rtcgit_host_client::{BackLink, GitHost, RepoAccess};
use tracing::{debug, info, warn};

use crate::gather::gather_all;
use crate::service::WorkItemService;

/// Artifacts the user picked for one save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSelection {
    pub commits: Vec<CanonicalCommit>,
    pub issues: Vec<CanonicalIssue>,
    pub requests: Vec<CanonicalRequest>,
}

impl LinkSelection {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.issues.is_empty() && self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commits.len() + self.issues.len() + self.requests.len()
    }

    fn wants_new_issue(&self) -> bool {
        self.issues.iter().any(CanonicalIssue::is_new_issue_sentinel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    CreatingIssue,
    PersistingForwardLinks,
    CreatingBackLinks,
    Done,
    PartiallyFailed,
}

/// Result of one back-link comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackLinkOutcome {
    pub kind: ArtifactKind,
    /// Commit sha or issue/request number.
    pub id: String,
    pub url: String,
    pub error: Option<ConnectorError>,
}

impl BackLinkOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// `Done` or `PartiallyFailed`.
    pub state: SaveState,
    /// Every state the save passed through, starting at `Idle`.
    pub transitions: Vec<SaveState>,
    /// Issue created in place of the sentinel.
    pub created_issue: Option<CanonicalIssue>,
    pub issue_creation_error: Option<ConnectorError>,
    pub back_links: Vec<BackLinkOutcome>,
}

impl SaveReport {
    pub fn failed_back_links(&self) -> impl Iterator<Item = &BackLinkOutcome> {
        self.back_links.iter().filter(|outcome| !outcome.is_ok())
    }
}

/// Sequences one save: optional issue creation, forward-link persistence,
/// then concurrent back-link comments.
///
/// Persisting the forward links is the commit point. If it fails nothing is
/// posted to the host; once it succeeds, back-link failures are collected
/// into the report and never retried or rolled back.
pub struct LinkOrchestrator<'a> {
    host: &'a dyn GitHost,
    service: &'a dyn WorkItemService,
}

struct Progress {
    transitions: Vec<SaveState>,
}

impl Progress {
    fn new() -> Self {
        Self {
            transitions: vec![SaveState::Idle],
        }
    }

    fn enter(&mut self, state: SaveState) {
        debug!("Save state: {state:?}");
        self.transitions.push(state);
    }
}

impl<'a> LinkOrchestrator<'a> {
    pub fn new(host: &'a dyn GitHost, service: &'a dyn WorkItemService) -> Self {
        Self { host, service }
    }

    pub async fn save(
        &self,
        access: &RepoAccess,
        work_item: &WorkItem,
        mut selection: LinkSelection,
    ) -> Result<SaveReport> {
        // Nothing is created or persisted for a repository without owner/name.
        access.repo.url_info().joined_id()?;

        let mut progress = Progress::new();
        let mut created_issue = None;
        let mut issue_creation_error = None;

        if selection.wants_new_issue() {
            progress.enter(SaveState::CreatingIssue);
            selection
                .issues
                .retain(|issue| !issue.is_new_issue_sentinel());
            match self.host.create_issue(access, work_item).await {
                Ok(issue) => {
                    info!("Created issue {} for work item {}", issue.url(), work_item.id);
                    selection.issues.push(issue.clone());
                    created_issue = Some(issue);
                }
                Err(e) => {
                    warn!("Continuing the save without the new issue: {e}");
                    issue_creation_error = Some(e);
                }
            }
        }

        progress.enter(SaveState::PersistingForwardLinks);
        if !selection.is_empty() {
            self.service
                .add_links_to_work_item(work_item, &access.repo, &selection)
                .await
                .map_err(as_service_error)?;
            self.service
                .save_links_in_work_item(work_item)
                .await
                .map_err(as_service_error)?;
        }

        progress.enter(SaveState::CreatingBackLinks);
        let back_links = self.create_back_links(access, work_item, &selection).await;

        let state = if back_links.iter().all(BackLinkOutcome::is_ok) {
            SaveState::Done
        } else {
            SaveState::PartiallyFailed
        };
        progress.enter(state);
        info!(
            "Linked {} artifact(s) to work item {} ({state:?})",
            selection.len(),
            work_item.id
        );

        Ok(SaveReport {
            state,
            transitions: progress.transitions,
            created_issue,
            issue_creation_error,
            back_links,
        })
    }

    async fn create_back_links(
        &self,
        access: &RepoAccess,
        work_item: &WorkItem,
        selection: &LinkSelection,
    ) -> Vec<BackLinkOutcome> {
        if selection.is_empty() {
            return Vec::new();
        }

        let user = match self.service.current_user_id().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Couldn't determine the current RTC user: {e}");
                None
            }
        };
        let link = BackLink::new(work_item, user.as_deref());
        let link = &link;

        let mut tasks: Vec<((ArtifactKind, String, String), BoxFuture<'_, Result<()>>)> =
            Vec::with_capacity(selection.len());
        for commit in &selection.commits {
            tasks.push((
                (ArtifactKind::Commit, commit.sha().to_string(), commit.url().to_string()),
                self.host.add_comment_to_commit(access, commit.sha(), link),
            ));
        }
        for issue in &selection.issues {
            tasks.push((
                (ArtifactKind::Issue, issue.id().to_string(), issue.url().to_string()),
                self.host.add_comment_to_issue(access, issue.id(), link),
            ));
        }
        for request in &selection.requests {
            tasks.push((
                (ArtifactKind::Request, request.id().to_string(), request.url().to_string()),
                self.host.add_comment_to_request(access, request.id(), link),
            ));
        }

        gather_all(tasks)
            .await
            .into_iter()
            .map(|((kind, id, url), result)| {
                if let Err(e) = &result {
                    warn!("Back-link on {url} failed: {e}");
                }
                BackLinkOutcome {
                    kind,
                    id,
                    url,
                    error: result.err(),
                }
            })
            .collect()
    }
}

pub(crate) fn as_service_error(error: ConnectorError) -> ConnectorError {
    match error {
        ConnectorError::WorkItemService(_) => error,
        other => ConnectorError::WorkItemService(other.to_string()),
    }
}
