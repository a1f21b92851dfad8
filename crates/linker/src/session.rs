use std::sync::Arc;

use rtcgit_core::{
    AccessToken, CanonicalCommit, CanonicalIssue, CanonicalRequest, ConnectorError, GitHostKind,
    LinkedUrls, RepositoryReference, Result, WorkItem,
};
use rtcgit_host_client::{GitHost, RepoAccess};
use tracing::{debug, info, warn};

use crate::orchestrator::as_service_error;
use crate::probe::HostProbe;
use crate::service::WorkItemService;

/// Proof of which repository selection an in-flight request belongs to.
///
/// Results are applied through a ticket; once the user selects another
/// repository the ticket is stale and its result is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
    repository: RepositoryReference,
}

impl SelectionTicket {
    pub fn repository(&self) -> &RepositoryReference {
        &self.repository
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// A validated token is cached in the session.
    Valid,
    /// No usable token is stored; the user has to enter one.
    NeedsPrompt,
}

/// Artifacts fetched for one snapshot of the work item's links.
#[derive(Debug)]
struct Listing<T> {
    linked: LinkedUrls,
    items: Vec<T>,
}

impl<T> Listing<T> {
    fn is_fresh(slot: &Option<Self>, linked: &LinkedUrls) -> bool {
        slot.as_ref().is_some_and(|listing| listing.linked == *linked)
    }

    fn items(slot: &Option<Self>) -> &[T] {
        slot.as_ref().map(|listing| listing.items.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct ResultCache {
    commits: Option<Listing<CanonicalCommit>>,
    issues: Option<Listing<CanonicalIssue>>,
    requests: Option<Listing<CanonicalRequest>>,
}

/// State of one work-item editing session: the selected repository, its
/// detected host, the validated token and the artifacts fetched so far.
///
/// Nothing here is shared between sessions. [`teardown`](Self::teardown)
/// ends the session.
pub struct SessionContext {
    service: Arc<dyn WorkItemService>,
    probe: Arc<dyn HostProbe>,
    generation: u64,
    repository: Option<RepositoryReference>,
    host: GitHostKind,
    token: Option<AccessToken>,
    results: ResultCache,
    closed: bool,
}

impl SessionContext {
    pub fn new(service: Arc<dyn WorkItemService>, probe: Arc<dyn HostProbe>) -> Self {
        Self {
            service,
            probe,
            generation: 0,
            repository: None,
            host: GitHostKind::Unknown,
            token: None,
            results: ResultCache::default(),
            closed: false,
        }
    }

    pub async fn registered_repositories(
        &self,
        project_area_id: &str,
    ) -> Result<Vec<RepositoryReference>> {
        self.ensure_open()?;
        self.service.registered_repositories(project_area_id).await
    }

    /// Replace the selection. Host, token and cached results of the previous
    /// repository are dropped and outstanding tickets become stale.
    pub fn select_repository(&mut self, repository: RepositoryReference) -> Result<SelectionTicket> {
        self.ensure_open()?;
        self.generation += 1;
        debug!("Selected {} (generation {})", repository.url, self.generation);
        self.repository = Some(repository);
        self.host = GitHostKind::Unknown;
        self.token = None;
        self.results = ResultCache::default();
        self.ticket()
    }

    pub fn selected_repository(&self) -> Option<&RepositoryReference> {
        self.repository.as_ref()
    }

    pub fn host(&self) -> GitHostKind {
        self.host
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn ticket(&self) -> Result<SelectionTicket> {
        self.ensure_open()?;
        let repository = self
            .repository
            .clone()
            .ok_or(ConnectorError::NoRepositorySelected)?;
        Ok(SelectionTicket {
            generation: self.generation,
            repository,
        })
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        !self.closed && ticket.generation == self.generation
    }

    /// Record a detection result. Returns `false` (and changes nothing) when
    /// the ticket is stale.
    pub fn apply_host(&mut self, ticket: &SelectionTicket, kind: GitHostKind) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale host detection for {}", ticket.repository.url);
            return false;
        }
        self.host = kind;
        true
    }

    /// Cache an already validated token. Returns `false` when the ticket is stale.
    pub fn apply_token(&mut self, ticket: &SelectionTicket, token: AccessToken) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale token for {}", ticket.repository.url);
            return false;
        }
        self.token = Some(token);
        true
    }

    pub async fn detect_host(&mut self) -> Result<GitHostKind> {
        let ticket = self.ticket()?;
        let kind = self.probe.detect(ticket.repository()).await;
        self.apply_host(&ticket, kind);
        info!("{} is hosted on {kind}", ticket.repository.url);
        Ok(kind)
    }

    /// Look up the stored token for the selected host and validate it.
    pub async fn load_token(&mut self) -> Result<TokenStatus> {
        let ticket = self.ticket()?;
        let (kind, origin) = self.token_target(&ticket)?;

        let stored = self.service.access_token_by_host(&origin).await?;
        let Some(token) = stored.filter(|token| !token.is_empty()) else {
            debug!("No stored token for {origin}");
            return Ok(TokenStatus::NeedsPrompt);
        };

        if self.probe.validate_token(kind, &origin, &token).await? {
            self.apply_token(&ticket, token);
            Ok(TokenStatus::Valid)
        } else {
            warn!("Stored token for {origin} was rejected by {kind}");
            Ok(TokenStatus::NeedsPrompt)
        }
    }

    /// Validate a token the user entered. A valid token is cached and stored
    /// through the work item service; an invalid one is dropped.
    pub async fn submit_token(&mut self, token: AccessToken) -> Result<bool> {
        let ticket = self.ticket()?;
        let (kind, origin) = self.token_target(&ticket)?;
        if token.is_empty() || !self.probe.validate_token(kind, &origin, &token).await? {
            return Ok(false);
        }

        if let Err(e) = self.service.save_access_token_by_host(&origin, &token).await {
            warn!("Couldn't store the access token for {origin}: {e}");
        }
        Ok(self.apply_token(&ticket, token))
    }

    /// The selected repository and its validated token.
    pub fn access(&self) -> Result<RepoAccess> {
        let ticket = self.ticket()?;
        if !self.host.is_supported() {
            return Err(ConnectorError::UnsupportedHost(self.host));
        }
        let token = self.token.clone().ok_or_else(|| {
            ConnectorError::MissingAccessToken(ticket.repository.url_info().origin().to_string())
        })?;
        Ok(RepoAccess::new(ticket.repository, token))
    }

    /// Recent commits of the selected repository, flagged against what
    /// `work_item` links to right now. The listing is reused until those
    /// links change.
    pub async fn recent_commits(
        &mut self,
        host: &dyn GitHost,
        work_item: &WorkItem,
    ) -> Result<&[CanonicalCommit]> {
        let access = self.checked_access(host)?;
        let linked = self.linked_urls(work_item).await?;
        if !Listing::is_fresh(&self.results.commits, &linked) {
            let items = host.list_recent_commits(&access, &linked).await?;
            self.results.commits = Some(Listing { linked, items });
        }
        Ok(Listing::items(&self.results.commits))
    }

    /// Like [`recent_commits`](Self::recent_commits); ends with the
    /// "create a new issue" entry.
    pub async fn recent_issues(
        &mut self,
        host: &dyn GitHost,
        work_item: &WorkItem,
    ) -> Result<&[CanonicalIssue]> {
        let access = self.checked_access(host)?;
        let linked = self.linked_urls(work_item).await?;
        if !Listing::is_fresh(&self.results.issues, &linked) {
            let items = host.list_recent_issues(&access, &linked).await?;
            self.results.issues = Some(Listing { linked, items });
        }
        Ok(Listing::items(&self.results.issues))
    }

    pub async fn recent_requests(
        &mut self,
        host: &dyn GitHost,
        work_item: &WorkItem,
    ) -> Result<&[CanonicalRequest]> {
        let access = self.checked_access(host)?;
        let linked = self.linked_urls(work_item).await?;
        if !Listing::is_fresh(&self.results.requests, &linked) {
            let items = host.list_recent_requests(&access, &linked).await?;
            self.results.requests = Some(Listing { linked, items });
        }
        Ok(Listing::items(&self.results.requests))
    }

    /// Forget fetched artifacts so the next listing goes back to the host.
    pub fn clear_results(&mut self) {
        self.results = ResultCache::default();
    }

    pub fn teardown(&mut self) {
        debug!("Tearing down linking session");
        self.closed = true;
        self.generation += 1;
        self.repository = None;
        self.host = GitHostKind::Unknown;
        self.token = None;
        self.results = ResultCache::default();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ConnectorError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn token_target(&self, ticket: &SelectionTicket) -> Result<(GitHostKind, String)> {
        if !self.host.is_supported() {
            return Err(ConnectorError::InvalidHost(self.host));
        }
        let info = ticket.repository.url_info();
        if info.origin().is_empty() {
            return Err(ConnectorError::InvalidRepositoryUrl(
                ticket.repository.url.clone(),
            ));
        }
        Ok((self.host, info.origin().to_string()))
    }

    async fn linked_urls(&self, work_item: &WorkItem) -> Result<LinkedUrls> {
        self.service
            .linked_artifact_urls(work_item)
            .await
            .map_err(as_service_error)
    }

    fn checked_access(&self, host: &dyn GitHost) -> Result<RepoAccess> {
        let access = self.access()?;
        if host.kind() != self.host {
            return Err(ConnectorError::UnsupportedHost(host.kind()));
        }
        Ok(access)
    }
}
