use async_trait::async_trait;
use rtcgit_core::{AccessToken, LinkedUrls, RepositoryReference, Result, WorkItem};

use crate::orchestrator::LinkSelection;

/// The RTC side of the connector: repository registry, token storage and
/// forward-link persistence inside work items.
///
/// Implementations should report their own failures as
/// [`ConnectorError::WorkItemService`](rtcgit_core::ConnectorError::WorkItemService).
#[async_trait]
pub trait WorkItemService: Send + Sync {
    async fn registered_repositories(
        &self,
        project_area_id: &str,
    ) -> Result<Vec<RepositoryReference>>;

    /// `None` when RTC cannot tell who is logged in.
    async fn current_user_id(&self) -> Result<Option<String>>;

    /// Token stored for a host origin such as `https://github.com`.
    async fn access_token_by_host(&self, host_origin: &str) -> Result<Option<AccessToken>>;

    async fn save_access_token_by_host(&self, host_origin: &str, token: &AccessToken)
    -> Result<()>;

    /// Artifact URLs the work item already links to.
    async fn linked_artifact_urls(&self, work_item: &WorkItem) -> Result<LinkedUrls>;

    /// Stage forward links in the work item. Nothing is durable until
    /// [`save_links_in_work_item`](Self::save_links_in_work_item) succeeds.
    async fn add_links_to_work_item(
        &self,
        work_item: &WorkItem,
        repo: &RepositoryReference,
        links: &LinkSelection,
    ) -> Result<()>;

    async fn save_links_in_work_item(&self, work_item: &WorkItem) -> Result<()>;
}
