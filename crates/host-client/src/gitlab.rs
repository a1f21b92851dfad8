use std::sync::Arc;

use async_trait::async_trait;
use rtcgit_core::native::gitlab;
use rtcgit_core::{
    ArtifactKind, CanonicalCommit, CanonicalIssue, CanonicalRequest, ConnectorError, GitHostKind,
    LinkedUrls, Result, WorkItem,
};
use rtcgit_runtime_config::{ConnectorConfig, LinkingSettings};
use serde::Serialize;
use tracing::debug;

use crate::comment::BackLink;
use crate::host::{GitHost, RepoAccess, positive_id};
use crate::http::{
    HostHttp, expect_success, parse_optional, parse_response, response_text, send_failed,
};
use crate::template::{TemplateRenderer, issue_labels, template_or_default};

const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";
const ISSUE_TEMPLATE_DIR: &str = ".gitlab/issue_templates";

#[derive(Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    description: &'a str,
    /// GitLab takes labels as one comma-separated string.
    labels: String,
}

#[derive(Serialize)]
struct NoteBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct CommitNoteBody<'a> {
    note: &'a str,
}

/// Client for self-hosted or gitlab.com GitLab instances (API v4).
///
/// The API base is derived from each repository's origin, so one client
/// serves every GitLab server. Requests honor the configured [`Routing`].
///
/// [`Routing`]: crate::routing::Routing
pub struct GitLabClient {
    http: HostHttp,
    api_path: String,
    template_ref: String,
    linking: LinkingSettings,
    renderer: Arc<dyn TemplateRenderer>,
}

/// Everything derived from the repository URL that a request needs.
struct Project {
    /// `{origin}{api_path}/projects/{url-encoded group/repo}`
    api_base: String,
    web_url: String,
}

impl GitLabClient {
    pub fn new(
        http: HostHttp,
        config: &ConnectorConfig,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            http,
            api_path: config.gitlab.api_path.trim_end_matches('/').to_string(),
            template_ref: config.gitlab.template_ref.clone(),
            linking: config.linking.clone(),
            renderer,
        }
    }

    fn project(&self, access: &RepoAccess) -> Result<Project> {
        let info = access.repo.url_info();
        let joined = info.joined_id()?;
        Ok(Project {
            api_base: format!(
                "{}{}/projects/{}",
                info.origin(),
                self.api_path,
                urlencoding::encode(&joined)
            ),
            web_url: info.web_url()?,
        })
    }

    fn get(&self, target: &str, access: &RepoAccess) -> reqwest::RequestBuilder {
        debug!("GitLab GET {target}");
        self.http
            .client()
            .get(self.http.routing().request_url(target))
            .header(PRIVATE_TOKEN, access.token.expose())
    }

    fn post<T: Serialize + ?Sized>(
        &self,
        target: &str,
        access: &RepoAccess,
        body: &T,
    ) -> reqwest::RequestBuilder {
        debug!("GitLab POST {target}");
        self.http
            .client()
            .post(self.http.routing().request_url(target))
            .header(PRIVATE_TOKEN, access.token.expose())
            .json(body)
    }

    async fn fetch_issue_template(&self, access: &RepoAccess, project: &Project) -> Result<String> {
        let action = "Couldn't get the issue template from GitLab";
        let file = format!("{ISSUE_TEMPLATE_DIR}/{}", self.linking.issue_template_name);
        let target = format!(
            "{}/repository/files/{}/raw?ref={}",
            project.api_base,
            urlencoding::encode(&file),
            urlencoding::encode(&self.template_ref)
        );
        let resp = self
            .get(&target, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        response_text(resp, action).await
    }

    async fn add_note(
        &self,
        access: &RepoAccess,
        collection: &str,
        id: i64,
        message: &str,
        action: &str,
    ) -> Result<()> {
        let project = self.project(access)?;
        let iid = u64::try_from(id)
            .map_err(|_| ConnectorError::request_failed(action, format!("invalid iid {id}")))?;
        let target = format!("{}/{collection}/{iid}/notes", project.api_base);
        let resp = self
            .post(&target, access, &NoteBody { body: message })
            .send()
            .await
            .map_err(send_failed(action))?;
        expect_success(resp, action).await
    }
}

#[async_trait]
impl GitHost for GitLabClient {
    fn kind(&self) -> GitHostKind {
        GitHostKind::GitLab
    }

    async fn list_recent_commits(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalCommit>> {
        let action = "Couldn't get the commits from the GitLab repository";
        let project = self.project(access)?;
        let target = format!(
            "{}/repository/commits?per_page={}",
            project.api_base, self.linking.page_size
        );
        let resp = self
            .get(&target, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let commits: Vec<gitlab::Commit> = parse_response(resp, action).await?;
        Ok(commits
            .iter()
            .map(|commit| CanonicalCommit::from_gitlab(commit, &project.web_url, linked))
            .collect())
    }

    async fn list_recent_issues(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalIssue>> {
        let action = "Couldn't get the issues from the GitLab repository";
        let project = self.project(access)?;
        let target = format!(
            "{}/issues?per_page={}",
            project.api_base, self.linking.page_size
        );
        let resp = self
            .get(&target, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let issues: Vec<gitlab::Issue> = parse_response(resp, action).await?;
        let mut converted: Vec<CanonicalIssue> = issues
            .iter()
            .map(|issue| CanonicalIssue::from_gitlab(issue, linked))
            .collect();
        converted.push(CanonicalIssue::new_issue_sentinel(GitHostKind::GitLab));
        Ok(converted)
    }

    async fn list_recent_requests(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalRequest>> {
        let action = "Couldn't get the merge requests from the GitLab repository";
        let project = self.project(access)?;
        let target = format!(
            "{}/merge_requests?per_page={}",
            project.api_base, self.linking.page_size
        );
        let resp = self
            .get(&target, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let requests: Vec<gitlab::MergeRequest> = parse_response(resp, action).await?;
        Ok(requests
            .iter()
            .map(|request| CanonicalRequest::from_gitlab(request, linked))
            .collect())
    }

    async fn get_commit_by_id(
        &self,
        access: &RepoAccess,
        sha: &str,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalCommit>> {
        let action = "Couldn't get the commit from the GitLab repository";
        let project = self.project(access)?;
        let sha = sha.trim();
        if sha.is_empty() {
            return Ok(None);
        }
        let target = format!(
            "{}/repository/commits/{}",
            project.api_base,
            urlencoding::encode(sha)
        );
        let resp = self
            .get(&target, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let commit: Option<gitlab::Commit> = parse_optional(resp, action).await?;
        Ok(commit.map(|commit| CanonicalCommit::from_gitlab(&commit, &project.web_url, linked)))
    }

    async fn get_issue_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalIssue>> {
        let action = "Couldn't get the issue from the GitLab repository";
        let project = self.project(access)?;
        let Some(iid) = positive_id(id) else {
            return Ok(None);
        };
        let resp = self
            .get(&format!("{}/issues/{iid}", project.api_base), access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let issue: Option<gitlab::Issue> = parse_optional(resp, action).await?;
        Ok(issue.map(|issue| CanonicalIssue::from_gitlab(&issue, linked)))
    }

    async fn get_request_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalRequest>> {
        let action = "Couldn't get the merge request from the GitLab repository";
        let project = self.project(access)?;
        let Some(iid) = positive_id(id) else {
            return Ok(None);
        };
        let resp = self
            .get(&format!("{}/merge_requests/{iid}", project.api_base), access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let request: Option<gitlab::MergeRequest> = parse_optional(resp, action).await?;
        Ok(request.map(|request| CanonicalRequest::from_gitlab(&request, linked)))
    }

    async fn create_issue(
        &self,
        access: &RepoAccess,
        work_item: &WorkItem,
    ) -> Result<CanonicalIssue> {
        let project = self.project(access)?;
        let template = template_or_default(self.fetch_issue_template(access, &project).await);
        let description = self.renderer.render(&template, work_item);
        let labels = issue_labels(work_item, &self.linking.marker_label).join(", ");

        let action = "Couldn't create an issue in the GitLab repository";
        let created = async {
            let resp = self
                .post(
                    &format!("{}/issues", project.api_base),
                    access,
                    &CreateIssueBody {
                        title: &work_item.summary,
                        description: &description,
                        labels,
                    },
                )
                .send()
                .await
                .map_err(send_failed(action))?;
            parse_response::<gitlab::Issue>(resp, action).await
        }
        .await;

        match created {
            Ok(issue) => Ok(CanonicalIssue::from_gitlab(&issue, &LinkedUrls::new())),
            Err(ConnectorError::HostRequestFailed { message, .. }) => {
                Err(ConnectorError::IssueCreationFailed {
                    host: GitHostKind::GitLab,
                    message,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn add_comment_to_commit(
        &self,
        access: &RepoAccess,
        sha: &str,
        link: &BackLink,
    ) -> Result<()> {
        let action = "Couldn't add a comment to the GitLab commit";
        let project = self.project(access)?;
        let target = format!(
            "{}/repository/commits/{}/comments",
            project.api_base,
            urlencoding::encode(sha)
        );
        let message = link.message(ArtifactKind::Commit, GitHostKind::GitLab);
        let resp = self
            .post(&target, access, &CommitNoteBody { note: &message })
            .send()
            .await
            .map_err(send_failed(action))?;
        expect_success(resp, action).await
    }

    async fn add_comment_to_issue(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        let message = link.message(ArtifactKind::Issue, GitHostKind::GitLab);
        self.add_note(
            access,
            "issues",
            id,
            &message,
            "Couldn't add a comment to the GitLab issue",
        )
        .await
    }

    async fn add_comment_to_request(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        let message = link.message(ArtifactKind::Request, GitHostKind::GitLab);
        self.add_note(
            access,
            "merge_requests",
            id,
            &message,
            "Couldn't add a comment to the GitLab merge request",
        )
        .await
    }
}
