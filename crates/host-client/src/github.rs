use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use rtcgit_core::native::github;
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

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_RAW: &str = "application/vnd.github.raw";

#[derive(Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Client for the public GitHub REST API. Requests go direct, never through
/// the proxy.
pub struct GitHubClient {
    http: HostHttp,
    api_url: String,
    linking: LinkingSettings,
    renderer: Arc<dyn TemplateRenderer>,
}

struct Repo {
    owner: String,
    name: String,
}

impl GitHubClient {
    pub fn new(
        http: HostHttp,
        config: &ConnectorConfig,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            http,
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            linking: config.linking.clone(),
            renderer,
        }
    }

    fn repo_url(&self, repo: &Repo, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path
        )
    }

    fn get(&self, url: &str, access: &RepoAccess) -> reqwest::RequestBuilder {
        self.get_as(url, access, GITHUB_JSON)
    }

    fn get_as(&self, url: &str, access: &RepoAccess, media_type: &str) -> reqwest::RequestBuilder {
        debug!("GitHub GET {url}");
        self.http
            .client()
            .get(url)
            .bearer_auth(access.token.expose())
            .header(ACCEPT, media_type)
    }

    fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        access: &RepoAccess,
        body: &T,
    ) -> reqwest::RequestBuilder {
        debug!("GitHub POST {url}");
        self.http
            .client()
            .post(url)
            .bearer_auth(access.token.expose())
            .header(ACCEPT, GITHUB_JSON)
            .json(body)
    }

    async fn fetch_issue_template(&self, access: &RepoAccess, repo: &Repo) -> Result<String> {
        let action = "Couldn't get the issue template from GitHub";
        let path = format!(
            "/contents/.github/ISSUE_TEMPLATE/{}",
            urlencoding::encode(&self.linking.issue_template_name)
        );
        let resp = self
            .get_as(&self.repo_url(repo, &path), access, GITHUB_RAW)
            .send()
            .await
            .map_err(send_failed(action))?;
        response_text(resp, action).await
    }

    async fn comment_on_issue_or_request(
        &self,
        access: &RepoAccess,
        id: i64,
        message: &str,
    ) -> Result<()> {
        let action = "Couldn't add a comment to the GitHub issue or pull request";
        let repo = parse_repo(access)?;
        let number = u64::try_from(id)
            .map_err(|_| ConnectorError::request_failed(action, format!("invalid number {id}")))?;
        let url = self.repo_url(&repo, &format!("/issues/{number}/comments"));
        let resp = self
            .post(&url, access, &CommentBody { body: message })
            .send()
            .await
            .map_err(send_failed(action))?;
        expect_success(resp, action).await
    }
}

fn parse_repo(access: &RepoAccess) -> Result<Repo> {
    let info = access.repo.url_info();
    let (owner, name) = info.owner_repo()?;
    Ok(Repo {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

#[async_trait]
impl GitHost for GitHubClient {
    fn kind(&self) -> GitHostKind {
        GitHostKind::GitHub
    }

    async fn list_recent_commits(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalCommit>> {
        let action = "Couldn't get the commits from the GitHub repository";
        let repo = parse_repo(access)?;
        let url = self.repo_url(
            &repo,
            &format!("/commits?per_page={}", self.linking.page_size),
        );
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let commits: Vec<github::Commit> = parse_response(resp, action).await?;
        Ok(commits
            .iter()
            .map(|commit| CanonicalCommit::from_github(commit, linked))
            .collect())
    }

    async fn list_recent_issues(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalIssue>> {
        let action = "Couldn't get the issues from the GitHub repository";
        let repo = parse_repo(access)?;
        let url = self.repo_url(
            &repo,
            &format!("/issues?state=all&per_page={}", self.linking.page_size),
        );
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let issues: Vec<github::Issue> = parse_response(resp, action).await?;

        // The issues endpoint also lists pull requests.
        let mut converted: Vec<CanonicalIssue> = issues
            .iter()
            .filter(|issue| !issue.is_pull_request())
            .map(|issue| CanonicalIssue::from_github(issue, linked))
            .collect();
        converted.push(CanonicalIssue::new_issue_sentinel(GitHostKind::GitHub));
        Ok(converted)
    }

    async fn list_recent_requests(
        &self,
        access: &RepoAccess,
        linked: &LinkedUrls,
    ) -> Result<Vec<CanonicalRequest>> {
        let action = "Couldn't get the pull requests from the GitHub repository";
        let repo = parse_repo(access)?;
        let url = self.repo_url(
            &repo,
            &format!("/pulls?state=all&per_page={}", self.linking.page_size),
        );
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let requests: Vec<github::PullRequest> = parse_response(resp, action).await?;
        Ok(requests
            .iter()
            .map(|request| CanonicalRequest::from_github(request, linked))
            .collect())
    }

    async fn get_commit_by_id(
        &self,
        access: &RepoAccess,
        sha: &str,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalCommit>> {
        let action = "Couldn't get the commit from the GitHub repository";
        let repo = parse_repo(access)?;
        let sha = sha.trim();
        if sha.is_empty() {
            return Ok(None);
        }
        let url = self.repo_url(&repo, &format!("/commits/{}", urlencoding::encode(sha)));
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        // An unknown sha is reported as 422 rather than 404.
        if resp.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Ok(None);
        }
        let commit: Option<github::Commit> = parse_optional(resp, action).await?;
        Ok(commit.map(|commit| CanonicalCommit::from_github(&commit, linked)))
    }

    async fn get_issue_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalIssue>> {
        let action = "Couldn't get the issue from the GitHub repository";
        let repo = parse_repo(access)?;
        let Some(number) = positive_id(id) else {
            return Ok(None);
        };
        let url = self.repo_url(&repo, &format!("/issues/{number}"));
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let issue: Option<github::Issue> = parse_optional(resp, action).await?;
        Ok(issue
            .filter(|issue| !issue.is_pull_request())
            .map(|issue| CanonicalIssue::from_github(&issue, linked)))
    }

    async fn get_request_by_id(
        &self,
        access: &RepoAccess,
        id: i64,
        linked: &LinkedUrls,
    ) -> Result<Option<CanonicalRequest>> {
        let action = "Couldn't get the pull request from the GitHub repository";
        let repo = parse_repo(access)?;
        let Some(number) = positive_id(id) else {
            return Ok(None);
        };
        let url = self.repo_url(&repo, &format!("/pulls/{number}"));
        let resp = self
            .get(&url, access)
            .send()
            .await
            .map_err(send_failed(action))?;
        let request: Option<github::PullRequest> = parse_optional(resp, action).await?;
        Ok(request.map(|request| CanonicalRequest::from_github(&request, linked)))
    }

    async fn create_issue(
        &self,
        access: &RepoAccess,
        work_item: &WorkItem,
    ) -> Result<CanonicalIssue> {
        let repo = parse_repo(access)?;
        let template = template_or_default(self.fetch_issue_template(access, &repo).await);
        let body = self.renderer.render(&template, work_item);
        let labels = issue_labels(work_item, &self.linking.marker_label);

        let action = "Couldn't create an issue in the GitHub repository";
        let created = async {
            let resp = self
                .post(
                    &self.repo_url(&repo, "/issues"),
                    access,
                    &CreateIssueBody {
                        title: &work_item.summary,
                        body: &body,
                        labels: &labels,
                    },
                )
                .send()
                .await
                .map_err(send_failed(action))?;
            parse_response::<github::Issue>(resp, action).await
        }
        .await;

        match created {
            Ok(issue) => Ok(CanonicalIssue::from_github(&issue, &LinkedUrls::new())),
            Err(ConnectorError::HostRequestFailed { message, .. }) => {
                Err(ConnectorError::IssueCreationFailed {
                    host: GitHostKind::GitHub,
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
        let action = "Couldn't add a comment to the GitHub commit";
        let repo = parse_repo(access)?;
        let url = self.repo_url(
            &repo,
            &format!("/commits/{}/comments", urlencoding::encode(sha)),
        );
        let message = link.message(ArtifactKind::Commit, GitHostKind::GitHub);
        let resp = self
            .post(&url, access, &CommentBody { body: &message })
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
        let message = link.message(ArtifactKind::Issue, GitHostKind::GitHub);
        self.comment_on_issue_or_request(access, id, &message).await
    }

    /// Pull requests take comments through the issue-comment endpoint.
    async fn add_comment_to_request(
        &self,
        access: &RepoAccess,
        id: i64,
        link: &BackLink,
    ) -> Result<()> {
        let message = link.message(ArtifactKind::Request, GitHostKind::GitHub);
        self.comment_on_issue_or_request(access, id, &message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Routing;
    use crate::template::PlaceholderRenderer;
    use httpmock::prelude::*;
    use rtcgit_core::{AccessToken, RepositoryReference, testing};
    use serde_json::json;

    fn client(server: &MockServer) -> GitHubClient {
        let mut config = ConnectorConfig::default();
        config.github.api_url = server.base_url();
        let http = HostHttp::with_client(reqwest::Client::new(), Routing::Direct);
        GitHubClient::new(http, &config, Arc::new(PlaceholderRenderer))
    }

    fn access() -> RepoAccess {
        RepoAccess::new(
            RepositoryReference::new("https://github.com/acme/widget.git"),
            AccessToken::new("ghp_test"),
        )
    }

    #[tokio::test]
    async fn lists_commits_with_linked_flags() {
        let server = MockServer::start_async().await;
        let commits_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/widget/commits")
                    .query_param("per_page", "100")
                    .header("authorization", "Bearer ghp_test")
                    .header("accept", GITHUB_JSON);
                then.status(200).json_body(json!([
                    testing::github_commit_json("aaa", "first"),
                    testing::github_commit_json("bbb", "second"),
                ]));
            })
            .await;

        let linked: LinkedUrls = ["https://github.com/acme/widget/commit/bbb"]
            .into_iter()
            .collect();
        let commits = client(&server)
            .list_recent_commits(&access(), &linked)
            .await
            .expect("list commits");

        assert_eq!(commits.len(), 2);
        assert!(!commits[0].already_linked());
        assert!(commits[1].already_linked());
        commits_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn issue_listing_drops_pull_requests_and_appends_sentinel() {
        let server = MockServer::start_async().await;
        let issues_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/widget/issues")
                    .query_param("state", "all")
                    .query_param("per_page", "100");
                then.status(200).json_body(json!([
                    testing::github_issue_json(1, "Bug"),
                    testing::github_issue_pull_request_json(2, "PR"),
                    testing::github_issue_json(3, "Another bug"),
                ]));
            })
            .await;

        let issues = client(&server)
            .list_recent_issues(&access(), &LinkedUrls::new())
            .await
            .expect("list issues");

        let ids: Vec<i64> = issues.iter().map(CanonicalIssue::id).collect();
        assert_eq!(ids, vec![1, 3, -1]);
        assert_eq!(
            issues.iter().filter(|issue| issue.is_new_issue_sentinel()).count(),
            1
        );
        issues_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn listing_failure_carries_action_and_host_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widget/pulls");
                then.status(403)
                    .json_body(json!({ "message": "Bad credentials" }));
            })
            .await;

        let err = client(&server)
            .list_recent_requests(&access(), &LinkedUrls::new())
            .await
            .expect_err("forbidden");
        assert_eq!(
            err.to_string(),
            "Couldn't get the pull requests from the GitHub repository. Error: Bad credentials"
        );
    }

    #[tokio::test]
    async fn invalid_repository_url_fails_before_any_request() {
        let server = MockServer::start_async().await;
        let any_request = server
            .mock_async(|_when, then| {
                then.status(500);
            })
            .await;
        let access = RepoAccess::new(
            RepositoryReference::new("https://github.com/acme"),
            AccessToken::new("ghp_test"),
        );

        let err = client(&server)
            .list_recent_commits(&access, &LinkedUrls::new())
            .await
            .expect_err("invalid url");
        assert!(matches!(err, ConnectorError::InvalidRepositoryUrl(_)));
        any_request.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn non_positive_number_resolves_to_none_without_request() {
        let server = MockServer::start_async().await;
        let any_request = server
            .mock_async(|_when, then| {
                then.status(500);
            })
            .await;

        let issue = client(&server)
            .get_issue_by_id(&access(), 0, &LinkedUrls::new())
            .await
            .expect("lookup");
        assert!(issue.is_none());
        any_request.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn deleted_issue_resolves_to_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widget/issues/9");
                then.status(410)
                    .json_body(json!({ "message": "This issue was deleted" }));
            })
            .await;

        let issue = client(&server)
            .get_issue_by_id(&access(), 9, &LinkedUrls::new())
            .await
            .expect("lookup must not fail");
        assert!(issue.is_none());
    }

    #[tokio::test]
    async fn issue_lookup_ignores_pull_requests() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widget/issues/2");
                then.status(200)
                    .json_body(testing::github_issue_pull_request_json(2, "PR"));
            })
            .await;

        let issue = client(&server)
            .get_issue_by_id(&access(), 2, &LinkedUrls::new())
            .await
            .expect("lookup");
        assert!(issue.is_none());
    }

    #[tokio::test]
    async fn existing_request_is_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widget/pulls/5");
                then.status(200)
                    .json_body(testing::github_pull_request_json(5, "Refactor"));
            })
            .await;

        let request = client(&server)
            .get_request_by_id(&access(), 5, &LinkedUrls::new())
            .await
            .expect("lookup")
            .expect("found");
        assert_eq!(request.id(), 5);
        assert_eq!(request.title(), "Refactor");
    }

    #[tokio::test]
    async fn missing_commit_resolves_to_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widget/commits/nope");
                then.status(422)
                    .json_body(json!({ "message": "No commit found for SHA: nope" }));
            })
            .await;

        let commit = client(&server)
            .get_commit_by_id(&access(), "nope", &LinkedUrls::new())
            .await
            .expect("lookup");
        assert!(commit.is_none());
    }

    #[tokio::test]
    async fn create_issue_falls_back_to_default_template() {
        let server = MockServer::start_async().await;
        let template_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/widget/contents/.github/ISSUE_TEMPLATE/rtc-work-item-v1.md")
                    .header("accept", GITHUB_RAW);
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;
        let create_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/widget/issues")
                    .json_body_includes(
                        json!({
                            "title": "Widget crashes on save",
                            "labels": ["backend", "urgent", "from-rtc-work-item"],
                        })
                        .to_string(),
                    )
                    .body_includes("RTC Work Item 42");
                then.status(201)
                    .json_body(testing::github_issue_json(77, "Widget crashes on save"));
            })
            .await;

        let issue = client(&server)
            .create_issue(&access(), &testing::work_item())
            .await
            .expect("create issue");
        assert_eq!(issue.id(), 77);
        template_mock.assert_calls_async(1).await;
        create_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn create_issue_uses_repository_template() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/widget/contents/.github/ISSUE_TEMPLATE/rtc-work-item-v1.md");
                then.status(200)
                    .header("content-type", "text/plain; charset=utf-8")
                    .body("Custom template for {{summary}}");
            })
            .await;
        let create_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/repos/acme/widget/issues").json_body_includes(
                    json!({ "body": "Custom template for Widget crashes on save" }).to_string(),
                );
                then.status(201)
                    .json_body(testing::github_issue_json(78, "Widget crashes on save"));
            })
            .await;

        client(&server)
            .create_issue(&access(), &testing::work_item())
            .await
            .expect("create issue");
        create_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn create_issue_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/repos/acme/widget/issues");
                then.status(410)
                    .json_body(json!({ "message": "Issues are disabled for this repo" }));
            })
            .await;

        let err = client(&server)
            .create_issue(&access(), &testing::work_item())
            .await
            .expect_err("issues disabled");
        assert_eq!(
            err,
            ConnectorError::IssueCreationFailed {
                host: GitHostKind::GitHub,
                message: "Issues are disabled for this repo".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn back_link_comments_hit_expected_endpoints() {
        let server = MockServer::start_async().await;
        let commit_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/widget/commits/abc/comments")
                    .body_includes("This commit was linked by [RTC Work Item 42]");
                then.status(201).json_body(json!({ "id": 1 }));
            })
            .await;
        let issue_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/widget/issues/3/comments")
                    .body_includes("This issue was linked by [RTC Work Item 42]");
                then.status(201).json_body(json!({ "id": 2 }));
            })
            .await;
        let request_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/widget/issues/4/comments")
                    .body_includes("This pull request was linked by [RTC Work Item 42]");
                then.status(201).json_body(json!({ "id": 3 }));
            })
            .await;
        let client = client(&server);
        let link = BackLink::new(&testing::work_item(), Some("jdoe"));

        client
            .add_comment_to_commit(&access(), "abc", &link)
            .await
            .expect("commit comment");
        client
            .add_comment_to_issue(&access(), 3, &link)
            .await
            .expect("issue comment");
        client
            .add_comment_to_request(&access(), 4, &link)
            .await
            .expect("request comment");

        commit_mock.assert_calls_async(1).await;
        issue_mock.assert_calls_async(1).await;
        request_mock.assert_calls_async(1).await;
    }
}
