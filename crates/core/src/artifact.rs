//! Host-independent commits, issues and pull/merge requests.
//!
//! Canonical values are only produced by converting a native GitHub or GitLab
//! shape (plus the "create a new issue" sentinel), so artifacts from both
//! hosts always carry the same fields.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::host::GitHostKind;
use crate::native::{github, gitlab};

/// Issue id reserved for the "create a new issue" entry.
pub const NEW_ISSUE_SENTINEL_ID: i64 = -1;

/// Opened date of the sentinel issue, far enough in the future to sort last.
pub const NEW_ISSUE_SENTINEL_DATE_MS: i64 = 4_684_608_000_000;

/// URLs already linked to the work item, as reported by RTC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedUrls(HashSet<String>);

impl LinkedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url.trim_end_matches('/'))
    }

    pub fn insert(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.0.insert(url.trim_end_matches('/').to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LinkedUrls {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut urls = Self::new();
        for url in iter {
            urls.insert(url);
        }
        urls
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Commit,
    Issue,
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCommit {
    sha: String,
    message: String,
    author: String,
    date: Option<DateTime<Utc>>,
    url: String,
    already_linked: bool,
}

impl CanonicalCommit {
    pub fn from_github(commit: &github::Commit, linked: &LinkedUrls) -> Self {
        let (author, date) = commit
            .commit
            .author
            .as_ref()
            .map(|author| (author.name.clone(), author.date))
            .unwrap_or_default();
        Self {
            sha: commit.sha.clone(),
            message: commit.commit.message.clone(),
            author,
            date,
            already_linked: linked.contains(&commit.html_url),
            url: commit.html_url.clone(),
        }
    }

    /// GitLab commit payloads carry no stable browser URL, so it is derived
    /// from the repository's web URL.
    pub fn from_gitlab(commit: &gitlab::Commit, repo_web_url: &str, linked: &LinkedUrls) -> Self {
        let url = format!(
            "{}/commit/{}",
            repo_web_url.trim_end_matches('/'),
            commit.id
        );
        Self {
            sha: commit.id.clone(),
            message: commit.message.clone(),
            author: commit.author_name.clone(),
            date: commit.authored_date.or(commit.committed_date),
            already_linked: linked.contains(&url),
            url,
        }
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }
    pub fn message(&self) -> &str {
        &self.message
    }
    pub fn author(&self) -> &str {
        &self.author
    }
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn already_linked(&self) -> bool {
        self.already_linked
    }

    pub fn is_linked_in(&self, linked: &LinkedUrls) -> bool {
        linked.contains(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIssue {
    id: i64,
    title: String,
    state: String,
    opened_by: String,
    opened_date: DateTime<Utc>,
    url: String,
    already_linked: bool,
}

impl CanonicalIssue {
    pub fn from_github(issue: &github::Issue, linked: &LinkedUrls) -> Self {
        Self {
            id: issue.number as i64,
            title: issue.title.clone(),
            state: issue.state.clone(),
            opened_by: issue
                .user
                .as_ref()
                .map(|user| user.login.clone())
                .unwrap_or_default(),
            opened_date: issue.created_at,
            already_linked: linked.contains(&issue.html_url),
            url: issue.html_url.clone(),
        }
    }

    pub fn from_gitlab(issue: &gitlab::Issue, linked: &LinkedUrls) -> Self {
        Self {
            id: issue.iid as i64,
            title: issue.title.clone(),
            state: issue.state.clone(),
            opened_by: issue
                .author
                .as_ref()
                .map(|author| author.username.clone())
                .unwrap_or_default(),
            opened_date: issue.created_at,
            already_linked: linked.contains(&issue.web_url),
            url: issue.web_url.clone(),
        }
    }

    /// The synthetic entry that stands for "create a new issue".
    pub fn new_issue_sentinel(host: GitHostKind) -> Self {
        Self {
            id: NEW_ISSUE_SENTINEL_ID,
            title: format!("Create a new issue in {host}"),
            state: String::new(),
            opened_by: String::new(),
            opened_date: Utc
                .timestamp_millis_opt(NEW_ISSUE_SENTINEL_DATE_MS)
                .single()
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            url: String::new(),
            already_linked: false,
        }
    }

    pub fn is_new_issue_sentinel(&self) -> bool {
        self.id == NEW_ISSUE_SENTINEL_ID
    }

    pub fn id(&self) -> i64 {
        self.id
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn state(&self) -> &str {
        &self.state
    }
    pub fn opened_by(&self) -> &str {
        &self.opened_by
    }
    pub fn opened_date(&self) -> DateTime<Utc> {
        self.opened_date
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn already_linked(&self) -> bool {
        self.already_linked
    }

    pub fn is_linked_in(&self, linked: &LinkedUrls) -> bool {
        !self.url.is_empty() && linked.contains(&self.url)
    }
}

/// A GitHub pull request or a GitLab merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRequest {
    id: i64,
    title: String,
    state: String,
    opened_by: String,
    opened_date: DateTime<Utc>,
    url: String,
    already_linked: bool,
    source_branch: String,
    target_branch: String,
    merged_date: Option<DateTime<Utc>>,
}

impl CanonicalRequest {
    pub fn from_github(request: &github::PullRequest, linked: &LinkedUrls) -> Self {
        Self {
            id: request.number as i64,
            title: request.title.clone(),
            state: request.state.clone(),
            opened_by: request
                .user
                .as_ref()
                .map(|user| user.login.clone())
                .unwrap_or_default(),
            opened_date: request.created_at,
            already_linked: linked.contains(&request.html_url),
            url: request.html_url.clone(),
            source_branch: request
                .head
                .as_ref()
                .map(|head| head.ref_name.clone())
                .unwrap_or_default(),
            target_branch: request
                .base
                .as_ref()
                .map(|base| base.ref_name.clone())
                .unwrap_or_default(),
            merged_date: request.merged_at,
        }
    }

    pub fn from_gitlab(request: &gitlab::MergeRequest, linked: &LinkedUrls) -> Self {
        Self {
            id: request.iid as i64,
            title: request.title.clone(),
            state: request.state.clone(),
            opened_by: request
                .author
                .as_ref()
                .map(|author| author.username.clone())
                .unwrap_or_default(),
            opened_date: request.created_at,
            already_linked: linked.contains(&request.web_url),
            url: request.web_url.clone(),
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            merged_date: request.merged_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn state(&self) -> &str {
        &self.state
    }
    pub fn opened_by(&self) -> &str {
        &self.opened_by
    }
    pub fn opened_date(&self) -> DateTime<Utc> {
        self.opened_date
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn already_linked(&self) -> bool {
        self.already_linked
    }
    pub fn source_branch(&self) -> &str {
        &self.source_branch
    }
    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }
    pub fn merged_date(&self) -> Option<DateTime<Utc>> {
        self.merged_date
    }

    pub fn is_linked_in(&self, linked: &LinkedUrls) -> bool {
        linked.contains(&self.url)
    }
}
