//! Wire shapes returned by the GitHub REST API and the GitLab v4 API.
//!
//! Only the fields the canonical model needs are declared; everything else in
//! the host responses is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod github {
    use super::*;

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct User {
        pub login: String,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct GitAuthor {
        #[serde(default)]
        pub name: String,
        pub date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct CommitDetail {
        #[serde(default)]
        pub message: String,
        pub author: Option<GitAuthor>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Commit {
        pub sha: String,
        pub commit: CommitDetail,
        pub html_url: String,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Issue {
        pub number: u64,
        pub title: String,
        pub state: String,
        pub user: Option<User>,
        pub created_at: DateTime<Utc>,
        pub html_url: String,
        /// Present when the "issue" is really a pull request.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pull_request: Option<serde_json::Value>,
    }

    impl Issue {
        pub fn is_pull_request(&self) -> bool {
            self.pull_request.is_some()
        }
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct BranchRef {
        #[serde(rename = "ref")]
        pub ref_name: String,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct PullRequest {
        pub number: u64,
        pub title: String,
        pub state: String,
        pub user: Option<User>,
        pub created_at: DateTime<Utc>,
        pub html_url: String,
        #[serde(default)]
        pub merged_at: Option<DateTime<Utc>>,
        pub head: Option<BranchRef>,
        pub base: Option<BranchRef>,
    }
}

pub mod gitlab {
    use super::*;

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct User {
        pub username: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Commit {
        pub id: String,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub author_name: String,
        pub authored_date: Option<DateTime<Utc>>,
        #[serde(default)]
        pub committed_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Issue {
        pub iid: u64,
        pub title: String,
        pub state: String,
        pub author: Option<User>,
        pub created_at: DateTime<Utc>,
        pub web_url: String,
    }

    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct MergeRequest {
        pub iid: u64,
        pub title: String,
        pub state: String,
        pub author: Option<User>,
        pub created_at: DateTime<Utc>,
        pub web_url: String,
        #[serde(default)]
        pub merged_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub source_branch: String,
        #[serde(default)]
        pub target_branch: String,
    }
}
