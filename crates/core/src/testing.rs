use crate::native::{github, gitlab};
use crate::WorkItem;

/// GitHub commit as returned by `GET /repos/acme/widget/commits`.
pub fn github_commit(sha: &str, message: &str) -> github::Commit {
    serde_json::from_value(github_commit_json(sha, message)).expect("github commit fixture")
}

pub fn github_commit_json(sha: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "sha": sha,
        "commit": {
            "message": message,
            "author": { "name": "Ada", "email": "ada@example.com", "date": "2024-03-01T10:00:00Z" }
        },
        "html_url": format!("https://github.com/acme/widget/commit/{sha}")
    })
}

pub fn github_issue(number: u64, title: &str) -> github::Issue {
    serde_json::from_value(github_issue_json(number, title)).expect("github issue fixture")
}

pub fn github_issue_json(number: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "title": title,
        "state": "open",
        "user": { "login": "ada" },
        "created_at": "2024-03-02T08:30:00Z",
        "html_url": format!("https://github.com/acme/widget/issues/{number}")
    })
}

/// An entry of the GitHub issues listing that is really a pull request.
pub fn github_issue_pull_request_json(number: u64, title: &str) -> serde_json::Value {
    let mut value = github_issue_json(number, title);
    value["html_url"] =
        serde_json::Value::String(format!("https://github.com/acme/widget/pull/{number}"));
    value["pull_request"] = serde_json::json!({
        "url": format!("https://api.github.com/repos/acme/widget/pulls/{number}")
    });
    value
}

pub fn github_pull_request(number: u64, title: &str) -> github::PullRequest {
    serde_json::from_value(github_pull_request_json(number, title))
        .expect("github pull request fixture")
}

pub fn github_pull_request_json(number: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "title": title,
        "state": "open",
        "user": { "login": "ada" },
        "created_at": "2024-03-03T12:00:00Z",
        "html_url": format!("https://github.com/acme/widget/pull/{number}"),
        "merged_at": null,
        "head": { "ref": "feature" },
        "base": { "ref": "main" }
    })
}

pub fn gitlab_commit(id: &str, message: &str) -> gitlab::Commit {
    serde_json::from_value(gitlab_commit_json(id, message)).expect("gitlab commit fixture")
}

pub fn gitlab_commit_json(id: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "short_id": &id[..id.len().min(8)],
        "message": message,
        "author_name": "Ada",
        "authored_date": "2024-03-01T12:00:00.000+02:00",
        "committed_date": "2024-03-01T12:00:00.000+02:00"
    })
}

pub fn gitlab_issue(iid: u64, title: &str) -> gitlab::Issue {
    serde_json::from_value(gitlab_issue_json(iid, title)).expect("gitlab issue fixture")
}

pub fn gitlab_issue_json(iid: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 1000 + iid,
        "iid": iid,
        "title": title,
        "state": "opened",
        "author": { "username": "ada", "name": "Ada" },
        "created_at": "2024-03-02T08:30:00.000Z",
        "web_url": format!("https://git.example.com/acme/widget/-/issues/{iid}")
    })
}

pub fn gitlab_merge_request(iid: u64, title: &str) -> gitlab::MergeRequest {
    serde_json::from_value(gitlab_merge_request_json(iid, title))
        .expect("gitlab merge request fixture")
}

pub fn gitlab_merge_request_json(iid: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 2000 + iid,
        "iid": iid,
        "title": title,
        "state": "opened",
        "author": { "username": "ada", "name": "Ada" },
        "created_at": "2024-03-03T12:00:00.000Z",
        "web_url": format!("https://git.example.com/acme/widget/-/merge_requests/{iid}"),
        "merged_at": null,
        "source_branch": "feature",
        "target_branch": "main"
    })
}

/// Work item 42 with two tags.
pub fn work_item() -> WorkItem {
    WorkItem {
        id: 42,
        summary: "Widget crashes on save".to_string(),
        description: "Steps to reproduce: press save.".to_string(),
        tags: vec!["backend".to_string(), "urgent".to_string()],
        location_uri: "https://rtc.example.com/ccm/resource/itemName/com.ibm.team.workitem.WorkItem/42"
            .to_string(),
    }
}
