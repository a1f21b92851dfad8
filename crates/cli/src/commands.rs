use anyhow::{Context, Result, bail};
use rtcgit_core::{AccessToken, GitHostKind, LinkedUrls, RepositoryReference};
use rtcgit_host_client::{
    GitHost, HostClient, HostDetector, HostHttp, RepoAccess, TokenValidator,
};
use rtcgit_runtime_config::ConnectorConfig;
use serde::Serialize;

use crate::output::print_json;

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "RTCGIT_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ArtifactArg {
    #[value(alias = "commits")]
    Commit,
    #[value(alias = "issues")]
    Issue,
    #[value(aliases = ["requests", "pr", "mr"])]
    Request,
}

#[derive(Serialize)]
struct Detection<'a> {
    url: &'a str,
    host: GitHostKind,
    supported: bool,
}

#[derive(Serialize)]
struct Validation<'a> {
    origin: &'a str,
    host: GitHostKind,
    valid: bool,
}

/// Everything a command needs to talk to one repository's host.
struct Target {
    http: HostHttp,
    repo: RepositoryReference,
    kind: GitHostKind,
}

impl Target {
    async fn resolve(config: &ConnectorConfig, url: &str, hint: Option<String>) -> Result<Self> {
        let http = HostHttp::from_config(config).context("Failed to build HTTP client")?;
        let repo = match hint {
            Some(hint) => RepositoryReference::with_host_hint(url, hint),
            None => RepositoryReference::new(url),
        };
        let kind = HostDetector::new(http.clone(), config).detect(&repo).await;
        Ok(Self { http, repo, kind })
    }

    fn origin(&self) -> Result<String> {
        let info = self.repo.url_info();
        if info.origin().is_empty() {
            bail!("Invalid repository URL: {}", self.repo.url);
        }
        Ok(info.origin().to_string())
    }

    fn client(&self, config: &ConnectorConfig) -> Result<HostClient> {
        if !self.kind.is_supported() {
            bail!("{} is not hosted on GitHub or GitLab ({})", self.repo.url, self.kind);
        }
        Ok(HostClient::for_kind(self.kind, self.http.clone(), config))
    }
}

fn token_from_env() -> Result<AccessToken> {
    let token = std::env::var(TOKEN_ENV)
        .with_context(|| format!("{TOKEN_ENV} is not set; export a personal access token"))?;
    let token = AccessToken::new(token.trim());
    if token.is_empty() {
        bail!("{TOKEN_ENV} is empty");
    }
    Ok(token)
}

pub async fn run_detect(config: &ConnectorConfig, url: &str, hint: Option<String>) -> Result<()> {
    let target = Target::resolve(config, url, hint).await?;
    print_json(
        "detect",
        target.kind.display_name(),
        Detection {
            url,
            host: target.kind,
            supported: target.kind.is_supported(),
        },
    )
}

pub async fn run_validate_token(
    config: &ConnectorConfig,
    url: &str,
    hint: Option<String>,
) -> Result<()> {
    let token = token_from_env()?;
    let target = Target::resolve(config, url, hint).await?;
    let origin = target.origin()?;
    let valid = TokenValidator::new(target.http.clone(), config)
        .validate(target.kind, &origin, &token)
        .await?;
    let message = if valid {
        "Token accepted"
    } else {
        "Token rejected"
    };
    print_json(
        "validate-token",
        message,
        Validation {
            origin: &origin,
            host: target.kind,
            valid,
        },
    )
}

pub async fn run_list(
    config: &ConnectorConfig,
    artifact: ArtifactArg,
    url: &str,
    hint: Option<String>,
) -> Result<()> {
    let token = token_from_env()?;
    let target = Target::resolve(config, url, hint).await?;
    let client = target.client(config)?;
    let access = RepoAccess::new(target.repo.clone(), token);
    let linked = LinkedUrls::new();

    match artifact {
        ArtifactArg::Commit => {
            let commits = client.list_recent_commits(&access, &linked).await?;
            print_json("commits", format!("{} commit(s)", commits.len()), commits)
        }
        ArtifactArg::Issue => {
            let issues = client.list_recent_issues(&access, &linked).await?;
            print_json("issues", format!("{} issue(s)", issues.len()), issues)
        }
        ArtifactArg::Request => {
            let requests = client.list_recent_requests(&access, &linked).await?;
            let noun = target.kind.request_noun();
            print_json("requests", format!("{} {noun}(s)", requests.len()), requests)
        }
    }
}

pub async fn run_show(
    config: &ConnectorConfig,
    artifact: ArtifactArg,
    url: &str,
    id: &str,
    hint: Option<String>,
) -> Result<()> {
    let token = token_from_env()?;
    let target = Target::resolve(config, url, hint).await?;
    let client = target.client(config)?;
    let access = RepoAccess::new(target.repo.clone(), token);
    let linked = LinkedUrls::new();

    let parse_number = || -> Result<i64> {
        id.trim()
            .parse::<i64>()
            .with_context(|| format!("Expected a numeric id, got {id:?}"))
    };

    let found = match artifact {
        ArtifactArg::Commit => client
            .get_commit_by_id(&access, id, &linked)
            .await?
            .map(serde_json::to_value)
            .transpose()?,
        ArtifactArg::Issue => client
            .get_issue_by_id(&access, parse_number()?, &linked)
            .await?
            .map(serde_json::to_value)
            .transpose()?,
        ArtifactArg::Request => client
            .get_request_by_id(&access, parse_number()?, &linked)
            .await?
            .map(serde_json::to_value)
            .transpose()?,
    };

    let message = if found.is_some() { "Found" } else { "Not found" };
    print_json("show", message, found)
}
