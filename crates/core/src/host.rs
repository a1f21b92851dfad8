use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosting provider of a repository.
///
/// `Other` means the host answered but is not supported; `Unknown` means it
/// has not been determined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GitHostKind {
    #[serde(rename = "GITHUB")]
    GitHub,
    #[serde(rename = "GITLAB")]
    GitLab,
    Other,
    #[default]
    Unknown,
}

impl GitHostKind {
    /// Interpret an explicit `gitHostedServer` hint. Matching is
    /// case-insensitive; anything unrecognized is `Other`.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_uppercase().as_str() {
            "GITHUB" => Self::GitHub,
            "GITLAB" => Self::GitLab,
            _ => Self::Other,
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, Self::GitHub | Self::GitLab)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }

    /// What the host calls a pull/merge request.
    pub fn request_noun(self) -> &'static str {
        match self {
            Self::GitLab => "merge request",
            _ => "pull request",
        }
    }
}

impl fmt::Display for GitHostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hosted_server: Option<String>,
}

/// A Git repository registered in an RTC project area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryReference {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_data: Option<RepositoryConfiguration>,
}

impl RepositoryReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            configuration_data: None,
        }
    }

    pub fn with_host_hint(url: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            configuration_data: Some(RepositoryConfiguration {
                git_hosted_server: Some(hint.into()),
            }),
        }
    }

    /// Non-empty `gitHostedServer` override, if configured.
    pub fn host_hint(&self) -> Option<&str> {
        self.configuration_data
            .as_ref()
            .and_then(|config| config.git_hosted_server.as_deref())
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
    }

    pub fn url_info(&self) -> crate::url::UrlInfo {
        crate::url::UrlInfo::parse(&self.url)
    }
}

/// Personal access token for one host. The value never appears in `Debug`
/// output so it cannot leak through logging.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
