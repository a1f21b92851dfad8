//! Connector configuration types.
//!
//! The CLI and any embedding host read `rtcgit.toml` into these types. Loading
//! the file from disk is left to the binary; this crate only defines the
//! shape, the defaults, and the normalization applied after loading.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "rtcgit.toml";

/// GitHub and GitLab never return more than this many items per page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Top-level configuration (persisted as `rtcgit.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub gitlab: GitLabSettings,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub linking: LinkingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubSettings {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// GitHub rejects requests without a user agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitLabSettings {
    #[serde(default = "default_gitlab_api_path")]
    pub api_path: String,
    /// Branch the issue template is read from.
    #[serde(default = "default_template_ref")]
    pub template_ref: String,
}

impl Default for GitLabSettings {
    fn default() -> Self {
        Self {
            api_path: default_gitlab_api_path(),
            template_ref: default_template_ref(),
        }
    }
}

/// Same-origin proxy of the hosting application. When enabled, GitLab
/// requests are sent to `<app_root>/proxy?uri=<encoded target>`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProxySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub app_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkingSettings {
    #[serde(default = "default_issue_template_name")]
    pub issue_template_name: String,
    /// Label added to every issue created from a work item.
    #[serde(default = "default_marker_label")]
    pub marker_label: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for LinkingSettings {
    fn default() -> Self {
        Self {
            issue_template_name: default_issue_template_name(),
            marker_label: default_marker_label(),
            page_size: default_page_size(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    "rtcgit".to_string()
}
fn default_gitlab_api_path() -> String {
    "/api/v4".to_string()
}
fn default_template_ref() -> String {
    "master".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_issue_template_name() -> String {
    "rtc-work-item-v1.md".to_string()
}
fn default_marker_label() -> String {
    "from-rtc-work-item".to_string()
}
fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

/// Normalize values after loading raw TOML.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut ConnectorConfig) -> bool {
    let mut changed = false;

    for url in [&mut config.github.api_url, &mut config.proxy.app_root] {
        let trimmed = url.trim().trim_end_matches('/').to_string();
        if trimmed != *url {
            *url = trimmed;
            changed = true;
        }
    }

    if config.github.api_url.is_empty() {
        config.github.api_url = default_github_api_url();
        changed = true;
    }

    if config.github.user_agent.trim().is_empty() {
        config.github.user_agent = default_user_agent();
        changed = true;
    }

    if !config.gitlab.api_path.starts_with('/') {
        config.gitlab.api_path = format!("/{}", config.gitlab.api_path);
        changed = true;
    }

    if config.gitlab.template_ref.trim().is_empty() {
        config.gitlab.template_ref = default_template_ref();
        changed = true;
    }

    if config.proxy.enabled && config.proxy.app_root.is_empty() {
        config.proxy.enabled = false;
        changed = true;
    }

    if config.linking.issue_template_name.trim().is_empty() {
        config.linking.issue_template_name = default_issue_template_name();
        changed = true;
    }

    if config.linking.marker_label.trim().is_empty() {
        config.linking.marker_label = default_marker_label();
        changed = true;
    }

    let clamped = config.linking.page_size.clamp(1, MAX_PAGE_SIZE);
    if clamped != config.linking.page_size {
        config.linking.page_size = clamped;
        changed = true;
    }

    changed
}
