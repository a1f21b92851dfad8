//! GitHub and GitLab REST clients behind one [`GitHost`] interface, plus
//! host detection and token validation.

pub mod comment;
pub mod detect;
pub mod github;
pub mod gitlab;
pub mod host;
pub mod http;
pub mod routing;
pub mod template;
pub mod token;

pub use comment::{BackLink, UNKNOWN_USER};
pub use detect::HostDetector;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use host::{GitHost, HostClient, RepoAccess};
pub use http::HostHttp;
pub use routing::Routing;
pub use template::{DEFAULT_ISSUE_TEMPLATE, PlaceholderRenderer, TemplateRenderer};
pub use token::TokenValidator;
