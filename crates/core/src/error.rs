use crate::host::GitHostKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Unsupported git host: {0}")]
    UnsupportedHost(GitHostKind),

    #[error("Invalid git host: {0}")]
    InvalidHost(GitHostKind),

    #[error("{action}. Error: {message}")]
    HostRequestFailed { action: String, message: String },

    #[error("Couldn't create an issue in the {host} repository. Error: {message}")]
    IssueCreationFailed { host: GitHostKind, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("work item service error: {0}")]
    WorkItemService(String),

    /// The session has no validated token for the selected repository yet.
    #[error("No validated access token for {0}")]
    MissingAccessToken(String),

    #[error("No repository selected")]
    NoRepositorySelected,

    #[error("The linking session has been closed")]
    SessionClosed,
}

impl ConnectorError {
    pub fn request_failed(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostRequestFailed {
            action: action.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
