pub mod artifact;
pub mod error;
pub mod host;
pub mod native;
pub mod url;
pub mod work_item;

pub use artifact::{
    ArtifactKind, CanonicalCommit, CanonicalIssue, CanonicalRequest, LinkedUrls,
    NEW_ISSUE_SENTINEL_ID,
};
pub use error::{ConnectorError, Result};
pub use host::{AccessToken, GitHostKind, RepositoryConfiguration, RepositoryReference};
pub use url::UrlInfo;
pub use work_item::WorkItem;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
