use rtcgit_core::{ArtifactKind, GitHostKind, WorkItem};

/// Substituted when RTC cannot tell who is saving.
pub const UNKNOWN_USER: &str = "an unknown user";

/// Who linked what: the data every back-link comment refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackLink {
    pub work_item_id: u64,
    pub location_uri: String,
    pub user: String,
}

impl BackLink {
    pub fn new(work_item: &WorkItem, user: Option<&str>) -> Self {
        Self {
            work_item_id: work_item.id,
            location_uri: work_item.location_uri.clone(),
            user: user
                .map(str::trim)
                .filter(|user| !user.is_empty())
                .unwrap_or(UNKNOWN_USER)
                .to_string(),
        }
    }

    /// Comment body for an artifact of `kind` on `host`.
    pub fn message(&self, kind: ArtifactKind, host: GitHostKind) -> String {
        let noun = match kind {
            ArtifactKind::Commit => "commit",
            ArtifactKind::Issue => "issue",
            ArtifactKind::Request => host.request_noun(),
        };
        format!(
            "This {noun} was linked by [RTC Work Item {}]({}) on behalf of {}",
            self.work_item_id, self.location_uri, self.user
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcgit_core::testing;

    #[test]
    fn messages_are_phrased_per_artifact_kind() {
        let link = BackLink::new(&testing::work_item(), Some("jdoe"));
        let uri = &testing::work_item().location_uri;

        assert_eq!(
            link.message(ArtifactKind::Commit, GitHostKind::GitHub),
            format!("This commit was linked by [RTC Work Item 42]({uri}) on behalf of jdoe")
        );
        assert!(
            link.message(ArtifactKind::Issue, GitHostKind::GitLab)
                .starts_with("This issue was linked")
        );
        assert!(
            link.message(ArtifactKind::Request, GitHostKind::GitHub)
                .starts_with("This pull request was linked")
        );
        assert!(
            link.message(ArtifactKind::Request, GitHostKind::GitLab)
                .starts_with("This merge request was linked")
        );
    }

    #[test]
    fn missing_user_is_named_unknown() {
        let link = BackLink::new(&testing::work_item(), None);
        assert_eq!(link.user, UNKNOWN_USER);
        let blank = BackLink::new(&testing::work_item(), Some("  "));
        assert_eq!(blank.user, UNKNOWN_USER);
    }
}
