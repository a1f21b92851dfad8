mod common;

use std::sync::Arc;

use common::{FakeHost, FakeProbe, FakeService};
use rtcgit_core::{AccessToken, ConnectorError, GitHostKind, RepositoryReference, testing};
use rtcgit_linker::{SessionContext, TokenStatus};

const GITHUB_ORIGIN: &str = "https://github.com";

fn widget() -> RepositoryReference {
    RepositoryReference::new("https://github.com/acme/widget.git")
}

fn session_with(
    service: FakeService,
    probe: FakeProbe,
) -> (SessionContext, Arc<FakeService>, Arc<FakeProbe>) {
    let service = Arc::new(service);
    let probe = Arc::new(probe);
    let session = SessionContext::new(service.clone(), probe.clone());
    (session, service, probe)
}

#[tokio::test]
async fn stored_valid_token_is_loaded() {
    let (mut session, _service, probe) = session_with(
        FakeService::default().with_token(GITHUB_ORIGIN, "ghp_ok"),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );

    session.select_repository(widget()).expect("select");
    assert_eq!(session.detect_host().await.expect("detect"), GitHostKind::GitHub);
    assert_eq!(session.load_token().await.expect("load"), TokenStatus::Valid);
    assert!(session.has_token());
    assert_eq!(probe.validations(), vec![GITHUB_ORIGIN.to_string()]);

    let access = session.access().expect("access");
    assert_eq!(access.token, AccessToken::new("ghp_ok"));
}

#[tokio::test]
async fn missing_or_rejected_token_needs_prompt() {
    let (mut session, _service, probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    session.select_repository(widget()).expect("select");
    session.detect_host().await.expect("detect");
    assert_eq!(session.load_token().await.expect("load"), TokenStatus::NeedsPrompt);
    assert!(probe.validations().is_empty());

    let (mut session, _service, _probe) = session_with(
        FakeService::default().with_token(GITHUB_ORIGIN, "ghp_revoked"),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    session.select_repository(widget()).expect("select");
    session.detect_host().await.expect("detect");
    assert_eq!(session.load_token().await.expect("load"), TokenStatus::NeedsPrompt);
    assert!(!session.has_token());
    assert!(matches!(
        session.access(),
        Err(ConnectorError::MissingAccessToken(origin)) if origin == GITHUB_ORIGIN
    ));
}

#[tokio::test]
async fn submitted_token_is_persisted_only_when_valid() {
    let (mut session, service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    session.select_repository(widget()).expect("select");
    session.detect_host().await.expect("detect");

    assert!(!session.submit_token(AccessToken::new("ghp_typo")).await.expect("submit"));
    assert!(service.stored_token(GITHUB_ORIGIN).is_none());
    assert!(!session.has_token());

    assert!(session.submit_token(AccessToken::new("ghp_ok")).await.expect("submit"));
    assert_eq!(service.stored_token(GITHUB_ORIGIN), Some(AccessToken::new("ghp_ok")));
    assert!(session.has_token());
}

#[tokio::test]
async fn token_checks_need_a_supported_host() {
    let (mut session, _service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::Other, &[]),
    );
    session
        .select_repository(RepositoryReference::new("https://svn.example.com/acme/widget"))
        .expect("select");
    assert_eq!(session.detect_host().await.expect("detect"), GitHostKind::Other);
    assert_eq!(
        session.load_token().await,
        Err(ConnectorError::InvalidHost(GitHostKind::Other))
    );
    assert_eq!(
        session.access().map(|_| ()),
        Err(ConnectorError::UnsupportedHost(GitHostKind::Other))
    );
}

#[tokio::test]
async fn stale_results_are_discarded_after_reselection() {
    let (mut session, _service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &[]),
    );
    let first = session.select_repository(widget()).expect("select");
    let second = session
        .select_repository(RepositoryReference::new("https://git.example.com/acme/gadget"))
        .expect("reselect");

    assert!(!session.is_current(&first));
    assert!(!session.apply_host(&first, GitHostKind::GitHub));
    assert!(!session.apply_token(&first, AccessToken::new("ghp_ok")));
    assert_eq!(session.host(), GitHostKind::Unknown);
    assert!(!session.has_token());

    assert!(session.apply_host(&second, GitHostKind::GitLab));
    assert_eq!(session.host(), GitHostKind::GitLab);
}

#[tokio::test]
async fn hint_bypasses_detection() {
    let (mut session, _service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::Other, &[]),
    );
    let repositories = session
        .registered_repositories("_acme")
        .await
        .expect("repositories");
    assert_eq!(repositories.len(), 2);

    session
        .select_repository(repositories[1].clone())
        .expect("select");
    assert_eq!(session.detect_host().await.expect("detect"), GitHostKind::GitLab);
}

#[tokio::test]
async fn listings_are_cached_until_reselection() {
    let (mut session, _service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    let host = FakeHost::github();
    let work_item = testing::work_item();

    session.select_repository(widget()).expect("select");
    session.detect_host().await.expect("detect");
    session.submit_token(AccessToken::new("ghp_ok")).await.expect("submit");

    let issues = session.recent_issues(&host, &work_item).await.expect("issues");
    assert!(issues.last().expect("sentinel").is_new_issue_sentinel());
    session.recent_issues(&host, &work_item).await.expect("cached issues");
    session.recent_commits(&host, &work_item).await.expect("commits");
    session.recent_requests(&host, &work_item).await.expect("requests");
    assert_eq!(host.list_calls(), 3);

    session.clear_results();
    session.recent_issues(&host, &work_item).await.expect("refetched issues");
    assert_eq!(host.list_calls(), 4);

    session.select_repository(widget()).expect("reselect");
    assert!(matches!(
        session.recent_commits(&host, &work_item).await,
        Err(ConnectorError::UnsupportedHost(GitHostKind::Unknown))
    ));
    assert_eq!(host.list_calls(), 4);
}

#[tokio::test]
async fn listing_refreshes_when_work_item_links_change() {
    let (mut session, service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    let host = FakeHost::github();
    let work_item = testing::work_item();

    session.select_repository(widget()).expect("select");
    session.detect_host().await.expect("detect");
    session.submit_token(AccessToken::new("ghp_ok")).await.expect("submit");

    let issues = session.recent_issues(&host, &work_item).await.expect("issues");
    assert!(!issues[0].already_linked());
    let issue_url = issues[0].url().to_string();

    service.link(&issue_url);
    let issues = session.recent_issues(&host, &work_item).await.expect("issues");
    assert!(issues[0].already_linked());
    assert_eq!(host.list_calls(), 2);
}

#[tokio::test]
async fn teardown_closes_the_session() {
    let (mut session, _service, _probe) = session_with(
        FakeService::default(),
        FakeProbe::new(GitHostKind::GitHub, &["ghp_ok"]),
    );
    let ticket = session.select_repository(widget()).expect("select");
    session.teardown();

    assert!(session.is_closed());
    assert!(session.selected_repository().is_none());
    assert!(!session.apply_host(&ticket, GitHostKind::GitHub));
    assert_eq!(
        session.select_repository(widget()),
        Err(ConnectorError::SessionClosed)
    );
    assert_eq!(
        session.registered_repositories("_acme").await,
        Err(ConnectorError::SessionClosed)
    );
}
