//! Sync coordinator scenarios

mod common;

use common::{harness, FixedPrompt, APP_VERSION};
use hotswap_errors::{Error, InstallError, NetworkError};
use hotswap_sync::{SyncOptions, SyncStream};
use hotswap_types::{InstallMode, InstallOptions, SyncState, SyncStatus};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use SyncStatus::{
    AwaitingUserAction, CheckingForUpdate, DownloadingPackage, InstallingUpdate,
    SyncInProgress, UpToDate, UpdateIgnored, UpdateInstalled,
};

async fn statuses(stream: SyncStream) -> Vec<SyncStatus> {
    let (seen, _) = stream.drain().await;
    seen
}

#[tokio::test]
async fn test_no_update_is_up_to_date() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());

    let (seen, outcome) = coordinator.sync(SyncOptions::default()).drain().await;

    assert_eq!(seen, vec![CheckingForUpdate, UpToDate]);
    assert_eq!(outcome.unwrap(), UpToDate);
    assert!(h.client.downloads().is_empty());
    assert_eq!(coordinator.state(), SyncState::UpToDate);
}

#[tokio::test]
async fn test_update_installs_and_becomes_current() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);

    let seen = statuses(coordinator.sync(SyncOptions::default())).await;

    assert_eq!(
        seen,
        vec![
            CheckingForUpdate,
            DownloadingPackage,
            InstallingUpdate,
            UpdateInstalled
        ]
    );
    let current = h.orchestrator.current_package().await.unwrap().unwrap();
    assert_eq!(current.package_hash, "h1");
    assert_eq!(current.deployment_key, "staging-key");
    assert_eq!(
        *h.bridge.commits.lock().unwrap(),
        vec![InstallMode::OnNextRestart]
    );
}

#[tokio::test]
async fn test_mandatory_update_installs_immediately() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", true, &[("index.bundle", b"v1")]);

    let options = SyncOptions::default()
        .with_install(InstallOptions::default().with_install_mode(InstallMode::OnNextResume));
    let seen = statuses(coordinator.sync(options)).await;

    assert_eq!(
        seen,
        vec![
            CheckingForUpdate,
            DownloadingPackage,
            InstallingUpdate,
            UpdateInstalled
        ]
    );
    assert_eq!(
        *h.bridge.commits.lock().unwrap(),
        vec![InstallMode::Immediate]
    );
}

#[tokio::test]
async fn test_explicit_mandatory_mode_is_honoured() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", true, &[("index.bundle", b"v1")]);

    let install = InstallOptions {
        mandatory_install_mode: Some(InstallMode::OnNextResume),
        ..InstallOptions::default()
    };
    coordinator
        .sync(SyncOptions::default().with_install(install))
        .finish()
        .await
        .unwrap();

    assert_eq!(
        *h.bridge.commits.lock().unwrap(),
        vec![InstallMode::OnNextResume]
    );
}

#[tokio::test]
async fn test_invalid_download_url_leaves_current_untouched() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    coordinator
        .sync(SyncOptions::default())
        .finish()
        .await
        .unwrap();
    let before = h.orchestrator.current_package().await.unwrap();

    h.client.offer("h2", false, &[("index.bundle", b"v2")]);
    h.client.response.lock().unwrap().download_url = "not a url".into();
    let (seen, outcome) = coordinator.sync(SyncOptions::default()).drain().await;

    assert_eq!(seen, vec![CheckingForUpdate, DownloadingPackage, SyncStatus::Error]);
    assert!(matches!(
        outcome,
        Err(Error::Network(NetworkError::InvalidUrl(_)))
    ));
    assert_eq!(h.orchestrator.current_package().await.unwrap(), before);
    assert_eq!(coordinator.state(), SyncState::Error);
}

#[tokio::test]
async fn test_offer_without_package_fields_fails_the_check() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    {
        let mut response = h.client.response.lock().unwrap();
        response.package_hash.clear();
        response.download_url.clear();
    }

    let (seen, outcome) = coordinator.sync(SyncOptions::default()).drain().await;

    assert_eq!(seen, vec![CheckingForUpdate, SyncStatus::Error]);
    assert!(matches!(
        outcome,
        Err(Error::Network(NetworkError::MalformedResponse { .. }))
    ));
    assert!(h.client.downloads().is_empty());
    assert!(h.orchestrator.current_package().await.unwrap().is_none());
}

#[tokio::test]
async fn test_install_failure_surfaces_stage_error() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    *h.bridge.reject_with.lock().unwrap() = Some("unsigned bundle".into());

    let (seen, outcome) = coordinator.sync(SyncOptions::default()).drain().await;

    assert_eq!(seen.last(), Some(&SyncStatus::Error));
    assert!(matches!(
        outcome,
        Err(Error::Install(InstallError::PreInstallRejected { .. }))
    ));
}

#[tokio::test]
async fn test_second_caller_only_sees_sync_in_progress() {
    let gate = Arc::new(Notify::new());
    let h = harness(Some(gate.clone()));
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);

    let first = coordinator.sync(SyncOptions::default());
    assert!(!coordinator.state().is_idle());

    let second = coordinator.sync(
        SyncOptions::default()
            .with_install(InstallOptions::default().with_install_mode(InstallMode::Immediate)),
    );
    let (second_seen, second_outcome) = second.drain().await;
    assert_eq!(second_seen, vec![SyncInProgress]);
    assert_eq!(second_outcome.unwrap(), SyncInProgress);

    gate.notify_one();
    let first_seen = statuses(first).await;
    assert_eq!(
        first_seen,
        vec![
            CheckingForUpdate,
            DownloadingPackage,
            InstallingUpdate,
            UpdateInstalled
        ]
    );
    // The rejected caller's options were dropped
    assert_eq!(
        *h.bridge.commits.lock().unwrap(),
        vec![InstallMode::OnNextRestart]
    );
    assert_eq!(h.client.queries().len(), 1);
}

#[tokio::test]
async fn test_sync_is_accepted_again_after_completion() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());

    coordinator.sync(SyncOptions::default()).finish().await.unwrap();
    let seen = statuses(coordinator.sync(SyncOptions::default())).await;

    assert_eq!(seen, vec![CheckingForUpdate, UpToDate]);
}

#[tokio::test]
async fn test_successive_syncs_keep_history() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());

    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    coordinator.sync(SyncOptions::default()).finish().await.unwrap();
    let first = h.orchestrator.current_package().await.unwrap();

    h.client.offer("h2", false, &[("index.bundle", b"v2")]);
    coordinator.sync(SyncOptions::default()).finish().await.unwrap();

    let current = h.orchestrator.current_package().await.unwrap().unwrap();
    assert_eq!(current.package_hash, "h2");
    assert_eq!(h.orchestrator.previous_package().await.unwrap(), first);
    assert_eq!(h.client.queries()[1].package_hash.as_deref(), Some("h1"));
}

#[tokio::test]
async fn test_already_current_package_is_up_to_date() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    coordinator.sync(SyncOptions::default()).finish().await.unwrap();

    let seen = statuses(coordinator.sync(SyncOptions::default())).await;

    assert_eq!(seen, vec![CheckingForUpdate, UpToDate]);
    assert_eq!(h.client.downloads().len(), 1);
}

#[tokio::test]
async fn test_previously_failed_hash_is_not_downloaded() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    h.bridge.failed_hashes.lock().unwrap().insert("h1".into());

    let seen = statuses(coordinator.sync(SyncOptions::default())).await;

    assert_eq!(seen, vec![CheckingForUpdate, UpToDate]);
    assert!(h.client.downloads().is_empty());
}

#[tokio::test]
async fn test_update_for_other_binary_version_is_up_to_date() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);
    h.client.response.lock().unwrap().app_version = "2.0.0".into();

    let seen = statuses(coordinator.sync(SyncOptions::default())).await;
    assert_eq!(seen, vec![CheckingForUpdate, UpToDate]);

    let query = &h.client.queries()[0];
    assert_eq!(query.app_version, APP_VERSION);
}

#[tokio::test]
async fn test_declined_prompt_ignores_optional_update() {
    let h = harness(None);
    let prompt = Arc::new(FixedPrompt {
        accept: false,
        asked: Mutex::new(Vec::new()),
    });
    let coordinator = Arc::new(h.coordinator().with_prompt(prompt.clone()));
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);

    let seen = statuses(coordinator.sync(SyncOptions::default().with_prompt(true))).await;

    assert_eq!(seen, vec![CheckingForUpdate, AwaitingUserAction, UpdateIgnored]);
    assert_eq!(*prompt.asked.lock().unwrap(), vec!["h1".to_string()]);
    assert!(h.orchestrator.current_package().await.unwrap().is_none());
}

#[tokio::test]
async fn test_mandatory_update_cannot_be_declined() {
    let h = harness(None);
    let prompt = Arc::new(FixedPrompt {
        accept: false,
        asked: Mutex::new(Vec::new()),
    });
    let coordinator = Arc::new(h.coordinator().with_prompt(prompt));
    h.client.offer("h1", true, &[("index.bundle", b"v1")]);

    let seen = statuses(coordinator.sync(SyncOptions::default().with_prompt(true))).await;

    assert_eq!(
        seen,
        vec![
            CheckingForUpdate,
            AwaitingUserAction,
            DownloadingPackage,
            InstallingUpdate,
            UpdateInstalled
        ]
    );
}

#[tokio::test]
async fn test_custom_deployment_key_is_used_for_one_sync() {
    let h = harness(None);
    let coordinator = Arc::new(h.coordinator());
    h.client.offer("h1", false, &[("index.bundle", b"v1")]);

    coordinator
        .sync(SyncOptions::default().with_deployment_key("production-key"))
        .finish()
        .await
        .unwrap();
    coordinator.sync(SyncOptions::default()).finish().await.unwrap();

    let queries = h.client.queries();
    assert_eq!(queries[0].deployment_key, "production-key");
    assert_eq!(queries[1].deployment_key, "staging-key");
    let current = h.orchestrator.current_package().await.unwrap().unwrap();
    assert_eq!(current.deployment_key, "production-key");
}

#[tokio::test]
async fn test_binary_hash_identifies_unupdated_binary() {
    let h = harness(None);
    let binary = h.temp.path().join("bundle");
    std::fs::create_dir_all(&binary).unwrap();
    std::fs::write(binary.join("index.bundle"), b"shipped").unwrap();
    let coordinator =
        Arc::new(h.coordinator().with_binary_content_dir(Some(binary.clone())));

    coordinator.sync(SyncOptions::default()).finish().await.unwrap();

    let expected = hotswap_hash::hash_directory(&binary).await.unwrap().to_hex();
    assert_eq!(
        h.client.queries()[0].package_hash.as_deref(),
        Some(expected.as_str())
    );
}
