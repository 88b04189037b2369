//! Deployment engine behaviour against real directory trees

use hotswap_config::Layout;
use hotswap_deploy::DeploymentEngine;
use hotswap_errors::{Error, InstallError};
use hotswap_hash::tree_manifest;
use hotswap_types::{DeploymentKind, PackageMetadata, DIFF_MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

async fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, content).await.unwrap();
    }
}

async fn read(path: PathBuf) -> String {
    fs::read_to_string(path).await.unwrap()
}

fn installed(hash: &str, local_path: PathBuf) -> PackageMetadata {
    PackageMetadata {
        app_version: "1.0.0".into(),
        deployment_key: "key".into(),
        label: "v1".into(),
        description: String::new(),
        is_mandatory: false,
        package_hash: hash.into(),
        package_size: 0,
        local_path,
        is_first_run: false,
        failed_install: false,
    }
}

struct Fixture {
    _temp: TempDir,
    layout: Layout,
    candidate: PathBuf,
}

async fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let layout = Layout::new(temp.path());
    let candidate = layout.unzipped_dir();
    fs::create_dir_all(&candidate).await.unwrap();
    Fixture {
        _temp: temp,
        layout,
        candidate,
    }
}

#[tokio::test]
async fn clean_deploy_copies_candidate() {
    let fx = fixture().await;
    write_tree(&fx.candidate, &[("index.html", "v2"), ("js/app.js", "app")]).await;

    let engine = DeploymentEngine::new(&fx.layout);
    let deployment = engine.deploy(&fx.candidate, "h2", None).await.unwrap();

    assert_eq!(deployment.kind, DeploymentKind::Clean);
    assert_eq!(deployment.path, fx.layout.version_dir("h2"));
    assert_eq!(read(deployment.path.join("js/app.js")).await, "app");
}

#[tokio::test]
async fn clean_deploy_discards_stale_generation_content() {
    let fx = fixture().await;
    write_tree(&fx.layout.version_dir("h2"), &[("stale.js", "old attempt")]).await;
    write_tree(&fx.candidate, &[("index.html", "v2")]).await;

    let engine = DeploymentEngine::new(&fx.layout);
    let deployment = engine.deploy(&fx.candidate, "h2", None).await.unwrap();
    assert!(!deployment.path.join("stale.js").exists());
}

#[tokio::test]
async fn diff_deploy_patches_current_generation() {
    let fx = fixture().await;
    let base = fx.layout.version_dir("h1");
    write_tree(
        &base,
        &[
            ("index.html", "v1"),
            ("js/keep.js", "keep"),
            ("js/removed.js", "gone"),
            ("img/old.png", "png"),
        ],
    )
    .await;
    write_tree(
        &fx.candidate,
        &[
            ("index.html", "v2"),
            ("js/new.js", "new"),
            // Present in the overlay and in the deletion list: deletion wins
            ("js/removed.js", "resurrected"),
        ],
    )
    .await;
    fs::write(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        r#"{"deletedFiles": ["js/removed.js", "img", "never/existed.txt"]}"#,
    )
    .await
    .unwrap();

    let engine = DeploymentEngine::new(&fx.layout);
    let current = installed("h1", base.clone());
    let deployment = engine
        .deploy(&fx.candidate, "h2", Some(&current))
        .await
        .unwrap();

    assert_eq!(deployment.kind, DeploymentKind::Diff);
    assert_eq!(deployment.base.as_deref(), Some(base.as_path()));
    assert_eq!(deployment.removed, 2);

    let root = deployment.path;
    assert_eq!(read(root.join("index.html")).await, "v2");
    assert_eq!(read(root.join("js/keep.js")).await, "keep");
    assert_eq!(read(root.join("js/new.js")).await, "new");
    assert!(!root.join("js/removed.js").exists());
    assert!(!root.join("img").exists());

    // Base generation is untouched
    assert_eq!(read(base.join("index.html")).await, "v1");
    assert!(base.join("js/removed.js").exists());
}

#[tokio::test]
async fn diff_equals_base_minus_deletions_with_overlay_precedence() {
    let fx = fixture().await;
    let base = fx.layout.version_dir("h1");
    write_tree(&base, &[("a.txt", "a1"), ("b.txt", "b1"), ("c/d.txt", "d1")]).await;
    write_tree(&fx.candidate, &[("a.txt", "a2"), ("e.txt", "e2")]).await;
    fs::write(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        r#"{"deletedFiles": ["b.txt"]}"#,
    )
    .await
    .unwrap();

    let engine = DeploymentEngine::new(&fx.layout);
    let current = installed("h1", base);
    let deployment = engine
        .deploy(&fx.candidate, "h2", Some(&current))
        .await
        .unwrap();

    let expected = TempDir::new().unwrap();
    write_tree(
        expected.path(),
        &[("a.txt", "a2"), ("c/d.txt", "d1"), ("e.txt", "e2")],
    )
    .await;
    fs::copy(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        expected.path().join(DIFF_MANIFEST_FILE),
    )
    .await
    .unwrap();

    assert_eq!(
        tree_manifest(&deployment.path).await.unwrap(),
        tree_manifest(expected.path()).await.unwrap()
    );
}

#[tokio::test]
async fn diff_without_current_uses_binary_content() {
    let fx = fixture().await;
    let binary = fx.layout.data_root().join("bundle");
    write_tree(&binary, &[("index.html", "binary"), ("old.js", "old")]).await;
    write_tree(&fx.candidate, &[("app.js", "patched")]).await;
    fs::write(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        r#"{"deletedFiles": ["old.js"]}"#,
    )
    .await
    .unwrap();

    let engine = DeploymentEngine::new(&fx.layout).with_binary_base(Some(binary));
    let deployment = engine.deploy(&fx.candidate, "h1", None).await.unwrap();

    assert_eq!(deployment.kind, DeploymentKind::Diff);
    assert_eq!(read(deployment.path.join("index.html")).await, "binary");
    assert!(!deployment.path.join("old.js").exists());
}

#[tokio::test]
async fn diff_without_any_base_deploys_overlay_only() {
    let fx = fixture().await;
    write_tree(&fx.candidate, &[("app.js", "patched")]).await;
    fs::write(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        r#"{"deletedFiles": ["app.js"]}"#,
    )
    .await
    .unwrap();

    let engine = DeploymentEngine::new(&fx.layout);
    let deployment = engine.deploy(&fx.candidate, "h1", None).await.unwrap();

    assert_eq!(deployment.kind, DeploymentKind::Clean);
    assert_eq!(deployment.removed, 0);
    assert_eq!(read(deployment.path.join("app.js")).await, "patched");
}

#[tokio::test]
async fn missing_base_directory_fails_deployment() {
    let fx = fixture().await;
    write_tree(&fx.candidate, &[("app.js", "patched")]).await;
    fs::write(fx.candidate.join(DIFF_MANIFEST_FILE), r#"{"deletedFiles": []}"#)
        .await
        .unwrap();

    let engine = DeploymentEngine::new(&fx.layout);
    let current = installed("h1", fx.layout.version_dir("h1"));
    let err = engine
        .deploy(&fx.candidate, "h2", Some(&current))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::DeploymentFailed { .. })
    ));
}

#[tokio::test]
async fn redeploying_installed_hash_is_refused() {
    let fx = fixture().await;
    let base = fx.layout.version_dir("h1");
    write_tree(&base, &[("index.html", "v1")]).await;
    write_tree(&fx.candidate, &[("index.html", "v1")]).await;

    let engine = DeploymentEngine::new(&fx.layout);
    let current = installed("h1", base.clone());
    assert!(engine
        .deploy(&fx.candidate, "h1", Some(&current))
        .await
        .is_err());
    assert_eq!(read(base.join("index.html")).await, "v1");
}

#[tokio::test]
async fn escaping_deletion_path_fails_deployment() {
    let fx = fixture().await;
    let base = fx.layout.version_dir("h1");
    write_tree(&base, &[("index.html", "v1")]).await;
    write_tree(&fx.candidate, &[("index.html", "v2")]).await;
    fs::write(
        fx.candidate.join(DIFF_MANIFEST_FILE),
        r#"{"deletedFiles": ["../h1/index.html"]}"#,
    )
    .await
    .unwrap();

    let engine = DeploymentEngine::new(&fx.layout);
    let current = installed("h1", base.clone());
    assert!(engine
        .deploy(&fx.candidate, "h2", Some(&current))
        .await
        .is_err());
    assert!(base.join("index.html").exists());
}
