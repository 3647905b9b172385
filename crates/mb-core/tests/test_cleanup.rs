mod common;

use common::*;

#[tokio::test]
async fn purge_removes_only_orphans() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixedBranchSource::new(&["main", "dev", "feature/a"]);
    let orch = file_orchestrator(dir.path(), source.clone());
    reconcile(&orch).await;
    source.set(&["main"]);
    reconcile(&orch).await;

    let purged = orch.purge_orphaned().await.unwrap();

    assert_eq!(names(&purged), vec!["dev", "feature/a"]);
    assert!(orch.sub_project("dev").await.is_none());
    assert!(!orch.layout().branch_dir("dev").unwrap().exists());
    assert!(!orch.layout().branch_dir("feature/a").unwrap().exists());
    assert!(orch.layout().branch_dir("main").unwrap().is_dir());
    assert!(orch.layout().template_dir().is_dir());

    // A purged branch that comes back starts over.
    source.set(&["main", "dev"]);
    let report = reconcile(&orch).await;
    assert_eq!(names(&report.created), vec!["dev"]);
}

#[tokio::test]
async fn reconcile_never_purges() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixedBranchSource::new(&["main", "dev"]);
    let orch = file_orchestrator(dir.path(), source.clone());
    reconcile(&orch).await;
    source.set(&[]);
    for _ in 0..3 {
        reconcile(&orch).await;
    }

    let snapshot = orch.snapshot().await;
    assert_eq!(snapshot.sub_projects.len(), 2);
    assert_eq!(snapshot.orphaned_branches(), vec!["dev", "main"]);
    assert!(orch.enabled_branches().await.is_empty());
}

#[tokio::test]
async fn purge_with_nothing_orphaned_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let orch = file_orchestrator(dir.path(), FixedBranchSource::new(&["main"]));
    reconcile(&orch).await;

    assert!(orch.purge_orphaned().await.unwrap().is_empty());
    assert_eq!(orch.enabled_branches().await, vec!["main"]);
}

#[tokio::test]
async fn delete_container_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("app");
    let orch = file_orchestrator(&root, FixedBranchSource::new(&["main", "dev"]));
    reconcile(&orch).await;
    assert!(root.join("config.json").is_file());

    orch.delete_container().await.unwrap();

    assert!(!root.exists());
    assert!(orch.snapshot().await.sub_projects.is_empty());
    assert!(orch.template().await.is_none());
}
