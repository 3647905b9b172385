// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use mb_core::models::{Branch, ContainerInfo};
use mb_core::services::{
    BranchProjectOrchestrator, BranchSource, JsonFileStore, MavenFlavor, ProjectStore,
    ReconcileOutcome, ReconcileReport, StateDocument, TriggerCause,
};
use mb_core::{MultiBranchError, Result};

pub type MavenOrchestrator = BranchProjectOrchestrator<MavenFlavor>;

/// Branch source whose answer the test sets between cycles.
#[derive(Default)]
pub struct FixedBranchSource {
    branches: Mutex<Vec<Branch>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FixedBranchSource {
    pub fn new(names: &[&str]) -> Arc<Self> {
        let source = Self::default();
        source.set(names);
        Arc::new(source)
    }

    pub fn set(&self, names: &[&str]) {
        *self.branches.lock().unwrap() = names.iter().map(|n| Branch::named(*n)).collect();
    }

    pub fn set_branches(&self, branches: Vec<Branch>) {
        *self.branches.lock().unwrap() = branches;
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BranchSource for FixedBranchSource {
    async fn list_branches(&self, _container: &ContainerInfo) -> Result<Vec<Branch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MultiBranchError::Discovery("remote unreachable".into()));
        }
        Ok(self.branches.lock().unwrap().clone())
    }
}

/// Branch source that parks its first call until the test releases it, so a
/// cycle can be held in flight.
pub struct GatedBranchSource {
    inner: Arc<FixedBranchSource>,
    holding: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedBranchSource {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: FixedBranchSource::new(names),
            holding: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn set(&self, names: &[&str]) {
        self.inner.set(names);
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }

    /// Let the parked call continue; later calls no longer park.
    pub fn open(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }
}

#[async_trait]
impl BranchSource for GatedBranchSource {
    async fn list_branches(&self, container: &ContainerInfo) -> Result<Vec<Branch>> {
        if self.holding.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.list_branches(container).await
    }
}

/// File store that can be told to fail loads or saves for given directories.
#[derive(Default)]
pub struct FlakyStore {
    inner: JsonFileStore,
    failing_loads: Mutex<HashSet<PathBuf>>,
    failing_saves: Mutex<HashSet<PathBuf>>,
    all_saves_fail: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_load(&self, dir: impl Into<PathBuf>) {
        self.failing_loads.lock().unwrap().insert(dir.into());
    }

    pub fn fail_save(&self, dir: impl Into<PathBuf>) {
        self.failing_saves.lock().unwrap().insert(dir.into());
    }

    pub fn fail_all_saves(&self, failing: bool) {
        self.all_saves_fail.store(failing, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing_loads.lock().unwrap().clear();
        self.failing_saves.lock().unwrap().clear();
        self.all_saves_fail.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectStore for FlakyStore {
    async fn load(&self, dir: &Path) -> Result<Option<StateDocument>> {
        if self.failing_loads.lock().unwrap().contains(dir) {
            return Err(MultiBranchError::State(format!(
                "injected read failure: {}",
                dir.display()
            )));
        }
        self.inner.load(dir).await
    }

    async fn save(&self, dir: &Path, doc: &StateDocument) -> Result<()> {
        let failing = self.all_saves_fail.load(Ordering::SeqCst)
            || self.failing_saves.lock().unwrap().contains(dir);
        if failing {
            return Err(MultiBranchError::State(format!(
                "injected write failure: {}",
                dir.display()
            )));
        }
        self.inner.save(dir, doc).await
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>> {
        self.inner.list(dir).await
    }

    async fn remove(&self, dir: &Path) -> Result<()> {
        self.inner.remove(dir).await
    }
}

/// File store whose saves park once `hold` is called, so an explicit writer
/// can be held inside the writer section.
#[derive(Default)]
pub struct GatedStore {
    inner: JsonFileStore,
    holding: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn hold(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Let the parked save continue; later saves no longer park.
    pub fn open(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }
}

#[async_trait]
impl ProjectStore for GatedStore {
    async fn load(&self, dir: &Path) -> Result<Option<StateDocument>> {
        self.inner.load(dir).await
    }

    async fn save(&self, dir: &Path, doc: &StateDocument) -> Result<()> {
        if self.holding.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.save(dir, doc).await
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>> {
        self.inner.list(dir).await
    }

    async fn remove(&self, dir: &Path) -> Result<()> {
        self.inner.remove(dir).await
    }
}

pub fn orchestrator(
    root: &Path,
    store: Arc<dyn ProjectStore>,
    source: Arc<dyn BranchSource>,
) -> MavenOrchestrator {
    BranchProjectOrchestrator::new(ContainerInfo::new("app", root), MavenFlavor, store, source)
}

/// Orchestrator over a plain file store.
pub fn file_orchestrator(root: &Path, source: Arc<dyn BranchSource>) -> MavenOrchestrator {
    orchestrator(root, Arc::new(JsonFileStore::new()), source)
}

pub async fn reconcile(orchestrator: &MavenOrchestrator) -> ReconcileReport {
    match orchestrator.reconcile(TriggerCause::Manual).await.unwrap() {
        ReconcileOutcome::Completed(report) => report,
        ReconcileOutcome::Coalesced => panic!("no other cycle should be in flight"),
    }
}

pub fn names(list: &[String]) -> Vec<&str> {
    list.iter().map(String::as_str).collect()
}

/// Exactly one project in the container carries the template flag, and it is
/// the template slot.
pub async fn assert_single_template(orchestrator: &MavenOrchestrator) {
    let snapshot = orchestrator.snapshot().await;
    let template = snapshot.template.as_ref().expect("template materialized");
    assert!(template.is_template());
    assert!(template.disabled);
    for project in snapshot.sub_projects.values() {
        assert!(!project.is_template(), "{} carries the template flag", project.name);
    }
}
