use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{MultiBranchError, Result};
use crate::models::{
    Branch, BranchProject, BuildRecord, BuildResult, ContainerInfo, MultiBranchContainer,
    TemplateStatus, TEMPLATE_NAME,
};

use super::codec::TypeRegistry;
use super::discovery::{BranchFilter, BranchSource};
use super::flavor::ProjectFlavor;
use super::layout::{collision_key, decode_dir_name, encode_branch_name, ContainerLayout};
use super::reconcile_gate::{GateGuard, ReconcileGate};
use super::state::ProjectStore;
use super::template::{TemplateMaterializer, TemplateOutcome};

/// What asked for a reconciliation cycle. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCause {
    Manual,
    Poll,
    Webhook,
    Startup,
}

impl fmt::Display for TriggerCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Manual => "manual",
            Self::Poll => "poll",
            Self::Webhook => "webhook",
            Self::Startup => "startup",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBranch {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub name: String,
    pub error: String,
}

/// Everything one cycle changed or could not change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub reenabled: Vec<String>,
    pub retemplated: Vec<String>,
    pub orphaned: Vec<String>,
    pub skipped: Vec<SkippedBranch>,
    pub failures: Vec<BranchFailure>,
    pub template_status: TemplateStatus,
    pub template_error: Option<String>,
    pub container_saved: bool,
}

impl ReconcileReport {
    /// No sub-project was touched.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.reenabled.is_empty()
            && self.retemplated.is_empty()
            && self.orphaned.is_empty()
    }

    fn skip(&mut self, container: &str, name: &str, reason: String) {
        tracing::warn!(container = %container, branch = %name, reason = %reason, "branch_skipped");
        self.skipped.push(SkippedBranch {
            name: name.to_string(),
            reason,
        });
    }

    fn fail(&mut self, container: &str, name: &str, error: &MultiBranchError) {
        tracing::warn!(container = %container, branch = %name, error = %error, "branch_failed");
        self.failures.push(BranchFailure {
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// The section was held; its holder runs one more cycle on our behalf
    /// after releasing it.
    Coalesced,
}

/// Result of reading persisted sub-projects into the working copy.
#[derive(Debug, Default)]
struct Hydration {
    /// Branches whose persisted state exists but could not be loaded. They are
    /// left alone this cycle so nothing overwrites their history.
    unavailable: BTreeSet<String>,
    /// The branches directory itself could not be listed.
    listing_failed: bool,
}

/// Owns the branch sub-projects of one multi-branch container and keeps them
/// in step with the branches the source reports.
pub struct BranchProjectOrchestrator<F: ProjectFlavor> {
    info: ContainerInfo,
    flavor: F,
    store: Arc<dyn ProjectStore>,
    source: Arc<dyn BranchSource>,
    registry: TypeRegistry,
    layout: ContainerLayout,
    filter: BranchFilter,
    container: RwLock<MultiBranchContainer<F::Config>>,
    gate: ReconcileGate,
}

impl<F: ProjectFlavor> BranchProjectOrchestrator<F> {
    pub fn new(
        info: ContainerInfo,
        flavor: F,
        store: Arc<dyn ProjectStore>,
        source: Arc<dyn BranchSource>,
    ) -> Self {
        let registry = TypeRegistry::for_flavor(&flavor);
        let layout = ContainerLayout::new(info.root_dir.clone());
        Self {
            container: RwLock::new(MultiBranchContainer::new(info.clone())),
            info,
            flavor,
            store,
            source,
            registry,
            layout,
            filter: BranchFilter::default(),
            gate: ReconcileGate::new(),
        }
    }

    pub fn with_filter(mut self, filter: BranchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    pub fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    pub fn is_reconciling(&self) -> bool {
        self.gate.is_busy()
    }

    // ─── Readers (committed state, no writer lock) ─────────────────────

    pub async fn snapshot(&self) -> MultiBranchContainer<F::Config> {
        self.container.read().await.clone()
    }

    pub async fn sub_project(&self, name: &str) -> Option<BranchProject<F::Config>> {
        self.container.read().await.sub_projects.get(name).cloned()
    }

    pub async fn template(&self) -> Option<BranchProject<F::Config>> {
        self.container.read().await.template.clone()
    }

    pub async fn template_status(&self) -> TemplateStatus {
        self.container.read().await.template_status
    }

    pub async fn enabled_branches(&self) -> Vec<String> {
        self.container.read().await.enabled_branches()
    }

    pub async fn is_template(&self, name: &str) -> Result<bool> {
        let container = self.container.read().await;
        lookup(&container, name)
            .map(BranchProject::is_template)
            .ok_or_else(|| MultiBranchError::SubProjectNotFound(name.to_string()))
    }

    /// Build history of a branch, restricted to the flavor's build class.
    pub async fn build_history(&self, name: &str) -> Result<Vec<BuildRecord>> {
        let container = self.container.read().await;
        let project = lookup(&container, name)
            .ok_or_else(|| MultiBranchError::SubProjectNotFound(name.to_string()))?;
        let (accepted, foreign): (Vec<_>, Vec<_>) = project
            .builds
            .iter()
            .cloned()
            .partition(|b| self.flavor.accepts(b));
        if !foreign.is_empty() {
            tracing::debug!(
                container = %self.info.name,
                branch = %name,
                count = foreign.len(),
                "foreign_builds_filtered"
            );
        }
        Ok(accepted)
    }

    /// Most recent compatible build across all branch projects.
    pub async fn last_build(&self) -> Option<(String, BuildRecord)> {
        let container = self.container.read().await;
        container
            .sub_projects
            .values()
            .flat_map(|p| p.builds.iter().map(move |b| (p, b)))
            .filter(|(_, b)| self.flavor.accepts(b))
            .max_by_key(|(_, b)| (b.started_at, b.number))
            .map(|(p, b)| (p.name.clone(), b.clone()))
    }

    // ─── Loading ───────────────────────────────────────────────────────

    /// Load committed state from disk so readers and explicit writers see it
    /// before the first cycle. A persisted template is read as is; creating or
    /// normalizing it is left to the first cycle.
    pub async fn open(&self) -> Result<()> {
        let guard = self.gate.enter().await;
        let result = self.load_committed().await;
        self.release_writer(guard).await;
        result
    }

    async fn load_committed(&self) -> Result<()> {
        let mut work = self.container.read().await.clone();
        if let Some(doc) = self.store.load(self.layout.root()).await? {
            let state = self.registry.decode_container(&doc)?;
            if state.name != self.info.name {
                tracing::debug!(
                    container = %self.info.name,
                    persisted = %state.name,
                    "container_renamed"
                );
            }
            work.last_reconciled_at = state.last_reconciled_at;
        }
        match self.load_template().await {
            Ok(Some(template)) => {
                work.template = Some(template);
                work.template_status = TemplateStatus::Ready;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(container = %self.info.name, error = %e, "template_load_failed");
            }
        }
        let mut report = ReconcileReport::default();
        self.hydrate(&mut work, &mut report).await;
        tracing::info!(
            container = %self.info.name,
            sub_projects = work.sub_projects.len(),
            template = ?work.template_status,
            failures = report.failures.len(),
            "container_opened"
        );
        *self.container.write().await = work;
        Ok(())
    }

    async fn load_template(&self) -> Result<Option<BranchProject<F::Config>>> {
        let Some(doc) = self.store.load(&self.layout.template_dir()).await? else {
            return Ok(None);
        };
        self.registry.decode_project(&doc).map(Some)
    }

    async fn hydrate(
        &self,
        work: &mut MultiBranchContainer<F::Config>,
        report: &mut ReconcileReport,
    ) -> Hydration {
        let mut hydration = Hydration::default();
        let dir_names = match self.store.list(&self.layout.branches_dir()).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(container = %self.info.name, error = %e, "branch_listing_failed");
                hydration.listing_failed = true;
                return hydration;
            }
        };
        for dir_name in dir_names {
            let Some(name) = decode_dir_name(&dir_name) else {
                tracing::warn!(
                    container = %self.info.name,
                    dir = %dir_name,
                    "unrecognized_branch_dir"
                );
                continue;
            };
            if work.sub_projects.contains_key(&name) {
                continue;
            }
            match self.load_project(&name).await {
                Ok(Some(project)) => {
                    work.sub_projects.insert(name, project);
                }
                Ok(None) => {}
                Err(e) => {
                    report.fail(&self.info.name, &name, &e);
                    hydration.unavailable.insert(name);
                }
            }
        }
        hydration
    }

    async fn load_project(&self, name: &str) -> Result<Option<BranchProject<F::Config>>> {
        let dir = self.layout.branch_dir(name)?;
        let Some(doc) = self.store.load(&dir).await? else {
            return Ok(None);
        };
        let project: BranchProject<F::Config> = self.registry.decode_project(&doc)?;
        if project.name != name {
            return Err(MultiBranchError::InvalidState(format!(
                "{} holds sub-project '{}'",
                dir.display(),
                project.name
            )));
        }
        Ok(Some(project))
    }

    async fn save_project(&self, project: &BranchProject<F::Config>) -> Result<()> {
        let dir = self.layout.project_dir(&project.name)?;
        let doc = self.registry.encode(self.flavor.project_type(), project)?;
        self.store.save(&dir, &doc).await
    }

    async fn save_container(&self, work: &MultiBranchContainer<F::Config>) -> Result<()> {
        let doc = self
            .registry
            .encode(self.flavor.container_type(), &work.to_state())?;
        self.store.save(self.layout.root(), &doc).await
    }

    // ─── Reconciliation ────────────────────────────────────────────────

    /// Run one reconciliation cycle, or coalesce into the one in flight.
    ///
    /// Only a branch discovery failure is returned as an error. Template,
    /// per-branch and container persistence failures are logged and listed in
    /// the report; the next trigger retries them.
    pub async fn reconcile(&self, cause: TriggerCause) -> Result<ReconcileOutcome> {
        let Some(mut guard) = self.gate.try_enter(cause) else {
            tracing::debug!(container = %self.info.name, cause = %cause, "reconcile_coalesced");
            return Ok(ReconcileOutcome::Coalesced);
        };
        let mut cause = cause;
        let mut follow_up = false;
        loop {
            let result = self.run_cycle(cause, follow_up).await;
            drop(guard);
            let report = result?;
            let Some(pending) = self.gate.take_pending() else {
                return Ok(ReconcileOutcome::Completed(report));
            };
            match self.gate.try_enter(pending) {
                Some(next) => {
                    guard = next;
                    cause = pending;
                    follow_up = true;
                }
                None => return Ok(ReconcileOutcome::Completed(report)),
            }
        }
    }

    /// Release an explicit writer's hold on the section and run any cycle
    /// that was triggered while it held it.
    async fn release_writer(&self, guard: GateGuard<'_>) {
        drop(guard);
        let Some(cause) = self.gate.take_pending() else {
            return;
        };
        tracing::debug!(container = %self.info.name, cause = %cause, "deferred_reconcile");
        if let Err(e) = self.reconcile(cause).await {
            tracing::warn!(
                container = %self.info.name,
                cause = %cause,
                error = %e,
                "deferred_reconcile_failed"
            );
        }
    }

    async fn run_cycle(&self, cause: TriggerCause, follow_up: bool) -> Result<ReconcileReport> {
        let started = Instant::now();
        let name = self.info.name.as_str();
        tracing::info!(container = %name, cause = %cause, follow_up, "reconcile_started");

        let mut work = self.container.read().await.clone();
        let mut report = ReconcileReport::default();

        // Template first: every other step reads from it.
        let materializer = TemplateMaterializer {
            flavor: &self.flavor,
            store: self.store.as_ref(),
            registry: &self.registry,
            layout: &self.layout,
        };
        let outcome = materializer.materialize(&work.info).await;
        report.template_status = outcome.status();
        work.template_status = report.template_status;
        let template_usable = match outcome {
            TemplateOutcome::Loaded(template) | TemplateOutcome::Created(template) => {
                work.template = Some(template);
                true
            }
            TemplateOutcome::Failed(e) => {
                report.template_error = Some(e.to_string());
                false
            }
        };

        let hydration = self.hydrate(&mut work, &mut report).await;

        let branches = match self.source.list_branches(&work.info).await {
            Ok(branches) => self.filter.apply(branches),
            Err(e) => {
                tracing::warn!(container = %name, error = %e, "branch_discovery_failed");
                *self.container.write().await = work;
                return Err(match e {
                    MultiBranchError::Discovery(_) => e,
                    other => MultiBranchError::Discovery(other.to_string()),
                });
            }
        };
        let discovered = self.validate_branches(branches, &work, &hydration, &mut report);

        // Re-templating waits for a usable template; creation can still seed
        // from the last one this process saw.
        let retemplate_from = if template_usable {
            work.template.clone()
        } else {
            None
        };
        let seed = work.template.clone();

        for (branch_name, branch) in &discovered {
            if hydration.unavailable.contains(branch_name) {
                report.skip(name, branch_name, "persisted state unavailable".into());
                continue;
            }
            let existing = work.sub_projects.get(branch_name).cloned();
            let updated = match existing {
                Some(existing) => {
                    self.refresh_sub_project(
                        &existing,
                        branch,
                        retemplate_from.as_ref(),
                        &mut report,
                    )
                    .await
                }
                None if hydration.listing_failed => {
                    report.skip(name, branch_name, "branch directory unreadable".into());
                    None
                }
                None => {
                    self.create_sub_project(&work.info, branch, seed.as_ref(), &mut report)
                        .await
                }
            };
            if let Some(project) = updated {
                work.sub_projects.insert(branch_name.clone(), project);
            }
        }

        let vanished: Vec<String> = work
            .sub_projects
            .keys()
            .filter(|n| !discovered.contains_key(*n))
            .cloned()
            .collect();
        for branch_name in vanished {
            let Some(existing) = work.sub_projects.get(&branch_name).cloned() else {
                continue;
            };
            if let Some(project) = self.retire_sub_project(&existing, &mut report).await {
                work.sub_projects.insert(branch_name, project);
            }
        }

        work.last_reconciled_at = Some(Utc::now());
        match self.save_container(&work).await {
            Ok(()) => report.container_saved = true,
            Err(e) => tracing::warn!(container = %name, error = %e, "container_save_failed"),
        }

        *self.container.write().await = work;
        tracing::info!(
            container = %name,
            created = report.created.len(),
            reenabled = report.reenabled.len(),
            retemplated = report.retemplated.len(),
            orphaned = report.orphaned.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            template = ?report.template_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reconcile_completed"
        );
        Ok(report)
    }

    /// Drop discovered branches that cannot become sub-projects this cycle.
    fn validate_branches(
        &self,
        branches: Vec<Branch>,
        work: &MultiBranchContainer<F::Config>,
        hydration: &Hydration,
        report: &mut ReconcileReport,
    ) -> BTreeMap<String, Branch> {
        let mut accepted = BTreeMap::new();
        // Unreadable branch directories still own their name on disk.
        let mut keys: HashMap<String, String> = work
            .sub_projects
            .keys()
            .chain(&hydration.unavailable)
            .map(|n| (collision_key(n), n.clone()))
            .collect();
        for branch in branches {
            if accepted.contains_key(&branch.name) {
                continue;
            }
            if let Err(e) = encode_branch_name(&branch.name) {
                report.skip(&self.info.name, &branch.name, e.to_string());
                continue;
            }
            let key = collision_key(&branch.name);
            if let Some(existing) = keys.get(&key) {
                if *existing != branch.name {
                    let e = MultiBranchError::NameCollision {
                        name: branch.name.clone(),
                        existing: existing.clone(),
                    };
                    report.skip(&self.info.name, &branch.name, e.to_string());
                    continue;
                }
            }
            keys.insert(key, branch.name.clone());
            accepted.insert(branch.name.clone(), branch);
        }
        accepted
    }

    async fn create_sub_project(
        &self,
        info: &ContainerInfo,
        branch: &Branch,
        template: Option<&BranchProject<F::Config>>,
        report: &mut ReconcileReport,
    ) -> Option<BranchProject<F::Config>> {
        let mut project = self.flavor.create(info, &branch.name, template);
        project.name = branch.name.clone();
        project.set_template(false);
        project.disabled = false;
        project.orphaned = false;
        project.last_revision = branch.revision.clone();
        match self.save_project(&project).await {
            Ok(()) => {
                tracing::info!(
                    container = %info.name,
                    branch = %branch.name,
                    "sub_project_created"
                );
                report.created.push(branch.name.clone());
                Some(project)
            }
            Err(e) => {
                report.fail(&info.name, &branch.name, &e);
                None
            }
        }
    }

    async fn refresh_sub_project(
        &self,
        existing: &BranchProject<F::Config>,
        branch: &Branch,
        template: Option<&BranchProject<F::Config>>,
        report: &mut ReconcileReport,
    ) -> Option<BranchProject<F::Config>> {
        let mut updated = existing.clone();
        let reenabled = updated.adopt();
        if updated.is_template() {
            tracing::warn!(
                container = %self.info.name,
                branch = %branch.name,
                "branch_template_flag_cleared"
            );
            updated.set_template(false);
        }
        let retemplated = template.is_some_and(|t| updated.apply_template(t));
        if branch.revision.is_some() {
            updated.last_revision = branch.revision.clone();
        }
        if updated == *existing {
            return None;
        }
        match self.save_project(&updated).await {
            Ok(()) => {
                if reenabled {
                    tracing::info!(
                        container = %self.info.name,
                        branch = %branch.name,
                        "sub_project_reenabled"
                    );
                    report.reenabled.push(branch.name.clone());
                }
                if retemplated {
                    report.retemplated.push(branch.name.clone());
                }
                Some(updated)
            }
            Err(e) => {
                report.fail(&self.info.name, &branch.name, &e);
                None
            }
        }
    }

    async fn retire_sub_project(
        &self,
        existing: &BranchProject<F::Config>,
        report: &mut ReconcileReport,
    ) -> Option<BranchProject<F::Config>> {
        if existing.orphaned {
            return None;
        }
        let mut updated = existing.clone();
        updated.orphan();
        match self.save_project(&updated).await {
            Ok(()) => {
                tracing::info!(
                    container = %self.info.name,
                    branch = %updated.name,
                    "sub_project_orphaned"
                );
                report.orphaned.push(updated.name.clone());
                Some(updated)
            }
            Err(e) => {
                report.fail(&self.info.name, &existing.name, &e);
                None
            }
        }
    }

    // ─── Explicit writers (wait for the writer lock) ───────────────────

    /// Flip the template flag of `name` and persist it. Setting it also
    /// disables the project; clearing it leaves the enabled flag alone.
    ///
    /// On error the persisted flag may or may not have changed; re-query with
    /// [`Self::is_template`] or retry.
    pub async fn mark_template(&self, name: &str, is_template: bool) -> Result<()> {
        let guard = self.gate.enter().await;
        let result = self.write_template_flag(name, is_template).await;
        self.release_writer(guard).await;
        result
    }

    async fn write_template_flag(&self, name: &str, is_template: bool) -> Result<()> {
        let mut updated = {
            let container = self.container.read().await;
            lookup(&container, name)
                .cloned()
                .ok_or_else(|| MultiBranchError::SubProjectNotFound(name.to_string()))?
        };
        updated.set_template(is_template);
        self.save_project(&updated).await?;
        store_project(&mut *self.container.write().await, updated);
        tracing::info!(
            container = %self.info.name,
            project = %name,
            is_template,
            "template_flag_changed"
        );
        Ok(())
    }

    /// Replace the template's configuration. Branch projects pick it up on the
    /// next cycle.
    pub async fn update_template_config(&self, config: F::Config) -> Result<()> {
        let guard = self.gate.enter().await;
        let result = self.write_template_config(config).await;
        self.release_writer(guard).await;
        result
    }

    async fn write_template_config(&self, config: F::Config) -> Result<()> {
        let mut template = {
            let container = self.container.read().await;
            match (&container.template, container.template_status) {
                (Some(template), TemplateStatus::Ready) => template.clone(),
                (_, status) => {
                    return Err(MultiBranchError::TemplateUnavailable(format!(
                        "template is {status:?}"
                    )))
                }
            }
        };
        template.config = config;
        self.save_project(&template).await?;
        self.container.write().await.template = Some(template);
        tracing::info!(container = %self.info.name, "template_config_updated");
        Ok(())
    }

    /// Append a build to a branch project's history.
    pub async fn record_build(
        &self,
        name: &str,
        result: BuildResult,
        revision: Option<String>,
        duration: Duration,
    ) -> Result<BuildRecord> {
        let guard = self.gate.enter().await;
        let recorded = self.append_build(name, result, revision, duration).await;
        self.release_writer(guard).await;
        recorded
    }

    async fn append_build(
        &self,
        name: &str,
        result: BuildResult,
        revision: Option<String>,
        duration: Duration,
    ) -> Result<BuildRecord> {
        let mut project = {
            let container = self.container.read().await;
            lookup(&container, name)
                .cloned()
                .ok_or_else(|| MultiBranchError::SubProjectNotFound(name.to_string()))?
        };
        if !project.is_buildable() {
            return Err(MultiBranchError::NotBuildable(name.to_string()));
        }
        let elapsed =
            chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        let record = BuildRecord {
            number: project.next_build_number(),
            build_class: self.flavor.build_class().to_string(),
            result,
            revision,
            started_at: Utc::now() - elapsed,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        };
        project.builds.push(record.clone());
        self.save_project(&project).await?;
        store_project(&mut *self.container.write().await, project);
        tracing::info!(
            container = %self.info.name,
            branch = %name,
            number = record.number,
            result = ?record.result,
            "build_recorded"
        );
        Ok(record)
    }

    /// Explicit cleanup: delete the storage of every orphaned sub-project.
    /// Never run by reconciliation. Returns the purged names.
    pub async fn purge_orphaned(&self) -> Result<Vec<String>> {
        let guard = self.gate.enter().await;
        let result = self.remove_orphans().await;
        self.release_writer(guard).await;
        result
    }

    async fn remove_orphans(&self) -> Result<Vec<String>> {
        let mut work = self.container.read().await.clone();
        let mut purged = Vec::new();
        for name in work.orphaned_branches() {
            let dir = self.layout.branch_dir(&name)?;
            match self.store.remove(&dir).await {
                Ok(()) => {
                    work.sub_projects.remove(&name);
                    purged.push(name);
                }
                Err(e) => {
                    tracing::warn!(
                        container = %self.info.name,
                        branch = %name,
                        error = %e,
                        "purge_failed"
                    );
                }
            }
        }
        if !purged.is_empty() {
            if let Err(e) = self.save_container(&work).await {
                tracing::warn!(container = %self.info.name, error = %e, "container_save_failed");
            }
        }
        tracing::info!(container = %self.info.name, count = purged.len(), "orphans_purged");
        *self.container.write().await = work;
        Ok(purged)
    }

    /// Delete the container and everything it owns. Triggers that arrive
    /// meanwhile are dropped; a cycle would only recreate the container.
    pub async fn delete_container(&self) -> Result<()> {
        let guard = self.gate.enter().await;
        let result = self.store.remove(self.layout.root()).await;
        if result.is_ok() {
            *self.container.write().await = MultiBranchContainer::new(self.info.clone());
            tracing::info!(container = %self.info.name, "container_deleted");
        }
        drop(guard);
        if let Some(cause) = self.gate.take_pending() {
            tracing::debug!(container = %self.info.name, cause = %cause, "trigger_dropped");
        }
        result
    }
}

fn lookup<'a, C>(
    container: &'a MultiBranchContainer<C>,
    name: &str,
) -> Option<&'a BranchProject<C>> {
    if name == TEMPLATE_NAME {
        container.template.as_ref()
    } else {
        container.sub_projects.get(name)
    }
}

fn store_project<C>(container: &mut MultiBranchContainer<C>, project: BranchProject<C>) {
    if project.name == TEMPLATE_NAME {
        container.template = Some(project);
    } else {
        container.sub_projects.insert(project.name.clone(), project);
    }
}
