use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use tokio::time::MissedTickBehavior;

use mb_core::models::{ContainerInfo, MultiBranchConfig, MultiBranchContainer, TEMPLATE_NAME};
use mb_core::services::{
    config_loader, BranchFilter, BranchProjectOrchestrator, GitBranchSource, JsonFileStore,
    MavenFlavor, ProjectConfig, ProjectFlavor, ReconcileOutcome, ReconcileReport,
    RepositoryLocation, TriggerCause,
};

use crate::cli::Command;
use crate::registry::FlavorKind;

/// Load the container at `root`, pick its flavor and run `command` against it.
pub async fn run(root: &Path, command: &Command) -> color_eyre::Result<()> {
    let config = config_loader::load(root)
        .wrap_err_with(|| format!("loading container config from {}", root.display()))?;
    let kind: FlavorKind = config.flavor.parse()?;
    tracing::debug!(root = %root.display(), flavor = %kind, "container_config_loaded");
    match kind {
        FlavorKind::Maven => execute(MavenFlavor, &config, root, command).await,
    }
}

async fn execute<F: ProjectFlavor>(
    flavor: F,
    config: &MultiBranchConfig,
    root: &Path,
    command: &Command,
) -> color_eyre::Result<()> {
    let info = ContainerInfo::new(container_name(root), root);
    let source = GitBranchSource::new(repository(root, config), config.remote.clone());
    let filter = BranchFilter::from_config(&config.branches)?;
    let store = Arc::new(JsonFileStore::new());
    let orchestrator =
        BranchProjectOrchestrator::new(info, flavor, store, Arc::new(source)).with_filter(filter);
    orchestrator.open().await?;

    match command {
        Command::Reconcile => {
            let report = reconcile_once(&orchestrator, TriggerCause::Manual).await?;
            print!("{}", render_report(&report));
        }
        Command::Watch { interval_secs } => {
            let every = Duration::from_secs(interval_secs.unwrap_or(config.poll_interval_secs()));
            watch(&orchestrator, every).await;
        }
        Command::Status { json } => {
            let snapshot = orchestrator.snapshot().await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&status_json(&snapshot)?)?);
            } else {
                print!("{}", render_status(&snapshot));
            }
        }
        Command::MarkTemplate { name, is_template } => {
            orchestrator.mark_template(name, *is_template).await?;
            println!("{name}: template = {is_template}");
        }
        Command::Purge => {
            let purged = orchestrator.purge_orphaned().await?;
            if purged.is_empty() {
                println!("nothing to purge");
            }
            for name in purged {
                println!("purged {name}");
            }
        }
    }
    Ok(())
}

async fn reconcile_once<F: ProjectFlavor>(
    orchestrator: &BranchProjectOrchestrator<F>,
    cause: TriggerCause,
) -> color_eyre::Result<ReconcileReport> {
    match orchestrator.reconcile(cause).await? {
        ReconcileOutcome::Completed(report) => Ok(report),
        // Nothing else runs cycles in this process.
        ReconcileOutcome::Coalesced => Ok(ReconcileReport::default()),
    }
}

/// Reconcile at startup and then every `every` until Ctrl-C. Cycle errors are
/// logged and the next tick retries.
async fn watch<F: ProjectFlavor>(orchestrator: &BranchProjectOrchestrator<F>, every: Duration) {
    tracing::info!(
        container = %orchestrator.info().name,
        interval_secs = every.as_secs(),
        "watch_started"
    );
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut cause = TriggerCause::Startup;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match reconcile_once(orchestrator, cause).await {
                    Ok(report) if !report.is_noop() => print!("{}", render_report(&report)),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "watch_cycle_failed"),
                }
                cause = TriggerCause::Poll;
            }
            _ = &mut shutdown => {
                tracing::info!(container = %orchestrator.info().name, "watch_stopped");
                break;
            }
        }
    }
}

fn container_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "multibranch".to_string())
}

/// Relative repository paths are resolved against the container root; URLs
/// are passed to git untouched.
pub fn repository(root: &Path, config: &MultiBranchConfig) -> RepositoryLocation {
    RepositoryLocation::resolve(root, &config.repository)
}

pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    let sections = [
        ("created", &report.created),
        ("re-enabled", &report.reenabled),
        ("re-templated", &report.retemplated),
        ("disabled", &report.orphaned),
    ];
    for (label, names) in sections {
        for name in names {
            let _ = writeln!(out, "{label:<13}{name}");
        }
    }
    for skipped in &report.skipped {
        let _ = writeln!(out, "{:<13}{} ({})", "skipped", skipped.name, skipped.reason);
    }
    for failure in &report.failures {
        let _ = writeln!(out, "{:<13}{} ({})", "failed", failure.name, failure.error);
    }
    if let Some(error) = &report.template_error {
        let _ = writeln!(out, "{:<13}{}", "template", error);
    }
    if report.is_noop() && report.skipped.is_empty() && report.failures.is_empty() {
        out.push_str("up to date\n");
    }
    out
}

fn project_state(disabled: bool, orphaned: bool, is_template: bool) -> &'static str {
    if is_template {
        "template"
    } else if orphaned {
        "orphaned"
    } else if disabled {
        "disabled"
    } else {
        "enabled"
    }
}

pub fn render_status<C>(container: &MultiBranchContainer<C>) -> String {
    let mut out = String::new();
    let reconciled = container
        .last_reconciled_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(
        out,
        "{}  template: {:?}  last reconciled: {reconciled}",
        container.info.name, container.template_status
    );
    let width = container
        .sub_projects
        .keys()
        .map(String::len)
        .chain(std::iter::once(TEMPLATE_NAME.len()))
        .max()
        .unwrap_or(0);
    for project in container.sub_projects.values() {
        let state = project_state(project.disabled, project.orphaned, project.is_template());
        let last = project
            .builds
            .iter()
            .max_by_key(|b| b.number)
            .map(|b| format!("#{} {:?}", b.number, b.result))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<width$}  {state:<9}  builds: {:<4} last: {last}",
            project.name,
            project.builds.len()
        );
    }
    if let Some(template) = &container.template {
        let state = project_state(template.disabled, template.orphaned, template.is_template());
        let _ = writeln!(out, "  {:<width$}  {state}", TEMPLATE_NAME);
    }
    out
}

pub fn status_json<C: ProjectConfig>(
    container: &MultiBranchContainer<C>,
) -> color_eyre::Result<serde_json::Value> {
    let mut projects = Vec::new();
    for project in container.sub_projects.values() {
        projects.push(serde_json::json!({
            "name": project.name,
            "disabled": project.disabled,
            "orphaned": project.orphaned,
            "template": project.is_template(),
            "lastRevision": project.last_revision,
            "builds": project.builds.len(),
            "config": serde_json::to_value(&project.config)?,
        }));
    }
    let template = container
        .template
        .as_ref()
        .map(|t| serde_json::to_value(&t.config))
        .transpose()?;
    Ok(serde_json::json!({
        "name": container.info.name,
        "templateStatus": format!("{:?}", container.template_status),
        "lastReconciledAt": container.last_reconciled_at,
        "template": template,
        "subProjects": projects,
    }))
}
