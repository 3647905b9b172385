//! Template materialization: load the persisted template or create a fresh
//! one, and force it into the READY shape (`isTemplate`, disabled).

use crate::error::MultiBranchError;
use crate::models::{BranchProject, ContainerInfo, TemplateStatus, TEMPLATE_NAME};

use super::codec::TypeRegistry;
use super::flavor::ProjectFlavor;
use super::layout::ContainerLayout;
use super::state::ProjectStore;

#[derive(Debug)]
pub enum TemplateOutcome<C> {
    Loaded(BranchProject<C>),
    Created(BranchProject<C>),
    /// Persisted state exists but could not be read or decoded. Never cached.
    Failed(MultiBranchError),
}

impl<C> TemplateOutcome<C> {
    pub fn status(&self) -> TemplateStatus {
        match self {
            Self::Loaded(_) | Self::Created(_) => TemplateStatus::Ready,
            Self::Failed(_) => TemplateStatus::LoadFailed,
        }
    }
}

pub struct TemplateMaterializer<'a, F: ProjectFlavor> {
    pub flavor: &'a F,
    pub store: &'a dyn ProjectStore,
    pub registry: &'a TypeRegistry,
    pub layout: &'a ContainerLayout,
}

impl<F: ProjectFlavor> TemplateMaterializer<'_, F> {
    pub async fn materialize(&self, info: &ContainerInfo) -> TemplateOutcome<F::Config> {
        let template_dir = self.layout.template_dir();
        let persisted = match self.store.load(&template_dir).await {
            Ok(doc) => doc,
            Err(e) => return self.failed(info, e),
        };

        match persisted {
            Some(doc) => {
                trace_status(info, TemplateStatus::Loading);
                let mut template: BranchProject<F::Config> =
                    match self.registry.decode_project(&doc) {
                        Ok(template) => template,
                        Err(e) => return self.failed(info, e),
                    };
                let normalized = template.name != TEMPLATE_NAME
                    || !template.is_template()
                    || !template.disabled;
                template.name = TEMPLATE_NAME.to_string();
                template.set_template(true);
                if normalized {
                    self.persist(info, &template).await;
                }
                trace_status(info, TemplateStatus::Ready);
                TemplateOutcome::Loaded(template)
            }
            None => {
                trace_status(info, TemplateStatus::Creating);
                let mut template = self.flavor.create(info, TEMPLATE_NAME, None);
                template.set_template(true);
                self.persist(info, &template).await;
                trace_status(info, TemplateStatus::Ready);
                TemplateOutcome::Created(template)
            }
        }
    }

    async fn persist(&self, info: &ContainerInfo, template: &BranchProject<F::Config>) {
        let result = match self.registry.encode(self.flavor.project_type(), template) {
            Ok(doc) => self.store.save(&self.layout.template_dir(), &doc).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            // The in-memory template is still usable for this cycle.
            tracing::warn!(container = %info.name, error = %e, "template_save_failed");
        }
    }

    fn failed(&self, info: &ContainerInfo, error: MultiBranchError) -> TemplateOutcome<F::Config> {
        tracing::warn!(
            container = %info.name,
            dir = %self.layout.template_dir().display(),
            error = %error,
            "template_load_failed"
        );
        TemplateOutcome::Failed(error)
    }
}

fn trace_status(info: &ContainerInfo, status: TemplateStatus) {
    tracing::debug!(container = %info.name, status = ?status, "template_status");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::flavor::SubProjectFactory;
    use crate::services::maven::{MavenFlavor, MAVEN_PROJECT_TYPE};
    use crate::services::state::JsonFileStore;

    fn fixture(root: &std::path::Path) -> (ContainerInfo, ContainerLayout, TypeRegistry) {
        (
            ContainerInfo::new("app", root),
            ContainerLayout::new(root),
            TypeRegistry::for_flavor(&MavenFlavor),
        )
    }

    #[tokio::test]
    async fn creates_and_persists_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let (info, layout, registry) = fixture(dir.path());
        let materializer = TemplateMaterializer {
            flavor: &MavenFlavor,
            store: &JsonFileStore,
            registry: &registry,
            layout: &layout,
        };

        let outcome = materializer.materialize(&info).await;
        assert_eq!(outcome.status(), TemplateStatus::Ready);
        let TemplateOutcome::Created(template) = outcome else {
            panic!("expected a created template");
        };
        assert!(template.is_template());
        assert!(template.disabled);
        assert!(layout.template_dir().join("config.json").is_file());

        let again = materializer.materialize(&info).await;
        assert!(matches!(again, TemplateOutcome::Loaded(_)));
    }

    #[tokio::test]
    async fn loaded_template_is_forced_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let (info, layout, registry) = fixture(dir.path());
        let mut stray = MavenFlavor.create(&info, "not-template", None);
        stray.config.goals = "deploy".into();
        let doc = registry.encode(MAVEN_PROJECT_TYPE, &stray).unwrap();
        JsonFileStore.save(&layout.template_dir(), &doc).await.unwrap();

        let materializer = TemplateMaterializer {
            flavor: &MavenFlavor,
            store: &JsonFileStore,
            registry: &registry,
            layout: &layout,
        };
        let TemplateOutcome::Loaded(template) = materializer.materialize(&info).await else {
            panic!("expected a loaded template");
        };
        assert_eq!(template.name, TEMPLATE_NAME);
        assert!(template.is_template());
        assert!(template.disabled);
        assert_eq!(template.config.goals, "deploy");
    }

    #[tokio::test]
    async fn corrupt_template_fails_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let (info, layout, registry) = fixture(dir.path());
        std::fs::create_dir_all(layout.template_dir()).unwrap();
        let path = layout.template_dir().join("config.json");
        std::fs::write(&path, "<xml/>").unwrap();

        let materializer = TemplateMaterializer {
            flavor: &MavenFlavor,
            store: &JsonFileStore,
            registry: &registry,
            layout: &layout,
        };
        let outcome = materializer.materialize(&info).await;
        assert_eq!(outcome.status(), TemplateStatus::LoadFailed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<xml/>");
    }
}
