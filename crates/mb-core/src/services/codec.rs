//! Versioned tagged-union encoding for persisted container and sub-project
//! state. Every document names its type alias and schema version; decoding
//! goes through an explicit alias table instead of guessing from content.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{MultiBranchError, Result};
use crate::models::{BranchProject, ContainerState};

use super::flavor::ProjectFlavor;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub schema_version: u32,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Container,
    SubProject,
}

impl DocumentKind {
    fn label(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::SubProject => "sub-project",
        }
    }
}

/// A decoded document, dispatched on its registered kind.
#[derive(Debug, Clone)]
pub enum DecodedState<C> {
    Container(ContainerState),
    SubProject(BranchProject<C>),
}

/// Alias → kind dispatch table. Built explicitly per orchestrator; there is no
/// process-wide registration.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, DocumentKind>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_flavor<F: ProjectFlavor>(flavor: &F) -> Self {
        let mut registry = Self::new();
        registry.register(flavor.container_type(), DocumentKind::Container);
        registry.register(flavor.project_type(), DocumentKind::SubProject);
        registry
    }

    pub fn register(&mut self, alias: &str, kind: DocumentKind) {
        self.entries.insert(alias.to_string(), kind);
    }

    pub fn kind_of(&self, alias: &str) -> Option<DocumentKind> {
        self.entries.get(alias).copied()
    }

    pub fn encode<T: Serialize>(&self, alias: &str, value: &T) -> Result<StateDocument> {
        if self.kind_of(alias).is_none() {
            return Err(MultiBranchError::UnknownTypeTag(alias.to_string()));
        }
        Ok(StateDocument {
            type_tag: alias.to_string(),
            schema_version: SCHEMA_VERSION,
            body: serde_json::to_value(value)?,
        })
    }

    pub fn decode<C: DeserializeOwned>(&self, doc: &StateDocument) -> Result<DecodedState<C>> {
        let kind = self
            .kind_of(&doc.type_tag)
            .ok_or_else(|| MultiBranchError::UnknownTypeTag(doc.type_tag.clone()))?;
        if doc.schema_version == 0 || doc.schema_version > SCHEMA_VERSION {
            return Err(MultiBranchError::UnsupportedSchemaVersion {
                found: doc.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        let state = match kind {
            DocumentKind::Container => DecodedState::Container(body_as(doc)?),
            DocumentKind::SubProject => DecodedState::SubProject(body_as(doc)?),
        };
        Ok(state)
    }

    pub fn decode_container(&self, doc: &StateDocument) -> Result<ContainerState> {
        match self.decode::<serde_json::Value>(doc)? {
            DecodedState::Container(state) => Ok(state),
            DecodedState::SubProject(_) => Err(kind_mismatch(
                doc,
                DocumentKind::SubProject,
                DocumentKind::Container,
            )),
        }
    }

    pub fn decode_project<C: DeserializeOwned>(
        &self,
        doc: &StateDocument,
    ) -> Result<BranchProject<C>> {
        match self.decode::<C>(doc)? {
            DecodedState::SubProject(project) => Ok(project),
            DecodedState::Container(_) => Err(kind_mismatch(
                doc,
                DocumentKind::Container,
                DocumentKind::SubProject,
            )),
        }
    }
}

fn body_as<T: DeserializeOwned>(doc: &StateDocument) -> Result<T> {
    serde_json::from_value(doc.body.clone()).map_err(|e| {
        MultiBranchError::InvalidState(format!("malformed '{}' document: {e}", doc.type_tag))
    })
}

fn kind_mismatch(
    doc: &StateDocument,
    found: DocumentKind,
    expected: DocumentKind,
) -> MultiBranchError {
    MultiBranchError::KindMismatch {
        tag: doc.type_tag.clone(),
        found: found.label(),
        expected: expected.label(),
    }
}
