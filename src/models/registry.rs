//! Label-to-model registry used when hydrating nodes of unknown kind.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::model::Model;

/// Explicit mapping from node label to model.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model under its label, replacing any previous one.
    pub fn register(&mut self, model: Arc<Model>) -> &mut Self {
        self.models.insert(model.label().to_string(), model);
        self
    }

    pub fn get(&self, label: &str) -> Option<&Arc<Model>> {
        self.models.get(label)
    }

    /// Resolves the first of `labels` that has a registered model.
    pub fn resolve(&self, labels: &[String]) -> Result<Arc<Model>, AppError> {
        labels
            .iter()
            .find_map(|label| self.models.get(label))
            .cloned()
            .ok_or_else(|| AppError::UnknownLabel(labels.to_vec()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<Arc<Model>> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<Model>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for model in iter {
            registry.register(model);
        }
        registry
    }
}
