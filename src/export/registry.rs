//! Exporter registry for looking up dataset exporters by id.

use std::collections::HashMap;

use crate::export::error::ExportError;
use crate::export::formats::{
    DetMmocrExporter, DetPaddleExporter, KieExporter, RecMmocrExporter, RecPaddleExporter,
};
use crate::export::traits::DatasetExporter;

/// Registry of available exporters.
///
/// All built-in exporters are registered on creation.
pub struct ExporterRegistry {
    exporters: HashMap<&'static str, Box<dyn DatasetExporter>>,
}

impl ExporterRegistry {
    /// Create a new registry with all built-in exporters registered.
    pub fn new() -> Self {
        let mut registry = Self {
            exporters: HashMap::new(),
        };

        registry.register(Box::new(DetPaddleExporter));
        registry.register(Box::new(DetMmocrExporter));
        registry.register(Box::new(RecPaddleExporter));
        registry.register(Box::new(RecMmocrExporter));
        registry.register(Box::new(KieExporter));

        registry
    }

    /// Register an exporter, replacing any with the same id.
    pub fn register(&mut self, exporter: Box<dyn DatasetExporter>) {
        self.exporters.insert(exporter.id(), exporter);
    }

    /// Get an exporter by its id.
    pub fn get(&self, id: &str) -> Option<&dyn DatasetExporter> {
        self.exporters.get(id).map(|e| e.as_ref())
    }

    /// Get an exporter by id, failing for unknown ids.
    pub fn require(&self, id: &str) -> Result<&dyn DatasetExporter, ExportError> {
        self.get(id)
            .ok_or_else(|| ExportError::UnknownExporter(id.to_string()))
    }

    /// Get all registered exporters, ordered by id.
    pub fn all(&self) -> Vec<&dyn DatasetExporter> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Get all exporter ids, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.exporters.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
