use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GpuError, GpuResult};

use super::PipelineConfiguration;

/// Name-keyed pipeline map.
///
/// Materials register their configurations once and call sites select them by
/// logical name ("opaque", "opaque_no_depth", ...) instead of by index.
#[derive(Default)]
pub struct PipelineLibrary {
    pipelines: HashMap<String, Arc<PipelineConfiguration>>,
}

impl PipelineLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `config` under `name`, returning any replaced configuration.
    pub fn insert(
        &mut self,
        name: &str,
        config: Arc<PipelineConfiguration>,
    ) -> Option<Arc<PipelineConfiguration>> {
        self.pipelines.insert(name.to_owned(), config)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PipelineConfiguration>> {
        self.pipelines.get(name).cloned()
    }

    /// Like [`get`](Self::get), but a missing name is a contract violation.
    pub fn require(&self, name: &str) -> GpuResult<Arc<PipelineConfiguration>> {
        self.get(name)
            .ok_or_else(|| GpuError::contract(format!("no pipeline registered as '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
