//! Agent template loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::AgentTemplate;
use crate::loaders::{LoadResult, read_file};

/// Agent template catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<AgentTemplate>,
}

/// Loader for agent templates from RON files.
pub struct TemplateLoader;

impl TemplateLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AgentTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load templates from {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AgentTemplate>> {
        let catalog: TemplateCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse template catalog RON: {}", e))?;
        Ok(catalog.templates)
    }
}
