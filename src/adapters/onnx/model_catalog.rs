use async_trait::async_trait;
use std::path::Path;

use crate::adapters::onnx::darknet_cfg::parse_network_spec;
use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelArtifacts, ModelDescriptor};

pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

fn require_file(path: &Path, what: &str) -> DomainResult<()> {
    if path.as_os_str().is_empty() {
        return Err(DomainError::InvalidInput(format!("{what} path empty")));
    }
    if !path.is_file() {
        return Err(DomainError::NotFound(format!("{what} file not found: {}", path.display())));
    }
    Ok(())
}

/// Una clase por línea, conservando el índice de cada línea.
pub fn parse_class_names(text: &str) -> Vec<String> {
    text.trim()
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn describe(&self, artifacts: &ModelArtifacts) -> DomainResult<ModelDescriptor> {
        require_file(&artifacts.weights, "weights")?;
        require_file(&artifacts.network_config, "network config")?;
        require_file(&artifacts.class_names, "class names")?;

        let cfg_text = tokio::fs::read_to_string(&artifacts.network_config).await?;
        let network = parse_network_spec(&cfg_text)?;
        if network.channels != 3 {
            return Err(DomainError::InvalidInput(format!(
                "{} declares channels={}; only RGB (3) input is supported",
                artifacts.network_config.display(),
                network.channels
            )));
        }

        let names_text = tokio::fs::read_to_string(&artifacts.class_names).await?;
        if names_text.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "class names file is empty: {}",
                artifacts.class_names.display()
            )));
        }
        let class_names = parse_class_names(&names_text);

        if let Some(n) = network.classes {
            if n != class_names.len() {
                return Err(DomainError::InvalidInput(format!(
                    "{} declares {} classes but {} lists {}",
                    artifacts.network_config.display(),
                    n,
                    artifacts.class_names.display(),
                    class_names.len()
                )));
            }
        }

        Ok(ModelDescriptor { network, class_names })
    }
}
