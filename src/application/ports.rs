use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{detection::Detection, errors::DomainResult, model::{ModelArtifacts, ModelDescriptor}};

/// Detector de objetos sobre una imagen ya guardada en disco.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>>;
}

/// Almacenamiento transitorio de las imágenes subidas.
#[async_trait]
pub trait UploadStorePort: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    /// Comprueba que los artefactos existen y los lee (red + nombres de clase).
    async fn describe(&self, artifacts: &ModelArtifacts) -> DomainResult<ModelDescriptor>;
}
