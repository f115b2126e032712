use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::UploadStorePort;
use crate::domain::errors::{DomainError, DomainResult};

/// Guarda las subidas en un directorio local (`static/uploads` por defecto).
/// Los ficheros no se borran: el directorio es almacenamiento transitorio.
pub struct LocalUploadStore {
    root: PathBuf,
}

impl LocalUploadStore {
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Último componente del nombre enviado por el cliente (acepta `/` y `\`).
pub fn sanitize_filename(name: &str) -> Option<&str> {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or("").trim();
    match base {
        "" | "." | ".." => None,
        b => Some(b),
    }
}

#[async_trait]
impl UploadStorePort for LocalUploadStore {
    async fn save(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| DomainError::InvalidInput(format!("unusable filename {filename:?}")))?;
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
