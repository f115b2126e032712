use std::sync::Arc;
use crate::application::services::AnalysisService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Caso de uso de subida: guardado, detección y nutrición.
    pub analysis: Arc<AnalysisService>,
}
