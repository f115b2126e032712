use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
};

/// Adaptador del puerto de detección: abre la imagen guardada y ejecuta YOLO
/// en el pool bloqueante de Tokio. La sesión ONNX es única y se serializa con un Mutex.
#[derive(Clone)]
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
}

impl OnnxDetector {
    pub fn new(engine: OnnxYoloEngine) -> Self {
        let p = engine.params();
        info!(
            "Detector listo: entrada {}x{}, conf > {}, NMS {}, salida {:?}",
            p.input_width, p.input_height, p.conf_threshold, p.nms_threshold, p.layout
        );
        Self { engine: Arc::new(Mutex::new(engine)) }
    }
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();
        let path = image_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let rgb = image::open(&path)
                .map_err(|e| DomainError::InvalidInput(format!("cannot read image: {e}")))?
                .to_rgb8();
            // Un pánico previo no deja la sesión a medias: se sigue usando.
            let mut eng = engine.lock().unwrap_or_else(PoisonError::into_inner);
            eng.detect(&rgb).map_err(|e| DomainError::Inference(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("inference task failed: {e}")))?
    }
}
