use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Los tres artefactos del modelo que se leen al arrancar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub weights: PathBuf,        // .onnx
    pub network_config: PathBuf, // .cfg de darknet
    pub class_names: PathBuf,    // una clase por línea
}

/// Lo que interesa del `.cfg` de darknet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub yolo_layers: usize,
    pub classes: Option<usize>,
}

/// Disposición del tensor de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// Se deduce de la forma del tensor y del número de clases.
    #[default]
    Auto,
    /// Filas `[cx, cy, w, h, objectness, scores...]` normalizadas a 0..1.
    Darknet,
    /// `[1, 4 + C, N]` con coordenadas en píxeles de la entrada.
    Ultralytics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_width: u32,
    pub input_height: u32,
    pub conf_threshold: f32,
    pub nms_threshold: f32,
    pub layout: OutputLayout,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_width: 416,
            input_height: 416,
            conf_threshold: 0.5,
            nms_threshold: 0.4,
            layout: OutputLayout::Auto,
        }
    }
}

/// Modelo listo para cargar: nombres de clase y red ya validados.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub network: NetworkSpec,
    pub class_names: Vec<String>,
}
