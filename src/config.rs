use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::domain::model::{ModelArtifacts, NetworkSpec, OutputLayout, YoloParams};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub weights: PathBuf,
    pub network_config: PathBuf,
    pub class_names: PathBuf,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    pub conf_threshold: f32,
    pub nms_threshold: f32,
    /// Si falta, se usa el `[net]` del `.cfg`.
    #[serde(default)]
    pub input_size: Option<u32>,
    #[serde(default)]
    pub layout: OutputLayout,
}

impl ModelConfig {
    pub fn artifacts(&self) -> ModelArtifacts {
        ModelArtifacts {
            weights: self.weights.clone(),
            network_config: self.network_config.clone(),
            class_names: self.class_names.clone(),
        }
    }
}

impl DetectionConfig {
    pub fn params(&self, network: &NetworkSpec) -> YoloParams {
        let (input_width, input_height) = match self.input_size {
            Some(s) => (s, s),
            None => (network.width, network.height),
        };
        YoloParams {
            input_width,
            input_height,
            conf_threshold: self.conf_threshold,
            nms_threshold: self.nms_threshold,
            layout: self.layout,
        }
    }
}

impl AppConfig {
    /// Valores por defecto, después el fichero (si se da) y por último `NUTRISCAN__*`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.static_dir", "static")?
            .set_default("server.upload_dir", "static/uploads")?
            .set_default("server.max_upload_bytes", 32 * 1024 * 1024)?
            .set_default("model.weights", "yolov3.onnx")?
            .set_default("model.network_config", "yolov3.cfg")?
            .set_default("model.class_names", "coco.names")?
            .set_default("model.intra_threads", 4)?
            .set_default("detection.conf_threshold", 0.5)?
            .set_default("detection.nms_threshold", 0.4)?
            .set_default("detection.layout", "auto")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let cfg: Self = builder
            .add_source(Environment::with_prefix("NUTRISCAN").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f32| {
            if v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(ConfigError::Message(format!("{name} must be in (0, 1], got {v}")))
            }
        };
        unit("detection.conf_threshold", self.detection.conf_threshold)?;
        unit("detection.nms_threshold", self.detection.nms_threshold)?;
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Message("server.max_upload_bytes must be positive".into()));
        }
        if self.detection.input_size == Some(0) {
            return Err(ConfigError::Message("detection.input_size must be positive".into()));
        }
        Ok(())
    }
}
