pub mod darknet_cfg;
pub mod decode;
pub mod detector;
pub mod model_catalog;
pub mod yolo_engine;
