use anyhow::Result;
use image::RgbImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;

use crate::adapters::onnx::decode::{decode_outputs, preprocess, DecodeContext};
use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

pub struct OnnxYoloEngine {
    session: Session,
    output_count: usize,
    classes: Vec<String>,
    params: YoloParams,
}

impl OnnxYoloEngine {
    pub fn load(path: &Path, classes: Vec<String>, params: YoloParams, intra_threads: usize) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;
        let output_count = session.outputs.len();

        Ok(Self { session, output_count, classes, params })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }

    /// Detecta sobre una imagen RGB: blob, inferencia, decodificación de todas las salidas y NMS.
    pub fn detect(&mut self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let (in_w, in_h) = (self.params.input_width, self.params.input_height);
        let blob = preprocess(rgb, in_w, in_h);

        let input_shape = vec![1_i64, 3, in_h as i64, in_w as i64];
        let input_tensor = Tensor::from_array((input_shape, blob.into_raw_vec_and_offset().0))?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;

        let ctx = DecodeContext {
            image_width: rgb.width(),
            image_height: rgb.height(),
            input_width: in_w,
            input_height: in_h,
            conf_threshold: self.params.conf_threshold,
            classes: &self.classes,
        };

        let mut views = Vec::with_capacity(self.output_count);
        for i in 0..self.output_count {
            let (shape_out, data_out) = outputs[i].try_extract_tensor::<f32>()?;
            let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
            views.push(ArrayViewD::from_shape(IxDyn(&dims), data_out)?);
        }

        decode_outputs(&views, self.params.layout, &ctx, self.params.nms_threshold)
    }
}
