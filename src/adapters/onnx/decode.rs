use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix2};
use tracing::debug;

use crate::domain::detection::{non_max_suppression, BoundingBox, Detection};
use crate::domain::model::OutputLayout;

/// Datos fijos para decodificar las salidas de una imagen.
pub struct DecodeContext<'a> {
    pub image_width: u32,
    pub image_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub conf_threshold: f32,
    pub classes: &'a [String],
}

impl DecodeContext<'_> {
    fn label(&self, class_id: usize) -> String {
        self.classes
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }
}

/// Blob NCHW en RGB escalado a 0..1, estirando la imagen al tamaño de entrada (sin recorte).
pub fn preprocess(rgb: &RgbImage, input_width: u32, input_height: u32) -> Array4<f32> {
    let resized = image::imageops::resize(rgb, input_width, input_height, FilterType::Triangle);

    let mut input = Array4::<f32>::zeros((1, 3, input_height as usize, input_width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    input
}

/// Resuelve `Auto` comparando la forma del tensor con el número de clases.
pub fn resolve_layout(shape: &[usize], num_classes: usize, requested: OutputLayout) -> Result<OutputLayout> {
    let last = shape.last().copied().unwrap_or(0);
    match requested {
        OutputLayout::Darknet if last == num_classes + 5 => Ok(OutputLayout::Darknet),
        OutputLayout::Ultralytics if shape.len() == 3 && shape[1] == num_classes + 4 => {
            Ok(OutputLayout::Ultralytics)
        }
        OutputLayout::Auto if last == num_classes + 5 => Ok(OutputLayout::Darknet),
        OutputLayout::Auto if shape.len() == 3 && shape[1] == num_classes + 4 => Ok(OutputLayout::Ultralytics),
        _ => Err(anyhow!(
            "output shape {:?} does not match layout {:?} with {} classes",
            shape,
            requested,
            num_classes
        )),
    }
}

/// Índice y valor de la puntuación máxima; en empate gana el primero.
fn best_class(scores: impl Iterator<Item = f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, s) in scores.enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ if s.is_nan() => {}
            _ => best = Some((i, s)),
        }
    }
    best
}

/// Candidatos (antes de NMS) de un tensor de salida.
pub fn decode_output(view: ArrayViewD<'_, f32>, layout: OutputLayout, ctx: &DecodeContext) -> Result<Vec<Detection>> {
    let layout = resolve_layout(view.shape(), ctx.classes.len(), layout)?;
    match layout {
        OutputLayout::Darknet => decode_darknet(view, ctx),
        OutputLayout::Ultralytics => decode_ultralytics(view, ctx),
        OutputLayout::Auto => unreachable!("resolve_layout never returns Auto"),
    }
}

/// Decodifica todas las salidas de la sesión y aplica NMS sobre el conjunto.
pub fn decode_outputs(
    views: &[ArrayViewD<'_, f32>],
    layout: OutputLayout,
    ctx: &DecodeContext,
    nms_threshold: f32,
) -> Result<Vec<Detection>> {
    let mut candidates = Vec::new();
    for view in views {
        candidates.extend(decode_output(view.view(), layout, ctx)?);
    }

    let before = candidates.len();
    let kept = non_max_suppression(candidates, ctx.conf_threshold, nms_threshold);
    debug!("YOLO: {} candidatos, {} tras NMS", before, kept.len());
    Ok(kept)
}

/// Caja en píxeles; `None` si el modelo devuelve coordenadas no finitas.
fn pixel_box(cx: f32, cy: f32, w: f32, h: f32) -> Option<BoundingBox> {
    [cx, cy, w, h]
        .iter()
        .all(|v| v.is_finite())
        .then(|| BoundingBox::from_center(cx, cy, w, h))
}

fn decode_darknet(view: ArrayViewD<'_, f32>, ctx: &DecodeContext) -> Result<Vec<Detection>> {
    let cols = view.shape().last().copied().unwrap_or(0);
    let rows = if cols == 0 { 0 } else { view.len() / cols };
    let table = view.to_shape((rows, cols))?;

    let (w, h) = (ctx.image_width as f32, ctx.image_height as f32);
    let mut out = Vec::new();
    for row in table.outer_iter() {
        let Some((class_id, confidence)) = best_class(row.iter().skip(5).copied()) else { continue };
        if confidence <= ctx.conf_threshold {
            continue;
        }
        let Some(bbox) = pixel_box(row[0] * w, row[1] * h, row[2] * w, row[3] * h) else { continue };
        out.push(Detection { bbox, score: confidence, class_id, label: ctx.label(class_id) });
    }
    Ok(out)
}

fn decode_ultralytics(view: ArrayViewD<'_, f32>, ctx: &DecodeContext) -> Result<Vec<Detection>> {
    let preds = view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
    let sx = ctx.image_width as f32 / ctx.input_width as f32;
    let sy = ctx.image_height as f32 / ctx.input_height as f32;

    let mut out = Vec::new();
    for col in preds.axis_iter(Axis(1)) {
        let Some((class_id, confidence)) = best_class(col.iter().skip(4).copied()) else { continue };
        if confidence <= ctx.conf_threshold {
            continue;
        }
        let Some(bbox) = pixel_box(col[0] * sx, col[1] * sy, col[2] * sx, col[3] * sy) else { continue };
        out.push(Detection { bbox, score: confidence, class_id, label: ctx.label(class_id) });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn classes() -> Vec<String> {
        vec!["apple".into(), "banana".into(), "orange".into()]
    }

    fn ctx(classes: &[String]) -> DecodeContext<'_> {
        DecodeContext {
            image_width: 200,
            image_height: 100,
            input_width: 416,
            input_height: 416,
            conf_threshold: 0.5,
            classes,
        }
    }

    #[test]
    fn layout_is_resolved_from_shape() {
        assert_eq!(resolve_layout(&[1, 507, 8], 3, OutputLayout::Auto).unwrap(), OutputLayout::Darknet);
        assert_eq!(resolve_layout(&[507, 8], 3, OutputLayout::Auto).unwrap(), OutputLayout::Darknet);
        assert_eq!(resolve_layout(&[1, 7, 8400], 3, OutputLayout::Auto).unwrap(), OutputLayout::Ultralytics);
        assert!(resolve_layout(&[1, 7, 8400], 3, OutputLayout::Darknet).is_err());
        assert!(resolve_layout(&[1, 10, 10], 3, OutputLayout::Auto).is_err());
    }

    #[test]
    fn darknet_rows_are_thresholded_and_scaled() {
        let names = classes();
        let rows = Array2::from_shape_vec(
            (3, 8),
            vec![
                // cx   cy   w    h    obj  apple banana orange
                0.5, 0.5, 0.2, 0.4, 0.9, 0.1, 0.8, 0.0,
                0.1, 0.1, 0.1, 0.1, 0.9, 0.5, 0.2, 0.1, // 0.5 no supera el umbral
                0.25, 0.75, 0.1, 0.2, 0.9, 0.7, 0.0, 0.7,
            ],
        )
        .unwrap();

        let out = decode_output(rows.into_dyn().view(), OutputLayout::Auto, &ctx(&names)).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "banana");
        // cx=100, cy=50, w=40, h=40
        assert_eq!(out[0].bbox, BoundingBox { x: 80, y: 30, width: 40, height: 40 });
        // empate apple/orange: gana el primero
        assert_eq!(out[1].class_id, 0);
        assert_eq!(out[1].label, "apple");
    }

    #[test]
    fn ultralytics_columns_are_rescaled_from_input() {
        let names = classes();
        let ctx = DecodeContext { input_width: 400, input_height: 400, ..ctx(&names) };
        let mut t = Array3::<f32>::zeros((1, 7, 2));
        // candidato 0: centro (200, 200) tamaño 100x200 en la entrada 400x400, orange 0.9
        t[[0, 0, 0]] = 200.0;
        t[[0, 1, 0]] = 200.0;
        t[[0, 2, 0]] = 100.0;
        t[[0, 3, 0]] = 200.0;
        t[[0, 6, 0]] = 0.9;
        // candidato 1: por debajo del umbral
        t[[0, 4, 1]] = 0.3;

        let out = decode_output(t.into_dyn().view(), OutputLayout::Ultralytics, &ctx).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "orange");
        // escala 0.5 x 0.25 -> centro (100, 50), tamaño 50x50
        assert_eq!(out[0].bbox, BoundingBox { x: 75, y: 25, width: 50, height: 50 });
    }

    #[test]
    fn rows_with_non_finite_geometry_are_dropped() {
        let names = classes();
        let rows = Array2::from_shape_vec(
            (2, 8),
            vec![
                0.5, 0.5, f32::INFINITY, 0.4, 0.9, 0.9, 0.0, 0.0,
                0.5, 0.5, 0.2, f32::NAN, 0.9, 0.0, 0.9, 0.0,
            ],
        )
        .unwrap();

        let out = decode_output(rows.into_dyn().view(), OutputLayout::Darknet, &ctx(&names)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn all_outputs_are_merged_before_suppression() {
        let names = classes();
        // dos escalas que ven el mismo plátano y una manzana aparte
        let coarse = Array2::from_shape_vec(
            (2, 8),
            vec![
                0.5, 0.5, 0.2, 0.4, 0.9, 0.0, 0.7, 0.0,
                0.1, 0.1, 0.1, 0.1, 0.9, 0.6, 0.0, 0.0,
            ],
        )
        .unwrap()
        .into_dyn();
        let fine = Array2::from_shape_vec((1, 8), vec![0.51, 0.5, 0.2, 0.4, 0.9, 0.0, 0.95, 0.0])
            .unwrap()
            .into_dyn();

        let out = decode_outputs(&[coarse.view(), fine.view()], OutputLayout::Auto, &ctx(&names), 0.4).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "banana");
        assert_eq!(out[0].score, 0.95);
        assert_eq!(out[1].label, "apple");
    }

    #[test]
    fn unknown_class_index_gets_placeholder_label() {
        let names = classes();
        assert_eq!(ctx(&names).label(7), "class_7");
    }

    #[test]
    fn preprocess_builds_rgb_nchw_blob() {
        let mut img = RgbImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = image::Rgb([255, 0, 51]);
        }
        let blob = preprocess(&img, 4, 4);
        assert_eq!(blob.shape(), &[1, 3, 4, 4]);
        assert!((blob[[0, 0, 3, 3]] - 1.0).abs() < 1e-6);
        assert!(blob[[0, 1, 0, 0]].abs() < 1e-6);
        assert!((blob[[0, 2, 1, 2]] - 0.2).abs() < 1e-6);
    }
}
