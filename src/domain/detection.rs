use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Caja alineada a los ejes, en píxeles de la imagen original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Caja a partir de centro y tamaño ya escalados a píxeles.
    /// Cada componente se trunca antes de calcular la esquina superior izquierda.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        let (cx, cy, w, h) = (cx as i32, cy as i32, w as i32, h as i32);
        Self {
            x: (cx as f64 - w as f64 / 2.0) as i32,
            y: (cy as f64 - h as f64 / 2.0) as i32,
            width: w,
            height: h,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Área de la intersección. Los bordes se calculan en `i64` para que las
    /// cajas saturadas a `i32::MAX` no desborden.
    pub fn intersection_area(&self, other: &BoundingBox) -> i64 {
        let right = |b: &BoundingBox| b.x as i64 + b.width.max(0) as i64;
        let bottom = |b: &BoundingBox| b.y as i64 + b.height.max(0) as i64;
        let w = right(self).min(right(other)) - (self.x.max(other.x) as i64);
        let h = bottom(self).min(bottom(other)) - (self.y.max(other.y) as i64);
        if w <= 0 || h <= 0 {
            return 0;
        }
        w * h
    }

    /// Intersección sobre unión. Dos cajas vacías cuentan como idénticas (1.0).
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let a = self.area();
        let b = other.area();
        if a + b == 0 {
            return 1.0;
        }
        let inter = self.intersection_area(other);
        (inter as f64 / (a + b - inter) as f64) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

/// Supresión de no-máximos voraz y agnóstica de clase.
///
/// Descarta candidatos con `score <= score_threshold`, recorre el resto por
/// confianza descendente (orden estable en empates) y elimina todo candidato
/// cuyo IoU con alguna caja ya conservada supere `iou_threshold`.
/// El resultado queda ordenado por confianza descendente.
pub fn non_max_suppression(
    candidates: Vec<Detection>,
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<Detection> {
    let mut ordered: Vec<Detection> = candidates
        .into_iter()
        .filter(|d| d.score > score_threshold)
        .collect();
    ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::with_capacity(ordered.len());
    for candidate in ordered {
        if kept.iter().all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Etiquetas en el orden de las detecciones; se descartan puntuación y geometría.
pub fn labels(detections: &[Detection]) -> Vec<String> {
    detections.iter().map(|d| d.label.clone()).collect()
}
