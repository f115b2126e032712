use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::nutrition::NutritionFact;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Campos del formulario multipart tal y como llegan, sin validar.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// `true` si llegó al menos una parte de fichero con nombre `image`.
    pub has_image_field: bool,
    pub images: Vec<UploadedFile>,
    pub weight: Option<String>,
}

/// Lote validado: peso finito y positivo, al menos una parte `image`.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub weight_grams: f64,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Image and weight are required")]
    MissingFields,
    #[error("Invalid image or weight")]
    InvalidImageOrWeight,
}

impl TryFrom<UploadForm> for UploadBatch {
    type Error = ValidationError;

    fn try_from(form: UploadForm) -> Result<Self, Self::Error> {
        let Some(raw_weight) = form.weight.filter(|_| form.has_image_field) else {
            return Err(ValidationError::MissingFields);
        };
        let weight_grams = raw_weight
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidImageOrWeight)?;
        if form.images.is_empty() || !weight_grams.is_finite() || weight_grams <= 0.0 {
            return Err(ValidationError::InvalidImageOrWeight);
        }
        Ok(Self { weight_grams, files: form.images })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    pub label: String,
    #[serde(flatten)]
    pub per_100g: NutritionFact,
}
