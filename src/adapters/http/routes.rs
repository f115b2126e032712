use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{HealthResponse, UploadBatch, UploadForm, UploadedFile, ValidationError};
use crate::domain::report::AnalysisReport;

const IMAGE_FIELD: &str = "image";
const WEIGHT_FIELD: &str = "weight";

/// Lee el formulario completo antes de validar: el peso puede llegar después de las imágenes.
async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match (name.as_str(), file_name) {
            (IMAGE_FIELD, Some(filename)) => {
                form.has_image_field = true;
                let bytes = field.bytes().await?.to_vec();
                form.images.push(UploadedFile { filename, bytes });
            }
            (WEIGHT_FIELD, None) => {
                form.weight = Some(field.text().await?);
            }
            _ => {}
        }
    }
    Ok(form)
}

pub async fn upload_images(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let Ok(mut multipart) = multipart else {
        warn!("POST /upload sin cuerpo multipart");
        return Err(ValidationError::MissingFields.into());
    };

    let form = read_upload_form(&mut multipart).await?;
    let batch = UploadBatch::try_from(form)?;
    let report = st.analysis.analyze(batch).await?;
    Ok(Json(report))
}

pub async fn list_foods(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.analysis.foods())
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".into() })
}
