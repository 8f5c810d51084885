use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::{errors::ApiError, state::HttpState};
use crate::application::dto::HealthResponse;

/// Multipart field that carries the uploaded image.
pub const FILE_FIELD: &str = "file";
pub const PREDICTION_HEADER: HeaderName = HeaderName::from_static("prediction");
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::default())
}

pub async fn predict(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let upload = read_file_field(multipart?).await?;
    let prediction = st.prediction.predict(upload.to_vec()).await?;

    let results = prediction
        .results_header()
        .map_err(|e| ApiError::internal(format!("serializing results: {e}")))?;
    let results = HeaderValue::from_bytes(results.as_bytes())
        .map_err(|e| ApiError::internal(format!("results header: {e}")))?;
    let request_id = HeaderValue::from_str(&prediction.request_id.to_string())
        .map_err(|e| ApiError::internal(format!("request id header: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(prediction.media_type)),
            (PREDICTION_HEADER, results),
            (REQUEST_ID_HEADER, request_id),
        ],
        prediction.image,
    )
        .into_response())
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(ApiError::bad_request(format!("missing multipart field '{FILE_FIELD}'")))
}
