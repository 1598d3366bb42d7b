//! `POST /api/remove-bg`: background removal relay, plus a `GET` health check.
//!
//! The upload is re-sent as multipart with the API key header. The cut-out
//! image comes back byte-for-byte with the upstream content type and
//! `Cache-Control: no-store`.

use super::AppState;
use super::error::{GatewayError, GatewayResult};
use super::form::{IMAGE_FIELD, ImageForm, UploadedImage};
use super::upstream;
use crate::config::REMOVE_BG_API_KEY;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::header,
    response::{IntoResponse, Response},
};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

const DEFAULT_FILE_NAME: &str = "upload.png";
const DEFAULT_RESULT_TYPE: &str = "image/png";

/// Build the outbound file part, keeping the caller's file name and type.
///
/// A content type reqwest cannot parse is dropped rather than failing the
/// request.
fn image_part(image: &UploadedImage) -> Part {
    let file_name = image
        .file_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    let part = || Part::bytes(image.bytes.to_vec()).file_name(file_name.clone());

    match image.content_type.as_deref() {
        Some(mime) => part().mime_str(mime).unwrap_or_else(|_| part()),
        None => part(),
    }
}

pub async fn remove_background(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> GatewayResult<Response> {
    let key = state
        .credentials
        .remove_bg
        .as_ref()
        .ok_or(GatewayError::MissingCredential(REMOVE_BG_API_KEY))?;

    let mut form = ImageForm::read(multipart?).await?;
    let image = form.take_image()?;

    let settings = &state.config.remove_bg;
    let size = form.text("size").unwrap_or(&settings.size).to_string();
    let outbound = Form::new()
        .part(IMAGE_FIELD, image_part(&image))
        .text("size", size);

    let response = upstream::send(
        state
            .http
            .post(&settings.endpoint)
            .header("X-Api-Key", key.expose())
            .header(header::ACCEPT, DEFAULT_RESULT_TYPE)
            .multipart(outbound),
        &upstream::REMOVE_BG,
    )
    .await?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_RESULT_TYPE)
        .to_string();
    let bytes = response.bytes().await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// Reports whether the key is configured without revealing it.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "hasKey": state.credentials.remove_bg.is_some(),
    }))
}

