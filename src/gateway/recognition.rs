//! `POST /api/recognition`: image understanding relay.
//!
//! The uploaded image is inlined as a base64 data URL next to the instruction
//! text in a single chat message. The reply is returned as
//! `{text, raw}`: `text` flattens the first choice's content, `raw` is the
//! full upstream body.

use super::AppState;
use super::error::{GatewayError, GatewayResult};
use super::form::ImageForm;
use super::upstream;
use crate::config::ARK_API_KEY;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct RecognitionResponse {
    pub text: String,
    pub raw: Value,
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

impl ChatRequest {
    /// One user message: instruction text first, then the image.
    pub fn describe_image(model: &str, prompt: &str, image_url: String) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ],
            }],
        }
    }
}

/// Flatten `choices[0].message.content` into plain text.
///
/// Array content keeps only `text` parts, joined by newlines and trimmed;
/// string content is returned as-is; anything else yields an empty string.
pub fn extract_text(result: &Value) -> String {
    match result.pointer("/choices/0/message/content") {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

pub async fn recognize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> GatewayResult<Json<RecognitionResponse>> {
    let key = state
        .credentials
        .ark
        .as_ref()
        .ok_or(GatewayError::MissingCredential(ARK_API_KEY))?;

    let mut form = ImageForm::read(multipart?).await?;
    let image = form.take_image()?;

    let settings = &state.config.recognition;
    let prompt = form.text("prompt").unwrap_or(&settings.prompt);
    let mime = image
        .content_type
        .as_deref()
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME);
    let payload =
        ChatRequest::describe_image(&settings.model, prompt, data_url(mime, &image.bytes));

    let response = upstream::send(
        state
            .http
            .post(&settings.endpoint)
            .bearer_auth(key.expose())
            .json(&payload),
        &upstream::RECOGNITION,
    )
    .await?;

    let raw: Value = response.json().await?;
    Ok(Json(RecognitionResponse {
        text: extract_text(&raw),
        raw,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_url_encodes_bytes() {
        assert_eq!(data_url("image/jpeg", b"abc"), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn chat_request_shape() {
        let req = ChatRequest::describe_image("m-1", "what is this?", "data:x".into());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "m-1",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "what is this?"},
                        {"type": "image_url", "image_url": {"url": "data:x"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn extract_text_from_parts() {
        let result = json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "  A cat"},
                {"type": "image_url", "image_url": {"url": "ignored"}},
                {"type": "text", "text": "on a sofa.  "}
            ]}}]
        });
        assert_eq!(extract_text(&result), "A cat\non a sofa.");
    }

    #[test]
    fn extract_text_from_string_content() {
        let result = json!({"choices": [{"message": {"content": " A dog "}}]});
        assert_eq!(extract_text(&result), " A dog ");
    }

    #[test]
    fn extract_text_missing_content() {
        assert_eq!(extract_text(&json!({})), "");
        assert_eq!(extract_text(&json!({"choices": []})), "");
        assert_eq!(
            extract_text(&json!({"choices": [{"message": {"content": 5}}]})),
            ""
        );
    }
}
