//! `POST /api/ai-generation`: text-to-image relay.
//!
//! Inbound JSON `{prompt, size?, response_format?, model?, watermark?, ...}`
//! is reshaped into the images API request. The upstream JSON (a `data[]`
//! array of `{url}` or `{b64_json}`) is returned as-is.
//!
//! Only `prompt` is checked here. Every other field is copied as raw JSON,
//! whatever its type; the images API decides what it accepts.

use super::AppState;
use super::error::{GatewayError, GatewayResult};
use super::upstream;
use crate::config::{ARK_API_KEY, GenerationConfig};
use axum::{Json, body::Bytes, extract::State, extract::rejection::BytesRejection};
use serde::Serialize;
use serde_json::{Map, Value};

/// Optional knobs forwarded only when the request names them.
const ADVANCED_PARAMS: [&str; 4] = ["n", "cfg_scale", "sampler", "steps"];

/// Inbound request body as a raw JSON object.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest(Map<String, Value>);

impl GenerationRequest {
    /// Parse a request body. Anything that is not a JSON object reads as an
    /// empty request.
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(Value::Object(fields)) => Self(fields),
            _ => Self::default(),
        }
    }

    /// The prompt, when it is a non-empty string.
    pub fn prompt(&self) -> Option<&str> {
        self.0
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|prompt| !prompt.is_empty())
    }

    /// A field holding a usable value: not null, `false`, `0` or `""`.
    fn set(&self, key: &str) -> Option<Value> {
        self.0.get(key).filter(|value| is_set(value)).cloned()
    }

    /// A field that is not null.
    fn non_null(&self, key: &str) -> Option<Value> {
        self.0.get(key).filter(|value| !value.is_null()).cloned()
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

/// Outbound images API request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPayload {
    pub model: Value,
    pub prompt: String,
    pub sequential_image_generation: Value,
    pub response_format: Value,
    pub size: Value,
    pub stream: bool,
    pub watermark: Value,
    /// `n`, `cfg_scale`, `sampler`, `steps` exactly as sent, `null` included.
    #[serde(flatten)]
    pub advanced: Map<String, Value>,
}

impl GenerationPayload {
    /// Validate `request` and fill in defaults from `defaults`.
    pub fn shape(request: &GenerationRequest, defaults: &GenerationConfig) -> GatewayResult<Self> {
        let prompt = request
            .prompt()
            .ok_or_else(|| GatewayError::missing_field("prompt"))?
            .to_string();
        let or_default = |key: &str, default: &str| {
            request
                .set(key)
                .unwrap_or_else(|| Value::from(default))
        };

        let advanced = ADVANCED_PARAMS
            .iter()
            .filter_map(|key| request.0.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();

        Ok(Self {
            model: or_default("model", &defaults.model),
            prompt,
            sequential_image_generation: or_default(
                "sequential_image_generation",
                &defaults.sequential_image_generation,
            ),
            response_format: or_default("response_format", &defaults.response_format),
            size: or_default("size", &defaults.size),
            stream: false,
            watermark: request
                .non_null("watermark")
                .unwrap_or(Value::Bool(defaults.watermark)),
            advanced,
        })
    }
}

pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Json<Value>> {
    let key = state
        .credentials
        .ark
        .as_ref()
        .ok_or(GatewayError::MissingCredential(ARK_API_KEY))?;

    let request = GenerationRequest::parse(&body?);
    let defaults = &state.config.generation;
    let payload = GenerationPayload::shape(&request, defaults)?;

    let response = upstream::send(
        state
            .http
            .post(&defaults.endpoint)
            .bearer_auth(key.expose())
            .json(&payload),
        &upstream::GENERATION,
    )
    .await?;

    let result: Value = response.json().await?;
    Ok(Json(result))
}
