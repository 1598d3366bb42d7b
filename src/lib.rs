//! # imgdesk
//!
//! An image utility desk: lossy re-encoding that runs locally, plus thin
//! relays to three hosted image services (text-to-image generation, visual
//! recognition, background removal).
//!
//! # Architecture: Two Component Shapes
//!
//! ```text
//! compress:  bytes ─► ImageAsset ─► EncodingRequest ─► RustBackend ─► EncodingResult
//! gateway:   form/JSON ─► validate ─► reshape ─► one upstream call ─► normalized reply
//! ```
//!
//! The re-encoder never touches the network and never changes pixel
//! dimensions; only the encoded format and byte size move. The relays hold
//! no state between requests beyond a shared HTTP connection pool.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Re-encode engine: quality clamp, format policy, backend, size reporting |
//! | [`gateway`] | axum router and the three relays with uniform `{error}` responses |
//! | [`config`] | `config.toml` loading, merging, validation; credentials from the environment |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Format Follows the Source
//!
//! The output format is not a user choice. Sources that can carry alpha (PNG,
//! WebP) are written as lossy WebP so transparency survives; everything else
//! becomes JPEG. The only knob is quality, clamped into 1–100.
//!
//! ## Credentials Stay Server-Side
//!
//! API keys are read from the environment into a redacting wrapper and checked
//! before a request body is even looked at. A relay without its key answers
//! `500 {"error": "Server missing <KEY>"}` and makes no outbound call.
//!
//! ## Upstream Errors Pass Through
//!
//! A failing upstream status is forwarded unchanged; only the message is
//! normalized (see [`gateway::upstream`]). Nothing is retried.

pub mod config;
pub mod gateway;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
