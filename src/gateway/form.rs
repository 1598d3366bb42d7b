//! Multipart upload reading shared by the image-taking gateways.

use super::error::GatewayError;
use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;

pub const IMAGE_FIELD: &str = "image_file";

/// The uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// An inbound form: at most one image plus its text fields.
#[derive(Debug, Default)]
pub struct ImageForm {
    image: Option<UploadedImage>,
    fields: HashMap<String, String>,
}

impl ImageForm {
    /// Drain `multipart`.
    ///
    /// Only a *file* part (one with a filename) named `image_file` counts as
    /// the image; a plain text field of that name does not. Repeated names
    /// keep the first value.
    pub async fn read(mut multipart: Multipart) -> Result<Self, GatewayError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let is_file = file_name.is_some();

            if name == IMAGE_FIELD && is_file {
                let bytes = field.bytes().await?;
                form.image.get_or_insert(UploadedImage {
                    bytes,
                    file_name,
                    content_type,
                });
            } else if !is_file {
                let text = field.text().await?;
                form.fields.entry(name).or_insert(text);
            }
        }

        Ok(form)
    }

    /// A text field, treating an empty value as missing.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Take the uploaded image, or fail with a client-input error.
    pub fn take_image(&mut self) -> Result<UploadedImage, GatewayError> {
        self.image
            .take()
            .ok_or_else(|| GatewayError::missing_field(IMAGE_FIELD))
    }
}
