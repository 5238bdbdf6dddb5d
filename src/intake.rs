//! Image intake - validates uploaded sketches and encodes them for transmission.
//!
//! # Invariants
//! - Only `image/*` content is accepted
//! - Accepted payloads are strictly smaller than [`MAX_IMAGE_BYTES`]

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Upload ceiling (5 MiB). Inputs of this size or larger are rejected.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Please upload a valid image file (JPEG, PNG, WEBP); got {0}")]
    InvalidType(String),

    #[error("File size too large ({size} bytes). Please keep it under {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Uploaded file is empty")]
    Empty,
}

/// A raw file as received from the browser (file picker or drag-and-drop).
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    /// Declared content type, if the client sent one
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Effective MIME type: the declared one, else inferred from the file name.
    ///
    /// Parameters (`; charset=...`) are dropped and the result is lowercased.
    pub fn mime_type(&self) -> String {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        match declared {
            Some(mime) => mime,
            None => self
                .file_name
                .as_deref()
                .map(|name| mime_from_extension(Path::new(name)).to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        }
    }

    /// Type gate on its own; needs only the headers, not the bytes.
    ///
    /// Returns the effective MIME type.
    pub fn check_type(&self) -> Result<String, IntakeError> {
        let mime_type = self.mime_type();
        if !is_image(&mime_type) {
            return Err(IntakeError::InvalidType(mime_type));
        }
        Ok(mime_type)
    }
}

/// A validated image ready to be sent to the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Base64 payload (standard alphabet, no data-URI header)
    pub data: String,
}

/// Validate an upload and encode it.
///
/// # Errors
/// - `InvalidType` if the content type is not `image/*`
/// - `Empty` if there are no bytes
/// - `TooLarge` if the payload is `MAX_IMAGE_BYTES` or bigger
pub fn encode_image(upload: &ImageUpload) -> Result<EncodedImage, IntakeError> {
    let mime_type = upload.check_type()?;
    check_size(upload.bytes.len())?;

    Ok(EncodedImage {
        mime_type,
        data: BASE64.encode(&upload.bytes),
    })
}

fn check_size(size: usize) -> Result<(), IntakeError> {
    if size == 0 {
        return Err(IntakeError::Empty);
    }
    check_within_limit(size)
}

/// Ceiling check on a running byte count, so a streamed body can be
/// abandoned as soon as it reaches [`MAX_IMAGE_BYTES`].
pub fn check_within_limit(size: usize) -> Result<(), IntakeError> {
    if size >= MAX_IMAGE_BYTES {
        return Err(IntakeError::TooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
