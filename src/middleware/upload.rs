use axum::extract::{FromRequest, Multipart, Request};
use axum::extract::multipart::MultipartError;
use tracing::debug;

use crate::error::ScannerError;
use crate::service::extraction::ImageUpload;

/// Multipart field carrying the receipt image.
pub const FILE_FIELD: &str = "file";

/// Media type assumed for camera captures that declare none.
const FALLBACK_MIME: &str = "image/jpeg";

/// Pulls the receipt image out of a `multipart/form-data` body.
pub struct ReceiptUpload(pub ImageUpload);

impl<S> FromRequest<S> for ReceiptUpload
where
    S: Send + Sync,
{
    type Rejection = ScannerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart =
            Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ScannerError::InvalidUpload {
                    status: rejection.status(),
                    message: rejection.body_text(),
                })?;

        while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            let file_name = field.file_name().map(str::to_owned);
            let declared = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await.map_err(upload_error)?;
            if bytes.is_empty() {
                return Err(ScannerError::MissingFile);
            }

            let mime_type = resolve_mime(declared.as_deref(), file_name.as_deref());
            debug!(file_name = ?file_name, mime_type = %mime_type, size = bytes.len(), "receipt upload received");
            return Ok(Self(ImageUpload {
                bytes: bytes.to_vec(),
                mime_type,
                file_name,
            }));
        }

        Err(ScannerError::MissingFile)
    }
}

fn upload_error(err: MultipartError) -> ScannerError {
    ScannerError::InvalidUpload {
        status: err.status(),
        message: err.body_text(),
    }
}

/// Declared media type, else one inferred from the file extension, else JPEG.
pub fn resolve_mime(declared: Option<&str>, file_name: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim)
        && !declared.is_empty()
        && declared != "application/octet-stream"
    {
        return declared.to_string();
    }

    let ext = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => FALLBACK_MIME,
    }
    .to_string()
}
