pub mod health;
pub mod orders;
pub mod products;
pub mod reports;

use axum::extract::Multipart;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying an uploaded CSV.
pub const UPLOAD_FIELD: &str = "file";

/// Reads the bytes of the `file` field, ignoring any other fields.
pub(crate) async fn read_upload(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::bad_request(format!(
        "multipart field `{UPLOAD_FIELD}` is required"
    )))
}
