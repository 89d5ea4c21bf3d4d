//! Product image upload
//!
//! POST /api/images: multipart `file` field → validate → JPEG re-encode →
//! SHA-256 key → S3. Returns `{hash, url}` for use in product images.
//! DELETE /api/images/{hash}: admins, or sellers whose image no other
//! seller's product shows.

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use shared::error::{ApiResponse, AppError, ErrorCode};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::product as product_service;
use crate::state::AppState;
use crate::storage::StoredImage;

/// POST /api/images
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> ApiResult<StoredImage> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
        })?;
        file = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = file.ok_or_else(|| {
        AppError::with_message(ErrorCode::RequiredField, "Missing multipart field: file")
    })?;

    let stored = state.images.upload(&data, &filename).await?;
    tracing::info!(
        seller_id = principal.seller_id,
        hash = %stored.hash,
        "Image uploaded"
    );
    Ok(Json(stored))
}

/// DELETE /api/images/{hash}
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(hash): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    product_service::delete_image(&state, &principal, &hash).await?;
    Ok(Json(ApiResponse::ok()))
}
