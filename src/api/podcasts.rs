//! Podcast JSON endpoints

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
};
use bytes::BytesMut;
use serde::Serialize;

use crate::AppState;
use crate::data::Podcast;
use crate::error::AppError;
use crate::service::{UploadRequest, validate_audio_content_type};
use crate::storage::AudioUpload;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: i64,
    pub message: &'static str,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ShareInfo {
    #[serde(rename = "shareUrl")]
    pub share_url: String,
    pub title: String,
    pub description: String,
}

/// GET /api/podcasts
pub async fn list_podcasts(State(state): State<AppState>) -> Result<Json<Vec<Podcast>>, AppError> {
    Ok(Json(state.podcasts.list().await?))
}

fn file_too_large(max_size: usize) -> AppError {
    AppError::Validation(format!("File too large: exceeds {} bytes", max_size))
}

/// Body-limit overflow reports the same error as the per-file ceiling
fn multipart_error(error: MultipartError, max_size: usize, context: &str) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        file_too_large(max_size)
    } else {
        AppError::Validation(format!("{}: {}", context, error))
    }
}

/// GET /api/podcasts/:id
pub async fn get_podcast(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Podcast>, AppError> {
    Ok(Json(state.podcasts.get(id).await?))
}

/// POST /api/upload
///
/// Multipart fields: `audio` (file), `title`, `description`.
pub async fn upload_podcast(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_size = state.podcasts.max_file_bytes();

    let mut audio: Option<AudioUpload> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size, "Failed to parse multipart"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "audio" => {
                if audio.is_some() {
                    return Err(AppError::Validation(
                        "Only one audio file can be uploaded at a time".to_string(),
                    ));
                }

                let original_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("Uploaded file has no file name".to_string())
                    })?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("Only audio files can be uploaded".to_string())
                    })?;
                validate_audio_content_type(&content_type)?;

                let mut data = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_size, "Failed to read file"))?
                {
                    if data.len() + chunk.len() > max_size {
                        return Err(file_too_large(max_size));
                    }
                    data.extend_from_slice(&chunk);
                }

                audio = Some(AudioUpload {
                    original_name,
                    content_type,
                    data: data.freeze(),
                });
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_size, "Failed to read title"))?,
                );
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_size, "Failed to read description"))?,
                );
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| AppError::Validation("Please select an audio file".to_string()))?;

    let outcome = state
        .podcasts
        .upload(UploadRequest {
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            audio,
        })
        .await?;

    Ok(Json(UploadResponse {
        id: outcome.podcast.id,
        message: "Podcast uploaded successfully",
        filename: outcome.podcast.filename,
    }))
}

/// DELETE /api/podcasts/:id
pub async fn delete_podcast(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.podcasts.delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Podcast deleted successfully",
    }))
}

/// GET /api/podcasts/:id/share
pub async fn share_info(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ShareInfo>, AppError> {
    let podcast = state.podcasts.get(id).await?;
    let base = share_base_url(state.config.server.public_url.as_deref(), &headers);

    Ok(Json(ShareInfo {
        share_url: format!("{}/share/{}", base, podcast.id),
        title: podcast.title,
        description: podcast.description,
    }))
}

/// Public origin: the configured URL, else the request's forwarded scheme and host
fn share_base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url.map(str::trim).filter(|url| !url.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let scheme = header_value("x-forwarded-proto").unwrap_or("http");
    let host = header_value("x-forwarded-host")
        .or_else(|| header_value(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}
