// Catalog endpoints: listing, upload, delete and signed URLs

use axum::{
    extract::{multipart::Field, rejection::PathRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use pairwatch_core::{
    models::{ContentKind, Video, VideoId},
    service::UploadMeta,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{AppError, AppResult, AppState, SiteViewer};

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub success: bool,
    pub content: Vec<Video>,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub success: bool,
    pub content: Video,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub success: bool,
    pub url: String,
}

/// GET /api/content
pub async fn list_content(
    _viewer: SiteViewer,
    State(state): State<AppState>,
) -> Json<ContentListResponse> {
    Json(ContentListResponse {
        success: true,
        content: state.catalog.list(),
    })
}

/// File part plus form fields of an upload
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    title: Option<String>,
    description: Option<String>,
    kind: Option<String>,
    duration: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "video" => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .ok_or_else(|| AppError::bad_request("File part has no filename"))?;
                    form.file = Some((filename, field.bytes().await?));
                }
                "title" => form.title = Some(text(field).await?),
                "description" => form.description = Some(text(field).await?),
                "contentType" | "content_type" => form.kind = Some(text(field).await?),
                "duration" => form.duration = Some(text(field).await?),
                _ => {}
            }
        }

        Ok(form)
    }

    fn meta(&self) -> AppResult<UploadMeta> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => ContentKind::Movie,
            Some(kind) => kind.parse().map_err(AppError::bad_request)?,
        };
        let duration = match self.duration.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(duration) => Some(
                duration
                    .parse::<u32>()
                    .map_err(|_| AppError::bad_request("Invalid duration"))?,
            ),
        };

        Ok(UploadMeta {
            title: self.title.clone(),
            description: self.description.clone(),
            kind,
            duration,
        })
    }
}

async fn text(field: Field<'_>) -> AppResult<String> {
    Ok(field.text().await?)
}

/// POST /api/content (multipart)
pub async fn upload_content(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ContentResponse>)> {
    let form = UploadForm::read(multipart).await?;
    let meta = form.meta()?;
    let (filename, data) = form
        .file
        .ok_or_else(|| AppError::bad_request("No file uploaded"))?;

    let video = state.catalog.upload(&filename, data, meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContentResponse {
            success: true,
            content: video,
        }),
    ))
}

/// DELETE /api/content/{id}
pub async fn delete_content(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = id?;
    state.catalog.delete(VideoId(id)).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/content/{id}/stream
pub async fn stream_url(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<UrlResponse>> {
    let Path(id) = id?;
    let url = state.catalog.stream_url(VideoId(id)).await?;
    Ok(Json(UrlResponse { success: true, url }))
}

/// GET /api/content/{id}/thumbnail
pub async fn thumbnail_url(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<UrlResponse>> {
    let Path(id) = id?;
    let url = state.catalog.thumbnail_url(VideoId(id)).await?;
    Ok(Json(UrlResponse { success: true, url }))
}
