use bytes::Bytes;
use chrono::Utc;
use std::time::Duration;

use super::MediaStorage;
use crate::{
    config::{StorageConfig, VideoSeed},
    models::{sample_catalog, ContentKind, NewVideo, Video, VideoId},
    repository::VideoRepository,
    validation::{self, content_type_for},
    Error, Result,
};

/// Metadata sent alongside an uploaded file
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub duration: Option<u32>,
}

/// Video catalog and the signed URLs that serve it
#[derive(Clone)]
pub struct CatalogService {
    videos: VideoRepository,
    storage: MediaStorage,
    video_ttl: Duration,
    thumbnail_ttl: Duration,
    max_upload_bytes: usize,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("video_ttl", &self.video_ttl)
            .field("thumbnail_ttl", &self.thumbnail_ttl)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    #[must_use]
    pub fn new(videos: VideoRepository, storage: MediaStorage, config: &StorageConfig) -> Self {
        Self {
            videos,
            storage,
            video_ttl: Duration::from_secs(config.video_url_ttl_seconds),
            thumbnail_ttl: Duration::from_secs(config.thumbnail_url_ttl_seconds),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Fill the catalog from configured seeds, or the built-in samples when there are none
    pub fn seed(&self, seeds: &[VideoSeed]) -> usize {
        let entries: Vec<NewVideo> = if seeds.is_empty() {
            sample_catalog()
        } else {
            seeds
                .iter()
                .map(|seed| NewVideo {
                    title: seed.title.clone(),
                    description: seed.description.clone(),
                    file_key: seed.file_key.clone(),
                    thumbnail_key: seed.thumbnail_key.clone(),
                    kind: seed.kind,
                    duration: seed.duration,
                })
                .collect()
        };

        let count = entries.len();
        for entry in entries {
            self.videos.insert(entry);
        }
        tracing::info!("Catalog seeded with {} videos", count);
        count
    }

    #[must_use]
    pub fn list(&self) -> Vec<Video> {
        self.videos.list()
    }

    pub fn get(&self, id: VideoId) -> Result<Video> {
        self.videos
            .get(id)
            .ok_or_else(|| Error::NotFound("Content not found".to_string()))
    }

    pub fn add(&self, video: NewVideo) -> Result<Video> {
        validation::validate_title(&video.title)?;
        Ok(self.videos.insert(video))
    }

    pub async fn stream_url(&self, id: VideoId) -> Result<String> {
        let video = self.get(id)?;
        self.storage.signed_url(&video.file_key, self.video_ttl).await
    }

    pub async fn thumbnail_url(&self, id: VideoId) -> Result<String> {
        let key = self
            .videos
            .get(id)
            .and_then(|v| v.thumbnail_key)
            .ok_or_else(|| Error::NotFound("Thumbnail not found".to_string()))?;
        self.storage.signed_url(&key, self.thumbnail_ttl).await
    }

    /// Signed URL for a room's video key
    pub async fn video_key_url(&self, key: &str) -> Result<String> {
        self.storage.signed_url(key, self.video_ttl).await
    }

    /// Store an uploaded file and add it to the catalog
    pub async fn upload(&self, filename: &str, data: Bytes, meta: UploadMeta) -> Result<Video> {
        validation::validate_upload(filename, data.len(), self.max_upload_bytes)?;

        let title = meta
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file_stem(filename).to_string());
        validation::validate_title(&title)?;

        let key = format!("media/{}-{}", Utc::now().timestamp_millis(), filename);
        self.storage
            .put(&key, data, content_type_for(filename))
            .await?;

        let video = self.videos.insert(NewVideo {
            title,
            description: meta.description.filter(|d| !d.trim().is_empty()),
            file_key: key,
            thumbnail_key: None,
            kind: meta.kind,
            duration: meta.duration,
        });

        tracing::info!(video_id = %video.id, file_key = %video.file_key, "Uploaded video");
        Ok(video)
    }

    /// Remove a catalog entry and its stored objects
    pub async fn delete(&self, id: VideoId) -> Result<Video> {
        let video = self
            .videos
            .remove(id)
            .ok_or_else(|| Error::NotFound("Content not found".to_string()))?;

        for key in std::iter::once(&video.file_key).chain(video.thumbnail_key.as_ref()) {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!("Failed to delete object {} for video {}: {}", key, video.id, e);
            }
        }

        tracing::info!(video_id = %video.id, "Deleted video");
        Ok(video)
    }
}

fn file_stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem)
}
