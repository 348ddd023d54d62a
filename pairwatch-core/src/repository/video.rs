use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{NewVideo, Video, VideoId};

/// In-memory catalog store, ordered by id
#[derive(Clone, Default)]
pub struct VideoRepository {
    videos: Arc<RwLock<BTreeMap<VideoId, Video>>>,
    next_id: Arc<AtomicU64>,
}

impl VideoRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, new_video: NewVideo) -> Video {
        let id = VideoId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let video = Video {
            id,
            title: new_video.title,
            description: new_video.description,
            file_key: new_video.file_key,
            thumbnail_key: new_video.thumbnail_key,
            kind: new_video.kind,
            duration: new_video.duration,
            created_at: Utc::now(),
        };
        self.videos.write().insert(id, video.clone());
        video
    }

    #[must_use]
    pub fn get(&self, id: VideoId) -> Option<Video> {
        self.videos.read().get(&id).cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<Video> {
        self.videos.read().values().cloned().collect()
    }

    pub fn remove(&self, id: VideoId) -> Option<Video> {
        self.videos.write().remove(&id)
    }
}
