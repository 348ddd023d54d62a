use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::VideoId;

/// Catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Tv,
}

impl ContentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            other => Err(format!("Unknown content type: {other}")),
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub description: Option<String>,
    pub file_key: String,
    pub thumbnail_key: Option<String>,
    #[serde(rename = "contentType")]
    pub kind: ContentKind,
    /// Length in seconds
    pub duration: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub file_key: String,
    pub thumbnail_key: Option<String>,
    pub kind: ContentKind,
    pub duration: Option<u32>,
}

impl NewVideo {
    fn sample(
        title: &str,
        description: &str,
        stem: &str,
        kind: ContentKind,
        duration: u32,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: Some(description.to_string()),
            file_key: format!("{stem}.mp4"),
            thumbnail_key: Some(format!("{stem}.jpg")),
            kind,
            duration: Some(duration),
        }
    }
}

/// Built-in catalog used when none is configured
#[must_use]
pub fn sample_catalog() -> Vec<NewVideo> {
    use ContentKind::{Movie, Tv};

    vec![
        NewVideo::sample(
            "Big Buck Bunny",
            "A short animated film about a large rabbit dealing with bullies",
            "big_buck_bunny",
            Movie,
            596,
        ),
        NewVideo::sample(
            "Sintel",
            "A short film about a girl searching for a dragon",
            "sintel",
            Movie,
            888,
        ),
        NewVideo::sample(
            "Tears of Steel",
            "Sci-fi short film about robots and human emotions",
            "tears_of_steel",
            Movie,
            734,
        ),
        NewVideo::sample(
            "Elephant's Dream",
            "Surreal short film made with open source tools",
            "elephants_dream",
            Movie,
            654,
        ),
        NewVideo::sample(
            "Nature Documentary: Episode 1",
            "The wonders of the natural world",
            "nature_ep1",
            Tv,
            1440,
        ),
        NewVideo::sample(
            "Nature Documentary: Episode 2",
            "Exploring forests and jungles",
            "nature_ep2",
            Tv,
            1440,
        ),
        NewVideo::sample(
            "Cooking Show: Season 1 Episode 1",
            "Learn to cook delicious meals",
            "cooking_s1e1",
            Tv,
            1800,
        ),
        NewVideo::sample(
            "Cooking Show: Season 1 Episode 2",
            "Mastering the art of baking",
            "cooking_s1e2",
            Tv,
            1800,
        ),
    ]
}
