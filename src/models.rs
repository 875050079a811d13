//! Data models for fetched news items and their translated representations.
//!
//! - [`NewsItem`]: raw record as returned by the news scraper actor
//! - [`TranslationResult`]: one translated (and maybe posted) item
//! - [`OutputDocument`]: the JSON document written at the end of a run

use serde::{Deserialize, Deserializer, Serialize};

/// A raw news item as returned by the scraping API.
///
/// The upstream shape is not under our control, so every field is optional
/// and scalar values are accepted wherever a string is expected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    /// Source URL of the story.
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    /// Optional illustration URL, required by the photo publish strategy.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
    /// Publication time as reported upstream.
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
}

impl NewsItem {
    /// Composite text sent for translation: title, summary, content and the
    /// source URL separated by blank lines.
    pub fn full_text(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\nSumber asal: {}",
            self.title.as_deref().unwrap_or_default(),
            self.summary.as_deref().unwrap_or_default(),
            self.content.as_deref().unwrap_or_default(),
            self.link.as_deref().unwrap_or_default(),
        )
    }

    pub fn original_url(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }

    /// Image URL, if one is present and non-blank.
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Accept strings, numbers and booleans; map `null` to `None`. Empty strings
/// are kept so they round-trip into the output document unchanged.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Publication outcome of a translated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    #[serde(rename = "Posted")]
    Posted,
    #[serde(rename = "Ready for post")]
    ReadyForPost,
}

impl PostStatus {
    pub fn from_posted(posted: bool) -> Self {
        if posted {
            PostStatus::Posted
        } else {
            PostStatus::ReadyForPost
        }
    }
}

/// A successfully translated news item.
///
/// Built once per item by the pipeline and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub title: Option<String>,
    pub original_url: String,
    /// Upstream image URL as received, `""` when the item had none.
    pub image_url: String,
    /// The Malay summary, ready to be used as a post caption.
    #[serde(rename = "translated_facebook_post")]
    pub translated_text: String,
    pub timestamp: String,
    pub status: PostStatus,
}

/// The document persisted at the end of every run.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputDocument {
    /// Local time of writing, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub all_news: Vec<TranslationResult>,
}
