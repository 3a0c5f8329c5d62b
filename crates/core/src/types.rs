//! Domain types for user-authored slides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a slide record.
///
/// Assigned by the [`SlideListStore`](crate::SlideListStore) when the record is
/// appended and never reused within that store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId(pub u64);

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide-{}", self.0)
    }
}

/// The kind of a slide, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    /// A single paragraph of text.
    Text,
    /// One bullet item per line of the body.
    Bullet,
    /// A plot of tabular data.
    Chart,
}

impl SlideKind {
    /// Parse a kind from a form value such as `"bullet"` or `"Chart"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "bullet" | "bullets" => Some(Self::Bullet),
            "chart" => Some(Self::Chart),
            _ => None,
        }
    }
}

/// Raw tabular data attached to a chart slide.
///
/// The bytes are kept as uploaded and only parsed at preview or export time,
/// so a malformed upload surfaces as an export error rather than at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSource {
    /// Display name of the upload (usually the file name).
    pub name: String,
    /// CSV bytes.
    pub data: Vec<u8>,
}

impl ChartSource {
    /// Create a chart source from a name and CSV bytes.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// The kind-specific content of a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideContent {
    /// Body rendered as one unsplit paragraph.
    Text { body: String },
    /// Body split into bullet items, one per line.
    Bullet { body: String },
    /// A chart of `data`; without data the body is rendered as plain text.
    Chart {
        data: Option<ChartSource>,
        body: String,
    },
}

impl SlideContent {
    /// The kind of this content.
    pub fn kind(&self) -> SlideKind {
        match self {
            SlideContent::Text { .. } => SlideKind::Text,
            SlideContent::Bullet { .. } => SlideKind::Bullet,
            SlideContent::Chart { .. } => SlideKind::Chart,
        }
    }

    /// The free-form body text.
    pub fn body(&self) -> &str {
        match self {
            SlideContent::Text { body }
            | SlideContent::Bullet { body }
            | SlideContent::Chart { body, .. } => body,
        }
    }
}

/// A slide as submitted by the creation form, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlide {
    pub title: String,
    pub content: SlideContent,
}

impl NewSlide {
    /// A text slide.
    pub fn text(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: SlideContent::Text { body: body.into() },
        }
    }

    /// A bullet slide.
    pub fn bullet(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: SlideContent::Bullet { body: body.into() },
        }
    }

    /// A chart slide, optionally backed by CSV data.
    pub fn chart(
        title: impl Into<String>,
        data: Option<ChartSource>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: SlideContent::Chart {
                data,
                body: body.into(),
            },
        }
    }
}

/// One user-authored slide held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    pub id: SlideId,
    pub title: String,
    pub content: SlideContent,
}

impl SlideRecord {
    /// The kind of this slide.
    pub fn kind(&self) -> SlideKind {
        self.content.kind()
    }

    /// Bullet items of a bullet slide, in line order.
    ///
    /// Blank lines are discarded, so an empty body yields no items.
    /// Returns an empty list for other kinds.
    pub fn bullet_items(&self) -> Vec<&str> {
        match &self.content {
            SlideContent::Bullet { body } => split_bullets(body),
            _ => Vec::new(),
        }
    }
}

/// Split a bullet body into items, one per non-blank line.
pub fn split_bullets(body: &str) -> Vec<&str> {
    body.lines().filter(|line| !line.trim().is_empty()).collect()
}

/// Deck-level text shown on the cover slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckInfo {
    /// Presentation title; an empty title means no cover slide.
    pub title: String,
    /// Subtitle or author line.
    #[serde(default)]
    pub subtitle: String,
}

impl DeckInfo {
    /// Create deck info with a title and subtitle.
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    /// Whether export should emit a cover slide.
    pub fn has_cover(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_kind_from_name() {
        assert_eq!(SlideKind::from_name("text"), Some(SlideKind::Text));
        assert_eq!(SlideKind::from_name(" Bullet "), Some(SlideKind::Bullet));
        assert_eq!(SlideKind::from_name("CHART"), Some(SlideKind::Chart));
        assert_eq!(SlideKind::from_name("table"), None);
    }

    #[test]
    fn test_split_bullets_keeps_line_order() {
        assert_eq!(split_bullets("a\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_bullets("first\r\nsecond"), vec!["first", "second"]);
    }

    #[test]
    fn test_split_bullets_discards_blank_lines() {
        assert!(split_bullets("").is_empty());
        assert_eq!(split_bullets("a\n\n  \nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_bullet_items_only_for_bullet_kind() {
        let record = SlideRecord {
            id: SlideId(1),
            title: "Intro".to_string(),
            content: SlideContent::Text {
                body: "a\nb".to_string(),
            },
        };
        assert!(record.bullet_items().is_empty());
        assert_eq!(record.kind(), SlideKind::Text);
    }

    #[test]
    fn test_deck_info_cover() {
        assert!(!DeckInfo::default().has_cover());
        assert!(!DeckInfo::new("   ", "Me").has_cover());
        assert!(DeckInfo::new("AI Project", "").has_cover());
    }
}
