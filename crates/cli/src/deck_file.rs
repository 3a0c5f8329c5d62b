//! JSON deck descriptions read by `deck-build`.
//!
//! ```json
//! {
//!   "title": "Quarterly Review",
//!   "subtitle": "Finance team",
//!   "template": "business",
//!   "slides": [
//!     { "kind": "bullet", "title": "Agenda", "body": "Results\nOutlook" },
//!     { "kind": "chart", "title": "Revenue", "data": "revenue.csv" }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the description.

use anyhow::{Context, Result};
use deck_core::{ChartSource, DeckInfo, NewSlide};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A deck description.
#[derive(Debug, Deserialize)]
pub struct DeckFile {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Built-in template name.
    #[serde(default)]
    pub template: Option<String>,
    /// `#RRGGBB` font color.
    #[serde(default)]
    pub font_color: Option<String>,
    /// Background image path.
    #[serde(default)]
    pub background: Option<PathBuf>,
    /// Theme document path.
    #[serde(default)]
    pub theme: Option<PathBuf>,
    #[serde(default)]
    pub slides: Vec<SlideEntry>,
}

/// One slide of a deck description.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SlideEntry {
    Text {
        title: String,
        #[serde(default)]
        body: String,
    },
    Bullet {
        title: String,
        #[serde(default)]
        body: String,
    },
    Chart {
        title: String,
        /// CSV file with a header row.
        #[serde(default)]
        data: Option<PathBuf>,
        #[serde(default)]
        body: String,
    },
}

impl DeckFile {
    /// Parse a description from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid deck description")
    }

    /// Read a description file, returning it with its base directory.
    pub fn load(path: &Path) -> Result<(Self, PathBuf)> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let deck = Self::parse(&json).with_context(|| format!("In {}", path.display()))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok((deck, base_dir))
    }

    /// Deck title and subtitle.
    pub fn info(&self) -> DeckInfo {
        DeckInfo::new(self.title.as_str(), self.subtitle.as_str())
    }

    /// Slides as creation-form submissions, reading chart data from disk.
    pub fn new_slides(&self, base_dir: &Path) -> Result<Vec<NewSlide>> {
        self.slides
            .iter()
            .map(|entry| match entry {
                SlideEntry::Text { title, body } => {
                    Ok(NewSlide::text(title.as_str(), body.as_str()))
                }
                SlideEntry::Bullet { title, body } => {
                    Ok(NewSlide::bullet(title.as_str(), body.as_str()))
                }
                SlideEntry::Chart { title, data, body } => {
                    let source = match data {
                        Some(path) => {
                            let path = resolve(base_dir, path);
                            let bytes = std::fs::read(&path).with_context(|| {
                                format!("Failed to read chart data {}", path.display())
                            })?;
                            let name = path
                                .file_name()
                                .and_then(|n| n.to_str())
                                .unwrap_or("data.csv");
                            Some(ChartSource::new(name, bytes))
                        }
                        None => None,
                    };
                    Ok(NewSlide::chart(title.as_str(), source, body.as_str()))
                }
            })
            .collect()
    }
}

/// Resolve `path` against `base_dir` unless it is absolute.
pub fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::SlideKind;

    #[test]
    fn test_parse_description() {
        let deck = DeckFile::parse(
            r#"{
                "title": "Review",
                "template": "creative",
                "slides": [
                    { "kind": "text", "title": "Intro", "body": "hello\nworld" },
                    { "kind": "bullet", "title": "Agenda", "body": "a\nb" },
                    { "kind": "chart", "title": "Later", "body": "coming soon" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(deck.info(), DeckInfo::new("Review", ""));
        assert_eq!(deck.template.as_deref(), Some("creative"));

        let slides = deck.new_slides(Path::new(".")).unwrap();
        let kinds: Vec<SlideKind> = slides.iter().map(|s| s.content.kind()).collect();
        assert_eq!(kinds, vec![SlideKind::Text, SlideKind::Bullet, SlideKind::Chart]);
        assert_eq!(slides[0].content.body(), "hello\nworld");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = DeckFile::parse(r#"{ "slides": [ { "kind": "video", "title": "x" } ] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_chart_file_is_an_error() {
        let deck = DeckFile::parse(
            r#"{ "slides": [ { "kind": "chart", "title": "C", "data": "does-not-exist.csv" } ] }"#,
        )
        .unwrap();
        let err = deck.new_slides(Path::new("/nonexistent-dir")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.csv"));
    }

    #[test]
    fn test_resolve() {
        let base = Path::new("decks");
        assert_eq!(resolve(base, Path::new("a.csv")), PathBuf::from("decks/a.csv"));
        assert_eq!(resolve(base, Path::new("/tmp/a.csv")), PathBuf::from("/tmp/a.csv"));
    }
}
