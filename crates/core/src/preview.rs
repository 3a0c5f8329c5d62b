//! Serializable slide previews for re-rendering the list after a mutation.

use crate::chart::ChartTable;
use crate::types::{SlideContent, SlideKind, SlideRecord};
use serde::{Deserialize, Serialize};

/// Preview body, following the same rules as export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewBody {
    /// One unsplit paragraph.
    Paragraph { text: String },
    /// Bullet items in line order.
    Bullets { items: Vec<String> },
    /// Summary of attached chart data.
    Chart {
        source: String,
        series: Vec<String>,
        rows: usize,
    },
    /// Attached chart data that would fail export.
    ChartError { source: String, message: String },
}

/// One slide as shown in the editor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePreview {
    /// 0-based position, usable as the index for move/remove.
    pub index: usize,
    /// Stable id of the record.
    pub id: u64,
    pub kind: SlideKind,
    pub title: String,
    pub body: PreviewBody,
}

impl SlidePreview {
    /// Build the preview of the record at `index`.
    pub fn from_record(index: usize, record: &SlideRecord) -> Self {
        let body = match &record.content {
            SlideContent::Text { body } => PreviewBody::Paragraph { text: body.clone() },
            SlideContent::Bullet { .. } => PreviewBody::Bullets {
                items: record.bullet_items().into_iter().map(str::to_string).collect(),
            },
            SlideContent::Chart { data: None, body } => {
                PreviewBody::Paragraph { text: body.clone() }
            }
            SlideContent::Chart {
                data: Some(source),
                ..
            } => match ChartTable::parse_csv(&record.title, &source.data) {
                Ok(table) => PreviewBody::Chart {
                    source: source.name.clone(),
                    series: table.numeric_series().into_iter().map(|s| s.name).collect(),
                    rows: table.rows().len(),
                },
                Err(e) => PreviewBody::ChartError {
                    source: source.name.clone(),
                    message: e.to_string(),
                },
            },
        };

        Self {
            index,
            id: record.id.0,
            kind: record.kind(),
            title: record.title.clone(),
            body,
        }
    }
}

/// Previews for every slide, in list order.
pub fn preview_slides(slides: &[SlideRecord]) -> Vec<SlidePreview> {
    slides
        .iter()
        .enumerate()
        .map(|(index, record)| SlidePreview::from_record(index, record))
        .collect()
}
