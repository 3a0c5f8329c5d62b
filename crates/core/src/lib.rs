//! Core domain types, the ordered slide list, session state and theme
//! suggestion for the slide-deck builder.

pub mod chart;
pub mod error;
pub mod preview;
pub mod session;
pub mod store;
pub mod suggest;
pub mod theme;
pub mod types;

pub use chart::{ChartTable, Series};
pub use error::{Error, Result};
pub use preview::{preview_slides, PreviewBody, SlidePreview};
pub use session::{DeckSession, ProjectSnapshot};
pub use store::SlideListStore;
pub use suggest::suggest;
pub use theme::{
    BackgroundImage, FontColor, ImageFormat, LayoutInfo, PlaceholderInfo, TemplateChoice,
    TemplateSource, ThemeDocument, ThemeSettings, DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH,
};
pub use types::{
    split_bullets, ChartSource, DeckInfo, NewSlide, SlideContent, SlideId, SlideKind, SlideRecord,
};
