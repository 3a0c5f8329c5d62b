//! PPTX (Office Open XML) backend for the slide-deck builder.
//!
//! Writes decks as .pptx packages, which are ZIP archives of XML parts, reads
//! uploaded theme documents, and reads exported decks back for inspection.

pub mod cache;
pub mod chart;
pub mod export;
pub mod opc;
pub mod package;
pub mod reader;
pub mod slide;
pub mod template;
pub mod theme;

pub use cache::TemplateCache;
pub use chart::ChartRenderer;
pub use export::{export, DeckExporter, ExportedDeck, EXPORT_FILE_NAME, PPTX_MIME_TYPE};
pub use package::PackageWriter;
pub use reader::{DeckReader, ReadDeck, ReadParagraph, ReadShape, ReadSlide};
pub use slide::SlideBuilder;
pub use theme::read_theme_document;
