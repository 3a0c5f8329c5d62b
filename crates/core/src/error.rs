//! Error types for building and exporting slide decks.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing or exporting a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write bytes.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tabular data attached to a chart slide could not be used.
    #[error("Chart data for slide '{slide}' is malformed: {message}")]
    ChartData { slide: String, message: String },

    /// An uploaded image is not a PNG or JPEG, or disagrees with its declared type.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// A font color is not a `#RRGGBB` hex string.
    #[error("Invalid color '{0}': expected a hex value like #1E40AF")]
    InvalidColor(String),

    /// An uploaded theme document could not be used as a template.
    #[error("Theme document '{name}' is unusable: {message}")]
    ThemeDocument { name: String, message: String },

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML reading or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// Failed to encode a rasterized chart.
    #[error("Image encoding error: {0}")]
    ImageEncode(String),

    /// No saved project exists under the requested name.
    #[error("No saved project named '{0}'")]
    ProjectNotFound(String),
}

impl Error {
    /// Build a chart data error for the slide with the given title.
    pub fn chart_data(slide: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ChartData {
            slide: slide.into(),
            message: message.into(),
        }
    }

    /// Build a theme document error for the document with the given name.
    pub fn theme_document(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ThemeDocument {
            name: name.into(),
            message: message.into(),
        }
    }
}
