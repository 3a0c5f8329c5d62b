//! Deck-wide theme settings: background image, font color and template.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

/// Matches `#RRGGBB` or `RRGGBB`.
static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").unwrap());

/// Default slide width in EMUs (10 inches, 914400 EMU = 1 inch).
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;

/// Default slide height in EMUs (7.5 inches).
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// Image formats accepted for background uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect the format from magic bytes.
    pub fn detect_from_bytes(bytes: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        None
    }

    /// Map a declared MIME type to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Get the file extension used for package media parts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

/// An uploaded background image, stamped full-bleed on every slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    format: ImageFormat,
    data: Vec<u8>,
}

impl BackgroundImage {
    /// Validate an upload.
    ///
    /// The bytes must be PNG or JPEG. When a MIME type is declared it must
    /// agree with the detected format.
    pub fn new(data: Vec<u8>, declared_mime: Option<&str>) -> Result<Self> {
        let format = ImageFormat::detect_from_bytes(&data).ok_or_else(|| {
            Error::UnsupportedImage("background must be a PNG or JPEG image".to_string())
        })?;

        if let Some(mime) = declared_mime {
            match ImageFormat::from_mime(mime) {
                Some(declared) if declared == format => {}
                Some(declared) => {
                    return Err(Error::UnsupportedImage(format!(
                        "declared as {} but contents are {}",
                        declared.mime_type(),
                        format.mime_type()
                    )));
                }
                None => {
                    return Err(Error::UnsupportedImage(format!(
                        "declared type '{}' is not PNG or JPEG",
                        mime
                    )));
                }
            }
        }

        Ok(Self { format, data })
    }

    /// The detected image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// An RGB font color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FontColor {
    /// Create a color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) hex string, case-insensitive.
    pub fn parse(value: &str) -> Result<Self> {
        let caps = HEX_COLOR_REGEX
            .captures(value.trim())
            .ok_or_else(|| Error::InvalidColor(value.to_string()))?;
        let hex = &caps[1];

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(value.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Upper-case hex without the leading `#`, as DrawingML expects.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Built-in templates; also the set of possible theme suggestions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChoice {
    /// Dark navy background, light text.
    Business,
    /// White background, dark text.
    #[default]
    Minimal,
    /// Warm background, deep purple text.
    Creative,
}

impl TemplateChoice {
    /// Parse a template from a form value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "business" => Some(Self::Business),
            "minimal" => Some(Self::Minimal),
            "creative" => Some(Self::Creative),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::Minimal => "Minimal",
            Self::Creative => "Creative",
        }
    }

    /// Slide background fill.
    pub fn background(&self) -> FontColor {
        match self {
            Self::Business => FontColor::rgb(0x1E, 0x29, 0x3B),
            Self::Minimal => FontColor::rgb(0xFF, 0xFF, 0xFF),
            Self::Creative => FontColor::rgb(0xFF, 0xF7, 0xED),
        }
    }

    /// Text color used when the user has not picked one.
    pub fn text_color(&self) -> FontColor {
        match self {
            Self::Business => FontColor::rgb(0xF8, 0xFA, 0xFC),
            Self::Minimal => FontColor::rgb(0x1F, 0x29, 0x37),
            Self::Creative => FontColor::rgb(0x4C, 0x1D, 0x95),
        }
    }

    /// Accent color; the first chart series uses it.
    pub fn accent(&self) -> FontColor {
        match self {
            Self::Business => FontColor::rgb(0x25, 0x63, 0xEB),
            Self::Minimal => FontColor::rgb(0x11, 0x18, 0x27),
            Self::Creative => FontColor::rgb(0xDB, 0x27, 0x77),
        }
    }

    /// Title font size in points.
    pub fn title_size(&self) -> u32 {
        match self {
            Self::Business => 32,
            Self::Minimal => 28,
            Self::Creative => 36,
        }
    }

    /// Latin typeface for all text.
    pub fn typeface(&self) -> &'static str {
        match self {
            Self::Business => "Calibri",
            Self::Minimal => "Arial",
            Self::Creative => "Georgia",
        }
    }
}

/// A placeholder declared by a layout in a theme document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderInfo {
    /// `type` attribute (`title`, `body`, `ctrTitle`, ...); absent means body.
    pub ph_type: Option<String>,
    /// `idx` attribute.
    pub idx: Option<u32>,
}

impl PlaceholderInfo {
    /// Whether this is a title placeholder.
    pub fn is_title(&self) -> bool {
        matches!(self.ph_type.as_deref(), Some("title") | Some("ctrTitle"))
    }
}

/// A slide layout available in a theme document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutInfo {
    /// Part name inside the package, e.g. `ppt/slideLayouts/slideLayout2.xml`.
    pub part_name: String,
    /// Layout display name from `<p:cSld name>`.
    pub name: String,
    /// Placeholders in document order.
    pub placeholders: Vec<PlaceholderInfo>,
}

impl LayoutInfo {
    /// The first title placeholder.
    pub fn title_placeholder(&self) -> Option<&PlaceholderInfo> {
        self.placeholders.iter().find(|ph| ph.is_title())
    }

    /// The non-title placeholder with `idx="1"`, which receives body content.
    pub fn body_placeholder(&self) -> Option<&PlaceholderInfo> {
        self.placeholders
            .iter()
            .find(|ph| !ph.is_title() && ph.idx == Some(1))
    }
}

/// An uploaded presentation whose masters, layouts and page size serve as the
/// deck template.
///
/// Parsing lives in the PPTX backend; this type only carries the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDocument {
    /// Name the document was uploaded or cached under.
    pub name: String,
    /// The original package bytes.
    pub data: Vec<u8>,
    /// Page width in EMUs.
    pub slide_width: i64,
    /// Page height in EMUs.
    pub slide_height: i64,
    /// Layouts of the first slide master, in master order.
    pub layouts: Vec<LayoutInfo>,
}

impl ThemeDocument {
    /// Layout used for content slides: index 1, or the last layout when the
    /// document has fewer.
    pub fn content_layout(&self) -> Option<&LayoutInfo> {
        self.layouts.get(1).or_else(|| self.layouts.last())
    }

    /// Layout used for the cover slide: index 0.
    pub fn cover_layout(&self) -> Option<&LayoutInfo> {
        self.layouts.first()
    }
}

/// Where the deck's masters, layouts and page size come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A built-in look with the default page size and a blank layout.
    BuiltIn(TemplateChoice),
    /// An uploaded theme document.
    Document(Arc<ThemeDocument>),
}

impl Default for TemplateSource {
    fn default() -> Self {
        TemplateSource::BuiltIn(TemplateChoice::default())
    }
}

impl TemplateSource {
    /// Page size in EMUs (width, height).
    pub fn slide_size(&self) -> (i64, i64) {
        match self {
            TemplateSource::BuiltIn(_) => (DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT),
            TemplateSource::Document(doc) => (doc.slide_width, doc.slide_height),
        }
    }

    /// Display name for logging.
    pub fn describe(&self) -> String {
        match self {
            TemplateSource::BuiltIn(choice) => format!("built-in {}", choice.name()),
            TemplateSource::Document(doc) => format!("theme document '{}'", doc.name),
        }
    }
}

/// Theme settings applied uniformly to every slide at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeSettings {
    background: Option<BackgroundImage>,
    font_color: Option<FontColor>,
    template: TemplateSource,
}

impl ThemeSettings {
    /// Create default settings: no background, template text color, built-in Minimal.
    pub fn new() -> Self {
        Self::default()
    }

    /// The background image, if any.
    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    /// Set the background image.
    pub fn set_background_image(&mut self, image: BackgroundImage) {
        self.background = Some(image);
    }

    /// Remove the background image.
    pub fn clear_background_image(&mut self) {
        self.background = None;
    }

    /// The user-picked font color, if any.
    pub fn font_color(&self) -> Option<FontColor> {
        self.font_color
    }

    /// Set the font color.
    pub fn set_font_color(&mut self, color: FontColor) {
        self.font_color = Some(color);
    }

    /// Parse and set the font color from a hex string.
    pub fn set_font_color_hex(&mut self, value: &str) -> Result<()> {
        self.font_color = Some(FontColor::parse(value)?);
        Ok(())
    }

    /// The template source.
    pub fn template(&self) -> &TemplateSource {
        &self.template
    }

    /// Set the template source.
    pub fn set_template(&mut self, template: TemplateSource) {
        self.template = template;
    }

    /// Text color actually applied: the user's pick, else the template default.
    ///
    /// Theme documents keep their own text colors unless the user picked one.
    pub fn effective_font_color(&self) -> Option<FontColor> {
        match (&self.font_color, &self.template) {
            (Some(color), _) => Some(*color),
            (None, TemplateSource::BuiltIn(choice)) => Some(choice.text_color()),
            (None, TemplateSource::Document(_)) => None,
        }
    }
}
