//! WASM bindings for the slide-deck builder.
//!
//! Exposes a `DeckSession` class to JavaScript. Each page or worker creates
//! its own session; theme documents are parsed once and shared through a
//! process-wide cache.

use deck_core::{
    BackgroundImage, ChartSource, DeckInfo, NewSlide, SlideKind, TemplateChoice, TemplateSource,
};
use deck_pptx::{ExportedDeck, TemplateCache};
use std::sync::LazyLock;
use wasm_bindgen::prelude::*;

/// Theme documents uploaded by any session, keyed by name.
static TEMPLATE_CACHE: LazyLock<TemplateCache> = LazyLock::new(TemplateCache::new);

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// One user's deck: slides, deck info, theme settings and saved projects.
#[wasm_bindgen]
#[derive(Default)]
pub struct DeckSession {
    inner: deck_core::DeckSession,
}

#[wasm_bindgen]
impl DeckSession {
    /// Create an empty session.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deck title and subtitle shown on the cover slide.
    pub fn set_info(&mut self, title: &str, subtitle: &str) {
        self.inner.set_info(DeckInfo::new(title, subtitle));
    }

    /// Append a slide. Returns `false` when the title is empty and the slide
    /// was dropped.
    ///
    /// `kind` is `text`, `bullet` or `chart`; `chart_data` is CSV bytes and
    /// only used for chart slides.
    pub fn add_slide(
        &mut self,
        kind: &str,
        title: &str,
        body: &str,
        chart_data: Option<Vec<u8>>,
        chart_name: Option<String>,
    ) -> Result<bool, JsValue> {
        add_slide_impl(&mut self.inner, kind, title, body, chart_data, chart_name)
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn move_up(&mut self, index: usize) {
        self.inner.move_up(index);
    }

    pub fn move_down(&mut self, index: usize) {
        self.inner.move_down(index);
    }

    pub fn remove_at(&mut self, index: usize) {
        self.inner.remove_at(index);
    }

    /// Number of slides in the list.
    pub fn len(&self) -> usize {
        self.inner.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store().is_empty()
    }

    /// Set the font color from a `#RRGGBB` string.
    pub fn set_font_color(&mut self, hex: &str) -> Result<(), JsValue> {
        self.inner
            .theme_mut()
            .set_font_color_hex(hex)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Select a built-in template by name.
    pub fn set_template(&mut self, name: &str) -> Result<(), JsValue> {
        set_template_impl(&mut self.inner, name).map_err(|e| JsValue::from_str(&e))
    }

    /// Set the background image from PNG or JPEG bytes.
    pub fn set_background_image(
        &mut self,
        data: Vec<u8>,
        mime_type: Option<String>,
    ) -> Result<(), JsValue> {
        let image = BackgroundImage::new(data, mime_type.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.theme_mut().set_background_image(image);
        Ok(())
    }

    pub fn clear_background_image(&mut self) {
        self.inner.theme_mut().clear_background_image();
    }

    /// Use an uploaded .pptx as the template.
    pub fn set_theme_document(&mut self, name: &str, data: Vec<u8>) -> Result<(), JsValue> {
        set_theme_document_impl(&mut self.inner, name, data).map_err(|e| JsValue::from_str(&e))
    }

    /// Names of theme documents uploaded so far.
    pub fn theme_document_names(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&TEMPLATE_CACHE.names())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Ordered slide previews for re-rendering the editor list.
    pub fn preview(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.preview())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Suggested built-in template (`business`, `minimal` or `creative`).
    /// Advisory only; nothing is applied.
    pub fn suggest_theme(&self) -> String {
        template_key(self.inner.suggest_theme()).to_string()
    }

    /// Export the deck.
    ///
    /// Returns `{ fileName, mimeType, bytes }` where `bytes` is a
    /// `Uint8Array`, or throws when chart data is malformed.
    pub fn export(&self) -> Result<JsValue, JsValue> {
        let exported = export_impl(&self.inner).map_err(|e| JsValue::from_str(&e))?;

        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"fileName".into(), &exported.file_name.into())?;
        js_sys::Reflect::set(&result, &"mimeType".into(), &exported.mime_type.into())?;
        let bytes = js_sys::Uint8Array::from(exported.bytes.as_slice());
        js_sys::Reflect::set(&result, &"bytes".into(), &bytes.into())?;
        Ok(result.into())
    }

    /// Save the current deck in memory under `name`.
    pub fn save_project(&mut self, name: &str) {
        self.inner.save_project(name);
    }

    /// Restore a deck saved with `save_project`.
    pub fn load_project(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner
            .load_project(name)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn project_names(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.project_names())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn add_slide_impl(
    session: &mut deck_core::DeckSession,
    kind: &str,
    title: &str,
    body: &str,
    chart_data: Option<Vec<u8>>,
    chart_name: Option<String>,
) -> Result<bool, String> {
    let kind = SlideKind::from_name(kind).ok_or_else(|| format!("Unknown slide kind '{}'", kind))?;

    let slide = match kind {
        SlideKind::Text => NewSlide::text(title, body),
        SlideKind::Bullet => NewSlide::bullet(title, body),
        SlideKind::Chart => {
            let name = chart_name.unwrap_or_else(|| "data.csv".to_string());
            let source = chart_data
                .filter(|data| !data.is_empty())
                .map(|data| ChartSource::new(name, data));
            NewSlide::chart(title, source, body)
        }
    };

    Ok(session.add_slide(slide).is_some())
}

fn set_template_impl(session: &mut deck_core::DeckSession, name: &str) -> Result<(), String> {
    let choice =
        TemplateChoice::from_name(name).ok_or_else(|| format!("Unknown template '{}'", name))?;
    session.theme_mut().set_template(TemplateSource::BuiltIn(choice));
    Ok(())
}

fn set_theme_document_impl(
    session: &mut deck_core::DeckSession,
    name: &str,
    data: Vec<u8>,
) -> Result<(), String> {
    let doc = TEMPLATE_CACHE
        .get_or_load(name, data)
        .map_err(|e| e.to_string())?;
    log::debug!("Using theme document '{}' with {} layouts", doc.name, doc.layouts.len());
    session.theme_mut().set_template(TemplateSource::Document(doc));
    Ok(())
}

fn export_impl(session: &deck_core::DeckSession) -> Result<ExportedDeck, String> {
    deck_pptx::export(session).map_err(|e| format!("Export failed: {}", e))
}

/// Form value of a template.
fn template_key(choice: TemplateChoice) -> &'static str {
    match choice {
        TemplateChoice::Business => "business",
        TemplateChoice::Minimal => "minimal",
        TemplateChoice::Creative => "creative",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::PreviewBody;

    #[test]
    fn test_add_slide_kinds() {
        let mut session = deck_core::DeckSession::new();
        assert!(add_slide_impl(&mut session, "bullet", "Agenda", "a\nb", None, None).unwrap());
        let empty_upload = Some(Vec::new());
        assert!(add_slide_impl(&mut session, "chart", "Sales", "later", empty_upload, None).unwrap());
        assert!(!add_slide_impl(&mut session, "text", "", "dropped", None, None).unwrap());
        assert!(add_slide_impl(&mut session, "video", "Clip", "", None, None).is_err());

        let preview = session.preview();
        assert_eq!(preview.len(), 2);
        assert_eq!(
            preview[0].body,
            PreviewBody::Bullets {
                items: vec!["a".to_string(), "b".to_string()]
            }
        );
        // empty upload counts as no data
        assert_eq!(
            preview[1].body,
            PreviewBody::Paragraph {
                text: "later".to_string()
            }
        );
    }

    #[test]
    fn test_set_template() {
        let mut session = deck_core::DeckSession::new();
        set_template_impl(&mut session, "Business").unwrap();
        assert_eq!(
            session.theme().template(),
            &TemplateSource::BuiltIn(TemplateChoice::Business)
        );
        assert!(set_template_impl(&mut session, "neon").is_err());
    }

    #[test]
    fn test_suggestion_key_is_a_valid_template() {
        let mut session = deck_core::DeckSession::new();
        add_slide_impl(&mut session, "text", "One", "x", None, None).unwrap();
        let key = template_key(session.suggest_theme());
        assert_eq!(key, "minimal");
        assert!(set_template_impl(&mut session, key).is_ok());
    }

    #[test]
    fn test_export_failure_keeps_slides() {
        let mut session = deck_core::DeckSession::new();
        add_slide_impl(
            &mut session,
            "chart",
            "Broken",
            "",
            Some(b"name\nalpha\n".to_vec()),
            Some("broken.csv".to_string()),
        )
        .unwrap();

        let err = export_impl(&session).unwrap_err();
        assert!(err.contains("Broken"));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_export_returns_download_metadata() {
        let mut session = deck_core::DeckSession::new();
        add_slide_impl(&mut session, "text", "Hello", "world", None, None).unwrap();
        let exported = export_impl(&session).unwrap();
        assert_eq!(exported.file_name, "presentation.pptx");
        assert!(exported.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_bad_theme_document_is_rejected() {
        let mut session = deck_core::DeckSession::new();
        assert!(set_theme_document_impl(&mut session, "junk.pptx", b"junk".to_vec()).is_err());
        assert_eq!(session.theme().template(), &TemplateSource::default());
    }
}
