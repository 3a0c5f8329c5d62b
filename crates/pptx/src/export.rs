//! Maps the slide list and theme settings to a PPTX package.
//!
//! Export runs in one pass over a snapshot of the slides. Chart data is parsed
//! and rasterized before anything is written, so a bad data source fails the
//! whole export and no partial package is produced.

use crate::chart::{ChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::opc::{content_type, ns, relative_target, rels_part_for, ContentTypes, Relationships};
use crate::package::PackageWriter;
use crate::slide::{Align, Paragraph, Rect, RunStyle, SlideBuilder, TextFrame, EMU_PER_INCH};
use crate::template::{
    app_props_xml, blank_layout_xml, core_props_xml, pres_props_xml, presentation_xml,
    slide_master_xml, table_styles_xml, theme_xml, view_props_xml, APP_PROPS_PART,
    BLANK_LAYOUT_PART, CORE_PROPS_PART, PRESENTATION_PART, PRES_PROPS_PART, SLIDE_MASTER_PART,
    TABLE_STYLES_PART, THEME_PART, VIEW_PROPS_PART,
};
use crate::theme::{rewrite_presentation_xml, BaseParts, MEDIA_FOLDER};
use deck_core::{
    BackgroundImage, ChartTable, DeckInfo, DeckSession, FontColor, ImageFormat, LayoutInfo, Result,
    SlideContent, SlideRecord, TemplateChoice, TemplateSource, ThemeDocument, ThemeSettings,
};
use std::collections::HashSet;

/// MIME type of the exported file.
pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// File name offered for download.
pub const EXPORT_FILE_NAME: &str = "presentation.pptx";

/// First id in a `sldIdLst`.
const FIRST_SLIDE_ID: u32 = 256;

/// Accent for chart lines on theme documents; Office's default blue.
const DOCUMENT_CHART_ACCENT: FontColor = FontColor::rgb(0x44, 0x72, 0xC4);

const BODY_FONT_SIZE: u32 = 20;
const COVER_TITLE_SIZE: u32 = 40;
const COVER_SUBTITLE_SIZE: u32 = 20;
/// Title size for text boxes on theme documents without a title placeholder.
const FALLBACK_TITLE_SIZE: u32 = 32;

/// A finished export, ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDeck {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Export the current state of a session.
///
/// The session is only read, so a failed export leaves it untouched.
pub fn export(session: &DeckSession) -> Result<ExportedDeck> {
    let bytes =
        DeckExporter::new().export(session.store().slides(), session.info(), session.theme())?;

    Ok(ExportedDeck {
        file_name: EXPORT_FILE_NAME.to_string(),
        mime_type: PPTX_MIME_TYPE.to_string(),
        bytes,
    })
}

/// Turns slides, deck info and theme settings into PPTX bytes.
#[derive(Debug, Clone)]
pub struct DeckExporter {
    chart_size: (u32, u32),
}

impl DeckExporter {
    /// Create an exporter with the default chart raster size.
    pub fn new() -> Self {
        Self {
            chart_size: (DEFAULT_WIDTH, DEFAULT_HEIGHT),
        }
    }

    /// Override the pixel size of rendered charts.
    pub fn with_chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = (width, height);
        self
    }

    /// Build the package.
    ///
    /// Emits a cover slide when the deck has a title, then exactly one slide
    /// per record in list order.
    pub fn export(
        &self,
        slides: &[SlideRecord],
        info: &DeckInfo,
        theme: &ThemeSettings,
    ) -> Result<Vec<u8>> {
        let template = theme.template();
        log::debug!(
            "Exporting {} slides (cover: {}) with {}",
            slides.len(),
            info.has_cover(),
            template.describe()
        );

        let accent = match template {
            TemplateSource::BuiltIn(choice) => choice.accent(),
            TemplateSource::Document(_) => DOCUMENT_CHART_ACCENT,
        };
        let renderer =
            ChartRenderer::new(accent).with_size(self.chart_size.0, self.chart_size.1);
        let mut charts = render_charts(&renderer, slides)?;

        let base = match template {
            TemplateSource::BuiltIn(choice) => Base::BuiltIn(*choice),
            TemplateSource::Document(doc) => Base::Document(BaseParts::open(doc)?),
        };
        let taken_media: HashSet<String> = match &base {
            Base::BuiltIn(_) => HashSet::new(),
            Base::Document(parts) => parts
                .parts
                .iter()
                .map(|(name, _)| name)
                .filter(|name| name.starts_with(MEDIA_FOLDER))
                .cloned()
                .collect(),
        };

        let canvas = Canvas::new(theme, taken_media);
        let mut built = Vec::with_capacity(slides.len() + 1);
        if info.has_cover() {
            built.push(canvas.cover_slide(built.len() + 1, info));
        }
        for (record, chart) in slides.iter().zip(charts.iter_mut()) {
            built.push(canvas.content_slide(built.len() + 1, record, chart.take()));
        }

        let bytes = match base {
            Base::BuiltIn(choice) => write_built_in(choice, &canvas, info, built)?,
            Base::Document(parts) => write_on_document(parts, &canvas, info, built)?,
        };

        log::debug!("Export produced {} bytes", bytes.len());
        Ok(bytes)
    }
}

impl Default for DeckExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and rasterize every chart data source, in slide order.
fn render_charts(
    renderer: &ChartRenderer,
    slides: &[SlideRecord],
) -> Result<Vec<Option<Vec<u8>>>> {
    slides
        .iter()
        .map(|record| match &record.content {
            SlideContent::Chart {
                data: Some(source), ..
            } => {
                let table = ChartTable::parse_csv(&record.title, &source.data)?;
                log::debug!(
                    "Chart '{}' from {}: {} rows",
                    record.title,
                    source.name,
                    table.rows().len()
                );
                renderer.render(&table).map(Some)
            }
            _ => Ok(None),
        })
        .collect()
}

/// What the generated slides are written onto.
enum Base {
    /// The built-in master, layout and theme for a template.
    BuiltIn(TemplateChoice),
    /// An uploaded theme document with its own slides removed.
    Document(BaseParts),
}

/// A layout slides are placed on.
#[derive(Debug, Clone, Copy)]
enum Layout<'a> {
    /// The built-in blank layout; all text goes into explicit boxes.
    Blank,
    /// A theme document layout; text goes into its placeholders where present.
    Document(&'a LayoutInfo),
}

impl Layout<'_> {
    fn part_name(&self) -> &str {
        match self {
            Layout::Blank => BLANK_LAYOUT_PART,
            Layout::Document(layout) => &layout.part_name,
        }
    }

    fn title_placeholder(&self) -> Option<TextFrame> {
        match self {
            Layout::Blank => None,
            Layout::Document(layout) => layout
                .title_placeholder()
                .map(|ph| TextFrame::Placeholder(ph.clone())),
        }
    }

    fn body_placeholder(&self) -> Option<TextFrame> {
        match self {
            Layout::Blank => None,
            Layout::Document(layout) => layout
                .body_placeholder()
                .map(|ph| TextFrame::Placeholder(ph.clone())),
        }
    }
}

/// One generated slide part with its relationships and chart image.
#[derive(Debug)]
struct BuiltSlide {
    part_name: String,
    xml: String,
    rels: Relationships,
    chart: Option<(String, Vec<u8>)>,
}

/// Page geometry and styling shared by every slide of one export.
struct Canvas<'a> {
    width: i64,
    height: i64,
    style: RunStyle,
    title_size: Option<u32>,
    background: Option<&'a BackgroundImage>,
    background_part: Option<String>,
    /// Media parts already present in the theme document.
    taken_media: HashSet<String>,
    content_layout: Layout<'a>,
    cover_layout: Layout<'a>,
}

impl<'a> Canvas<'a> {
    fn new(theme: &'a ThemeSettings, taken_media: HashSet<String>) -> Self {
        let (width, height) = theme.template().slide_size();
        let style = RunStyle {
            color: theme.effective_font_color(),
            typeface: match theme.template() {
                TemplateSource::BuiltIn(choice) => Some(choice.typeface().to_string()),
                TemplateSource::Document(_) => None,
            },
        };

        let (title_size, content_layout, cover_layout) = match theme.template() {
            TemplateSource::BuiltIn(choice) => {
                (Some(choice.title_size()), Layout::Blank, Layout::Blank)
            }
            TemplateSource::Document(doc) => {
                (None, document_content_layout(doc), document_cover_layout(doc))
            }
        };

        let background = theme.background_image();
        let background_part = background.map(|image| {
            media_part(&taken_media, "deck-background", image.format().extension())
        });

        Self {
            width,
            height,
            style,
            title_size,
            background,
            background_part,
            taken_media,
            content_layout,
            cover_layout,
        }
    }

    fn title_rect(&self) -> Rect {
        Rect::new(
            EMU_PER_INCH / 2,
            EMU_PER_INCH * 4 / 10,
            self.width - EMU_PER_INCH,
            EMU_PER_INCH * 11 / 10,
        )
    }

    fn body_rect(&self) -> Rect {
        Rect::new(
            EMU_PER_INCH,
            EMU_PER_INCH * 3 / 2,
            self.width - 2 * EMU_PER_INCH,
            self.height - EMU_PER_INCH * 9 / 4,
        )
    }

    /// Fixed chart region, 16:9, centered horizontally below the title.
    fn chart_rect(&self) -> Rect {
        let cx = self.width * 8 / 10;
        let cy = (cx * 9 / 16).min(self.height * 3 / 4);
        Rect::new((self.width - cx) / 2, self.height / 5, cx, cy)
    }

    /// Start a slide on `layout`, with the background stamped first.
    fn begin(&self, number: usize, layout: Layout<'_>) -> (String, SlideBuilder, Relationships) {
        let part_name = format!("ppt/slides/slide{}.xml", number);
        let mut rels = Relationships::new();
        rels.add(
            "rId1",
            ns::REL_SLIDE_LAYOUT,
            relative_target(&part_name, layout.part_name()),
        );

        let mut builder = SlideBuilder::new(self.style.clone());
        if let Some(background) = &self.background_part {
            rels.add("rId2", ns::REL_IMAGE, relative_target(&part_name, background));
            builder.add_picture(
                "Background",
                "Background image",
                "rId2",
                Rect::new(0, 0, self.width, self.height),
            );
        }

        (part_name, builder, rels)
    }

    fn cover_slide(&self, number: usize, info: &DeckInfo) -> BuiltSlide {
        let layout = self.cover_layout;
        let (part_name, mut builder, rels) = self.begin(number, layout);

        let box_width = self.width - 2 * EMU_PER_INCH;
        let title_frame = layout.title_placeholder().unwrap_or(TextFrame::Box(Rect::new(
            EMU_PER_INCH,
            self.height / 3,
            box_width,
            EMU_PER_INCH * 3 / 2,
        )));
        builder.add_text(
            "Title",
            &title_frame,
            &[Paragraph::plain(info.title.as_str())
                .with_size(COVER_TITLE_SIZE)
                .with_bold(true)
                .with_align(Align::Center)],
        );

        if !info.subtitle.trim().is_empty() {
            let subtitle_frame = layout.body_placeholder().unwrap_or(TextFrame::Box(Rect::new(
                EMU_PER_INCH,
                self.height / 3 + EMU_PER_INCH * 8 / 5,
                box_width,
                EMU_PER_INCH,
            )));
            builder.add_text(
                "Subtitle",
                &subtitle_frame,
                &[Paragraph::plain(info.subtitle.as_str())
                    .with_size(COVER_SUBTITLE_SIZE)
                    .with_align(Align::Center)],
            );
        }

        BuiltSlide {
            part_name,
            xml: builder.finish(),
            rels,
            chart: None,
        }
    }

    fn content_slide(
        &self,
        number: usize,
        record: &SlideRecord,
        chart: Option<Vec<u8>>,
    ) -> BuiltSlide {
        let layout = self.content_layout;
        let (part_name, mut builder, mut rels) = self.begin(number, layout);

        let title_frame = layout
            .title_placeholder()
            .unwrap_or(TextFrame::Box(self.title_rect()));
        let mut title = Paragraph::plain(record.title.as_str());
        if let TextFrame::Box(_) = title_frame {
            title = title
                .with_size(self.title_size.unwrap_or(FALLBACK_TITLE_SIZE))
                .with_bold(true);
        }
        builder.add_text("Title", &title_frame, &[title]);

        let body_frame = layout
            .body_placeholder()
            .unwrap_or(TextFrame::Box(self.body_rect()));
        let sized = |paragraph: Paragraph| match body_frame {
            TextFrame::Box(_) => paragraph.with_size(BODY_FONT_SIZE),
            TextFrame::Placeholder(_) => paragraph,
        };

        let mut chart_media = None;
        match (&record.content, chart) {
            (SlideContent::Chart { data: Some(source), .. }, Some(png)) => {
                let media = media_part(&self.taken_media, &format!("deck-chart-{}", number), "png");
                let rel_id = format!("rId{}", rels.len() + 1);
                rels.add(rel_id.as_str(), ns::REL_IMAGE, relative_target(&part_name, &media));
                builder.add_picture("Chart", &source.name, &rel_id, self.chart_rect());
                chart_media = Some((media, png));
            }
            (SlideContent::Text { body }, _) => {
                builder.add_text("Body", &body_frame, &[sized(Paragraph::plain(body.as_str()))]);
            }
            (SlideContent::Bullet { .. }, _) => {
                let items: Vec<Paragraph> = record
                    .bullet_items()
                    .into_iter()
                    .map(|item| sized(Paragraph::bullet(item, 1)))
                    .collect();
                if !items.is_empty() {
                    builder.add_text("Body", &body_frame, &items);
                }
            }
            (SlideContent::Chart { body, .. }, _) => {
                if !body.trim().is_empty() {
                    let paragraph = sized(Paragraph::plain(body.as_str()));
                    builder.add_text("Body", &body_frame, &[paragraph]);
                }
            }
        }

        BuiltSlide {
            part_name,
            xml: builder.finish(),
            rels,
            chart: chart_media,
        }
    }
}

/// `ppt/media/<stem>.<extension>`, suffixed until it names no part in `taken`.
fn media_part(taken: &HashSet<String>, stem: &str, extension: &str) -> String {
    let mut name = format!("{}{}.{}", MEDIA_FOLDER, stem, extension);
    let mut n = 1;
    while taken.contains(&name) {
        n += 1;
        name = format!("{}{}-{}.{}", MEDIA_FOLDER, stem, n, extension);
    }
    name
}

fn document_content_layout(doc: &ThemeDocument) -> Layout<'_> {
    if doc.layouts.len() < 2 {
        log::warn!(
            "Theme '{}' has {} layout(s); content slides use the last one",
            doc.name,
            doc.layouts.len()
        );
    }
    doc.content_layout().map_or(Layout::Blank, Layout::Document)
}

fn document_cover_layout(doc: &ThemeDocument) -> Layout<'_> {
    doc.cover_layout().map_or(Layout::Blank, Layout::Document)
}

/// Slide ids and presentation relationship ids, in order.
fn slide_ids(count: usize, mut rel_id: impl FnMut(usize) -> String) -> Vec<(u32, String)> {
    (0..count)
        .map(|i| (FIRST_SLIDE_ID + i as u32, rel_id(i)))
        .collect()
}

/// Write the slides, their relationships and media into `package`.
fn write_slides(
    package: &mut PackageWriter,
    canvas: &Canvas<'_>,
    slides: Vec<BuiltSlide>,
) -> Result<()> {
    if let (Some(part), Some(image)) = (&canvas.background_part, canvas.background) {
        package.add_part(part, image.data())?;
    }

    for slide in slides {
        package.add_xml(&slide.part_name, &slide.xml)?;
        package.add_xml(&rels_part_for(&slide.part_name), &slide.rels.to_xml())?;
        if let Some((media, png)) = slide.chart {
            package.add_part(&media, &png)?;
        }
    }

    Ok(())
}

fn add_media_defaults(types: &mut ContentTypes) {
    for format in [ImageFormat::Png, ImageFormat::Jpeg] {
        types.add_default(format.extension(), format.mime_type());
    }
}

/// Package with the built-in master, blank layout and theme.
fn write_built_in(
    choice: TemplateChoice,
    canvas: &Canvas<'_>,
    info: &DeckInfo,
    slides: Vec<BuiltSlide>,
) -> Result<Vec<u8>> {
    // rId1..rId5 are taken by the master, theme and property parts
    let ids = slide_ids(slides.len(), |i| format!("rId{}", 6 + i));

    let mut types = ContentTypes::new();
    add_media_defaults(&mut types);
    types.add_override(PRESENTATION_PART, content_type::PRESENTATION);
    types.add_override(SLIDE_MASTER_PART, content_type::SLIDE_MASTER);
    types.add_override(BLANK_LAYOUT_PART, content_type::SLIDE_LAYOUT);
    types.add_override(THEME_PART, content_type::THEME);
    types.add_override(PRES_PROPS_PART, content_type::PRES_PROPS);
    types.add_override(VIEW_PROPS_PART, content_type::VIEW_PROPS);
    types.add_override(TABLE_STYLES_PART, content_type::TABLE_STYLES);
    types.add_override(CORE_PROPS_PART, content_type::CORE_PROPERTIES);
    types.add_override(APP_PROPS_PART, content_type::EXTENDED_PROPERTIES);
    for slide in &slides {
        types.add_override(&slide.part_name, content_type::SLIDE);
    }

    let mut root_rels = Relationships::new();
    root_rels.add("rId1", ns::REL_OFFICE_DOCUMENT, PRESENTATION_PART);
    root_rels.add("rId2", ns::REL_CORE_PROPERTIES, CORE_PROPS_PART);
    root_rels.add("rId3", ns::REL_EXTENDED_PROPERTIES, APP_PROPS_PART);

    let mut pres_rels = Relationships::new();
    let from_presentation = |part: &str| relative_target(PRESENTATION_PART, part);
    pres_rels.add("rId1", ns::REL_SLIDE_MASTER, from_presentation(SLIDE_MASTER_PART));
    pres_rels.add("rId2", ns::REL_THEME, from_presentation(THEME_PART));
    pres_rels.add("rId3", ns::REL_PRES_PROPS, from_presentation(PRES_PROPS_PART));
    pres_rels.add("rId4", ns::REL_VIEW_PROPS, from_presentation(VIEW_PROPS_PART));
    pres_rels.add("rId5", ns::REL_TABLE_STYLES, from_presentation(TABLE_STYLES_PART));
    for ((_, rel_id), slide) in ids.iter().zip(&slides) {
        pres_rels.add(rel_id.as_str(), ns::REL_SLIDE, from_presentation(&slide.part_name));
    }

    let mut master_rels = Relationships::new();
    master_rels.add(
        "rId1",
        ns::REL_SLIDE_LAYOUT,
        relative_target(SLIDE_MASTER_PART, BLANK_LAYOUT_PART),
    );
    master_rels.add("rId2", ns::REL_THEME, relative_target(SLIDE_MASTER_PART, THEME_PART));

    let mut layout_rels = Relationships::new();
    layout_rels.add(
        "rId1",
        ns::REL_SLIDE_MASTER,
        relative_target(BLANK_LAYOUT_PART, SLIDE_MASTER_PART),
    );

    let mut package = PackageWriter::new();
    package.add_xml("[Content_Types].xml", &types.to_xml())?;
    package.add_xml("_rels/.rels", &root_rels.to_xml())?;
    package.add_xml(PRESENTATION_PART, &presentation_xml(&ids, canvas.width, canvas.height))?;
    package.add_xml(&rels_part_for(PRESENTATION_PART), &pres_rels.to_xml())?;
    package.add_xml(SLIDE_MASTER_PART, &slide_master_xml(choice))?;
    package.add_xml(&rels_part_for(SLIDE_MASTER_PART), &master_rels.to_xml())?;
    package.add_xml(BLANK_LAYOUT_PART, &blank_layout_xml())?;
    package.add_xml(&rels_part_for(BLANK_LAYOUT_PART), &layout_rels.to_xml())?;
    package.add_xml(THEME_PART, &theme_xml(choice))?;
    package.add_xml(PRES_PROPS_PART, &pres_props_xml())?;
    package.add_xml(VIEW_PROPS_PART, &view_props_xml())?;
    package.add_xml(TABLE_STYLES_PART, &table_styles_xml())?;
    package.add_xml(CORE_PROPS_PART, &core_props_xml(&info.title))?;
    package.add_xml(APP_PROPS_PART, &app_props_xml(slides.len()))?;
    write_slides(&mut package, canvas, slides)?;

    package.finish()
}

/// Package built on an uploaded theme document, its own slides dropped.
fn write_on_document(
    base: BaseParts,
    canvas: &Canvas<'_>,
    info: &DeckInfo,
    slides: Vec<BuiltSlide>,
) -> Result<Vec<u8>> {
    let BaseParts {
        parts,
        presentation_xml,
        mut presentation_rels,
        mut content_types,
    } = base;

    let mut counter = 0usize;
    let ids = slide_ids(slides.len(), |_| loop {
        counter += 1;
        let candidate = format!("rIdDeck{}", counter);
        if presentation_rels.by_id(&candidate).is_none() {
            break candidate;
        }
    });
    for ((_, rel_id), slide) in ids.iter().zip(&slides) {
        presentation_rels.add(
            rel_id.as_str(),
            ns::REL_SLIDE,
            relative_target(PRESENTATION_PART, &slide.part_name),
        );
    }

    add_media_defaults(&mut content_types);
    for slide in &slides {
        content_types.add_override(&slide.part_name, content_type::SLIDE);
    }

    let mut package = PackageWriter::new();
    package.add_xml("[Content_Types].xml", &content_types.to_xml())?;
    for (name, data) in &parts {
        match name.as_str() {
            CORE_PROPS_PART => package.add_xml(name, &core_props_xml(&info.title))?,
            APP_PROPS_PART => package.add_xml(name, &app_props_xml(slides.len()))?,
            _ => package.add_part(name, data)?,
        }
    }
    package.add_xml(
        PRESENTATION_PART,
        &rewrite_presentation_xml(&presentation_xml, &ids)?,
    )?;
    package.add_xml(&rels_part_for(PRESENTATION_PART), &presentation_rels.to_xml())?;
    write_slides(&mut package, canvas, slides)?;

    package.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{DeckReader, ReadDeck};
    use crate::theme::fixtures::theme_package;
    use crate::theme::read_theme_document;
    use deck_core::{ChartSource, Error, NewSlide};
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use zip::ZipArchive;

    const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn exporter() -> DeckExporter {
        DeckExporter::new().with_chart_size(160, 90)
    }

    fn session_with(slides: Vec<NewSlide>) -> DeckSession {
        let mut session = DeckSession::new();
        for slide in slides {
            session.add_slide(slide);
        }
        session
    }

    fn export_session(session: &DeckSession) -> Result<Vec<u8>> {
        exporter().export(session.store().slides(), session.info(), session.theme())
    }

    fn background_png() -> BackgroundImage {
        let mut png = PNG_BYTES.to_vec();
        png.extend_from_slice(&[0; 8]);
        BackgroundImage::new(png, Some("image/png")).unwrap()
    }

    fn read_back(bytes: &[u8]) -> ReadDeck {
        DeckReader::new().read(Cursor::new(bytes)).unwrap()
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_export_empty_deck_has_no_slides() {
        let bytes = export_session(&DeckSession::new()).unwrap();
        let deck = read_back(&bytes);
        assert!(deck.slides.is_empty());
        assert!(!part(&bytes, "ppt/presentation.xml").contains("sldIdLst"));
    }

    #[test]
    fn test_export_emits_one_slide_per_record_in_order() {
        let session = session_with(vec![
            NewSlide::text("First", "a"),
            NewSlide::bullet("Second", "x"),
            NewSlide::chart("Third", None, "no data"),
        ]);
        let deck = read_back(&export_session(&session).unwrap());

        let titles: Vec<String> = deck.slides.iter().filter_map(|s| s.title()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_bullet_body_becomes_bullet_items() {
        let session = session_with(vec![NewSlide::bullet("List", "a\nb\nc")]);
        let deck = read_back(&export_session(&session).unwrap());
        assert_eq!(deck.slides[0].bullet_items(), vec!["a", "b", "c"]);
        assert_eq!(deck.slides[0].bullet_items(), deck_core::split_bullets("a\nb\nc"));
    }

    #[test]
    fn test_empty_bullet_body_has_no_items() {
        let session = session_with(vec![NewSlide::bullet("List", "")]);
        let deck = read_back(&export_session(&session).unwrap());
        assert!(deck.slides[0].bullet_items().is_empty());
    }

    #[test]
    fn test_text_body_is_one_paragraph() {
        let session = session_with(vec![NewSlide::text("Prose", "hello\nworld")]);
        let deck = read_back(&export_session(&session).unwrap());

        let bodies: Vec<_> = deck.slides[0].body_shapes().collect();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].paragraphs.len(), 1);
        assert_eq!(bodies[0].paragraphs[0].text, "hello\nworld");
        assert_eq!(bodies[0].paragraphs[0].level, None);
    }

    #[test]
    fn test_chart_without_data_falls_back_to_body_text() {
        let session = session_with(vec![NewSlide::chart("Sales", None, "No numbers yet")]);
        let deck = read_back(&export_session(&session).unwrap());
        let slide = &deck.slides[0];
        assert!(slide.pictures().is_empty());
        assert_eq!(slide.body_shapes().next().unwrap().text(), "No numbers yet");
    }

    #[test]
    fn test_chart_with_data_places_png() {
        let data = ChartSource::new("sales.csv", "month,revenue\n1,10\n2,12\n3,9\n");
        let session = session_with(vec![NewSlide::chart("Sales", Some(data), "")]);
        let bytes = export_session(&session).unwrap();
        let deck = read_back(&bytes);

        assert_eq!(deck.slides[0].pictures(), vec!["ppt/media/deck-chart-1.png"]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut png = Vec::new();
        archive
            .by_name("ppt/media/deck-chart-1.png")
            .unwrap()
            .read_to_end(&mut png)
            .unwrap();
        assert!(png.starts_with(&PNG_BYTES[..4]));
    }

    #[test]
    fn test_malformed_chart_fails_export_and_keeps_slides() {
        let data = ChartSource::new("bad.csv", "label\nnot-a-number\n");
        let session = session_with(vec![
            NewSlide::text("Intro", "hi"),
            NewSlide::chart("Broken", Some(data), ""),
        ]);
        let before = session.store().clone();

        let err = export(&session).unwrap_err();
        assert!(matches!(err, Error::ChartData { ref slide, .. } if slide == "Broken"));
        assert_eq!(session.store(), &before);
    }

    #[test]
    fn test_background_is_first_shape_on_every_slide() {
        let mut session = session_with(vec![
            NewSlide::text("One", "a"),
            NewSlide::bullet("Two", "b"),
        ]);
        session.set_info(DeckInfo::new("Deck", "Someone"));
        session.theme_mut().set_background_image(background_png());

        let deck = read_back(&export_session(&session).unwrap());
        assert_eq!(deck.slides.len(), 3);
        for slide in &deck.slides {
            assert_eq!(slide.shapes[0].picture.as_deref(), Some("ppt/media/deck-background.png"));
            assert_eq!((slide.shapes[0].x, slide.shapes[0].y), (0, 0));
        }
    }

    #[test]
    fn test_control_characters_do_not_reach_slide_xml() {
        let session = session_with(vec![NewSlide::text("Tab\u{0001}bed", "x\u{000B}y")]);
        let bytes = export_session(&session).unwrap();

        let slide = part(&bytes, "ppt/slides/slide1.xml");
        assert!(!slide.contains('\u{0001}'));
        assert!(!slide.contains('\u{000B}'));

        let deck = read_back(&bytes);
        assert_eq!(deck.slides[0].title().as_deref(), Some("Tabbed"));
        let body = deck.slides[0].body_shapes().next().unwrap();
        assert_eq!(body.paragraphs[0].text, "x\ny");
    }

    #[test]
    fn test_cover_slide_precedes_content() {
        let mut session = session_with(vec![NewSlide::text("Body", "x")]);
        session.set_info(DeckInfo::new("Quarterly Review", "Finance team"));
        let bytes = export_session(&session).unwrap();
        let deck = read_back(&bytes);

        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].title().as_deref(), Some("Quarterly Review"));
        assert_eq!(deck.slides[0].body_shapes().next().unwrap().text(), "Finance team");
        let core = part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Quarterly Review</dc:title>"));
        assert!(part(&bytes, "docProps/app.xml").contains("<Slides>2</Slides>"));
    }

    #[test]
    fn test_font_color_applies_to_runs() {
        let mut session = session_with(vec![NewSlide::text("Color", "x")]);
        session.theme_mut().set_font_color_hex("#ff0000").unwrap();
        let bytes = export_session(&session).unwrap();
        let slide = part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:srgbClr val="FF0000"/>"#));
        assert!(!slide.contains(&TemplateChoice::Minimal.text_color().to_hex()));
    }

    #[test]
    fn test_built_in_template_sets_master_background() {
        let mut session = session_with(vec![NewSlide::text("Dark", "x")]);
        session
            .theme_mut()
            .set_template(TemplateSource::BuiltIn(TemplateChoice::Business));
        let bytes = export_session(&session).unwrap();
        let master = part(&bytes, SLIDE_MASTER_PART);
        assert!(master.contains(&TemplateChoice::Business.background().to_hex()));
    }

    #[test]
    fn test_export_is_deterministic() {
        let session = session_with(vec![
            NewSlide::text("A", "a"),
            NewSlide::chart("B", Some(ChartSource::new("b.csv", "v\n1\n2\n")), ""),
        ]);
        assert_eq!(export_session(&session).unwrap(), export_session(&session).unwrap());
    }

    #[test]
    fn test_every_part_has_a_content_type() {
        let mut session = session_with(vec![NewSlide::chart(
            "C",
            Some(ChartSource::new("c.csv", "v\n1\n")),
            "",
        )]);
        session.set_info(DeckInfo::new("Deck", ""));
        let bytes = export_session(&session).unwrap();
        let types = ContentTypes::parse(&part(&bytes, "[Content_Types].xml")).unwrap();
        for name in part_names(&bytes) {
            if name == "[Content_Types].xml" {
                continue;
            }
            assert!(types.content_type_of(&name).is_some(), "no content type for {}", name);
        }
    }

    #[test]
    fn test_exported_deck_metadata() {
        let exported = export(&DeckSession::new()).unwrap();
        assert_eq!(exported.file_name, "presentation.pptx");
        assert_eq!(exported.mime_type, PPTX_MIME_TYPE);
        assert!(exported.bytes.starts_with(b"PK"));
    }

    fn document_session(layouts: usize, slides: Vec<NewSlide>) -> DeckSession {
        let doc = read_theme_document("brand.pptx", theme_package(layouts)).unwrap();
        let mut session = session_with(slides);
        session
            .theme_mut()
            .set_template(TemplateSource::Document(Arc::new(doc)));
        session
    }

    #[test]
    fn test_theme_document_replaces_its_slides() {
        let session = document_session(
            2,
            vec![NewSlide::bullet("Agenda", "one\ntwo"), NewSlide::text("Notes", "n")],
        );
        let bytes = export_session(&session).unwrap();
        let deck = read_back(&bytes);

        assert_eq!((deck.slide_width, deck.slide_height), (12_192_000, 6_858_000));
        assert_eq!(deck.slides.len(), 2);
        for slide in &deck.slides {
            assert_eq!(slide.layout.as_deref(), Some("ppt/slideLayouts/slideLayout2.xml"));
        }

        let agenda = &deck.slides[0];
        let title = agenda.title_shape().unwrap();
        assert_eq!(title.placeholder.as_ref().unwrap().ph_type.as_deref(), Some("title"));
        assert_eq!(agenda.bullet_items(), vec!["one", "two"]);
        let body = agenda.body_shapes().next().unwrap();
        assert_eq!(body.placeholder.as_ref().unwrap().idx, Some(1));

        let names = part_names(&bytes);
        assert!(names.contains(&"ppt/media/logo.png".to_string()));
        assert!(names.contains(&"ppt/theme/theme1.xml".to_string()));
        let presentation = part(&bytes, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 2);
        assert!(presentation.contains(r#"r:id="rIdDeck1""#));
    }

    #[test]
    fn test_theme_document_with_single_layout_uses_it() {
        let session = document_session(1, vec![NewSlide::text("Only", "x")]);
        let deck = read_back(&export_session(&session).unwrap());
        assert_eq!(
            deck.slides[0].layout.as_deref(),
            Some("ppt/slideLayouts/slideLayout1.xml")
        );
    }

    #[test]
    fn test_theme_document_cover_uses_first_layout() {
        let mut session = document_session(2, vec![]);
        session.set_info(DeckInfo::new("Launch", "2024"));
        let deck = read_back(&export_session(&session).unwrap());

        assert_eq!(deck.slides.len(), 1);
        let cover = &deck.slides[0];
        assert_eq!(cover.layout.as_deref(), Some("ppt/slideLayouts/slideLayout1.xml"));
        assert_eq!(cover.title().as_deref(), Some("Launch"));
    }

    #[test]
    fn test_exported_deck_can_be_reused_as_theme_document() {
        let data = ChartSource::new("sales.csv", "month,revenue\n1,10\n2,12\n");
        let mut session = session_with(vec![
            NewSlide::text("Intro", "hi"),
            NewSlide::chart("Sales", Some(data), ""),
        ]);
        session.set_info(DeckInfo::new("Review", ""));
        session.theme_mut().set_background_image(background_png());
        let first = export_session(&session).unwrap();

        let doc = read_theme_document("previous.pptx", first).unwrap();
        session
            .theme_mut()
            .set_template(TemplateSource::Document(Arc::new(doc)));
        let second = export_session(&session).unwrap();

        let deck = read_back(&second);
        assert_eq!(deck.slides.len(), 3);
        for slide in &deck.slides {
            assert_eq!(
                slide.shapes[0].picture.as_deref(),
                Some("ppt/media/deck-background.png")
            );
        }
        assert_eq!(
            deck.slides[2].pictures(),
            vec!["ppt/media/deck-background.png", "ppt/media/deck-chart-3.png"]
        );

        let media: Vec<String> = part_names(&second)
            .into_iter()
            .filter(|n| n.starts_with(MEDIA_FOLDER))
            .collect();
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn test_media_names_avoid_theme_document_parts() {
        let taken: HashSet<String> = [
            "ppt/media/deck-background.png",
            "ppt/media/deck-background-2.png",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        assert_eq!(
            media_part(&taken, "deck-background", "png"),
            "ppt/media/deck-background-3.png"
        );
        assert_eq!(media_part(&taken, "deck-chart-1", "png"), "ppt/media/deck-chart-1.png");
    }

    #[test]
    fn test_theme_document_empty_export() {
        let session = document_session(2, vec![]);
        let bytes = export_session(&session).unwrap();
        assert!(read_back(&bytes).slides.is_empty());
        assert!(!part_names(&bytes).iter().any(|n| n.starts_with("ppt/slides/")));
    }
}
