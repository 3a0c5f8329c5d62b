//! Reads slide text and pictures back out of a PPTX package.
//!
//! Used to inspect exported decks: slides come back in presentation order
//! with their shapes, paragraphs and bullet levels.

use crate::opc::{attr_value, local_name, prefix_of, rels_part_for, resolve_target, Relationships};
use deck_core::{Error, PlaceholderInfo, Result, DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Reader for PPTX packages.
pub struct DeckReader;

impl DeckReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read all slides of a package.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<ReadDeck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let presentation = self.read_file_from_archive(&mut archive, PRESENTATION_PART)?;
        let (slide_width, slide_height, slide_rel_ids) = self.parse_presentation(&presentation)?;

        let rels_path = rels_part_for(PRESENTATION_PART);
        let rels = Relationships::parse(&self.read_file_from_archive(&mut archive, &rels_path)?)?;

        let mut slides = Vec::with_capacity(slide_rel_ids.len());
        for (idx, rel_id) in slide_rel_ids.iter().enumerate() {
            let rel = rels.by_id(rel_id).ok_or_else(|| {
                Error::XmlError(format!("Slide relationship '{}' not found", rel_id))
            })?;
            let part_name = resolve_target(PRESENTATION_PART, &rel.target);
            slides.push(self.parse_slide(&mut archive, &part_name, idx + 1)?);
        }

        Ok(ReadDeck {
            slide_width,
            slide_height,
            slides,
        })
    }

    /// Page size and slide relationship ids, in `sldIdLst` order.
    fn parse_presentation(&self, xml: &str) -> Result<(i64, i64, Vec<String>)> {
        let mut width = DEFAULT_SLIDE_WIDTH;
        let mut height = DEFAULT_SLIDE_HEIGHT;
        let mut ids = Vec::new();

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sldId" => {
                            if let Some(id) = relationship_attr(e, b"id") {
                                ids.push(id);
                            }
                        }
                        b"sldSz" => {
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"cx" => width = attr_value(&attr).parse().unwrap_or(width),
                                    b"cy" => height = attr_value(&attr).parse().unwrap_or(height),
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing presentation: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok((width, height, ids))
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        part_name: &str,
        number: usize,
    ) -> Result<ReadSlide> {
        let content = self.read_file_from_archive(archive, part_name)?;
        let rels = match self.read_file_from_archive(archive, &rels_part_for(part_name)) {
            Ok(xml) => Relationships::parse(&xml)?,
            Err(_) => Relationships::new(),
        };

        let mut shapes = self.extract_shapes_from_xml(&content)?;
        for shape in &mut shapes {
            if let Some(rel_id) = shape.picture.take() {
                shape.picture = rels
                    .by_id(&rel_id)
                    .map(|rel| resolve_target(part_name, &rel.target));
            }
        }

        let layout = rels
            .iter()
            .find(|rel| rel.rel_type.ends_with("/slideLayout"))
            .map(|rel| resolve_target(part_name, &rel.target));

        Ok(ReadSlide {
            number,
            part_name: part_name.to_string(),
            layout,
            shapes,
        })
    }

    /// Extract shapes with their paragraphs from slide XML.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<Vec<ReadShape>> {
        let mut shapes = Vec::new();
        let mut reader = Reader::from_str(xml_content);

        let mut current_shape: Option<ReadShape> = None;
        let mut current_paragraph: Option<ReadParagraph> = None;
        let mut in_text_body = false;
        let mut in_run_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sp" | b"pic" => {
                            current_shape = Some(ReadShape::default());
                        }
                        b"txBody" => in_text_body = true,
                        b"p" if in_text_body => {
                            current_paragraph = Some(ReadParagraph::default());
                        }
                        b"pPr" => read_paragraph_level(e, &mut current_paragraph),
                        b"t" if current_paragraph.is_some() => in_run_text = true,
                        b"br" => {
                            if let Some(ref mut paragraph) = current_paragraph {
                                paragraph.text.push('\n');
                            }
                        }
                        other => read_shape_attributes(other, e, &mut current_shape),
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"pPr" => read_paragraph_level(e, &mut current_paragraph),
                        b"br" => {
                            if let Some(ref mut paragraph) = current_paragraph {
                                paragraph.text.push('\n');
                            }
                        }
                        other => read_shape_attributes(other, e, &mut current_shape),
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_run_text {
                        if let Some(ref mut paragraph) = current_paragraph {
                            let text = e.unescape().unwrap_or_default();
                            paragraph.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sp" | b"pic" => {
                            if let Some(shape) = current_shape.take() {
                                shapes.push(shape);
                            }
                            in_text_body = false;
                        }
                        b"txBody" => in_text_body = false,
                        b"p" => {
                            if let (Some(paragraph), Some(shape)) =
                                (current_paragraph.take(), current_shape.as_mut())
                            {
                                shape.paragraphs.push(paragraph);
                            }
                        }
                        b"t" => in_run_text = false,
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
                }
                _ => {}
            }
        }

        Ok(shapes)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DeckReader {
    fn default() -> Self {
        Self::new()
    }
}

/// A package read back by [`DeckReader`].
#[derive(Debug, Clone, Serialize)]
pub struct ReadDeck {
    pub slide_width: i64,
    pub slide_height: i64,
    pub slides: Vec<ReadSlide>,
}

/// One slide and its shapes in z-order.
#[derive(Debug, Clone, Serialize)]
pub struct ReadSlide {
    /// 1-based position in the presentation.
    pub number: usize,
    pub part_name: String,
    /// Layout part the slide is based on.
    pub layout: Option<String>,
    pub shapes: Vec<ReadShape>,
}

impl ReadSlide {
    /// The title shape: a title placeholder, or a shape named `Title`.
    pub fn title_shape(&self) -> Option<&ReadShape> {
        self.shapes.iter().find(|shape| shape.is_title())
    }

    /// Title text, if the slide has a title shape.
    pub fn title(&self) -> Option<String> {
        self.title_shape().map(ReadShape::text)
    }

    /// Text shapes other than the title.
    pub fn body_shapes(&self) -> impl Iterator<Item = &ReadShape> {
        self.shapes
            .iter()
            .filter(|shape| !shape.is_title() && shape.picture.is_none())
    }

    /// Paragraphs with a bullet level, in order.
    pub fn bullet_items(&self) -> Vec<&str> {
        self.body_shapes()
            .flat_map(|shape| shape.paragraphs.iter())
            .filter(|p| p.level.is_some())
            .map(|p| p.text.as_str())
            .collect()
    }

    /// Media parts referenced by pictures, in z-order.
    pub fn pictures(&self) -> Vec<&str> {
        self.shapes
            .iter()
            .filter_map(|shape| shape.picture.as_deref())
            .collect()
    }
}

/// A shape on a slide.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadShape {
    pub name: String,
    pub placeholder: Option<PlaceholderInfo>,
    pub x: i64,
    pub y: i64,
    pub paragraphs: Vec<ReadParagraph>,
    /// Media part of a picture.
    pub picture: Option<String>,
}

impl ReadShape {
    /// Whether this shape holds the slide title.
    pub fn is_title(&self) -> bool {
        match self.placeholder {
            Some(ref ph) => ph.is_title(),
            None => self.name.starts_with("Title"),
        }
    }

    /// All paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A paragraph; line breaks inside it are `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadParagraph {
    pub text: String,
    /// `lvl` of the paragraph properties, when set.
    pub level: Option<u32>,
}

fn read_paragraph_level(e: &BytesStart, paragraph: &mut Option<ReadParagraph>) {
    if let Some(ref mut paragraph) = paragraph {
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"lvl" {
                paragraph.level = attr_value(&attr).parse().ok();
            }
        }
    }
}

fn read_shape_attributes(local: &[u8], e: &BytesStart, shape: &mut Option<ReadShape>) {
    let Some(shape) = shape.as_mut() else {
        return;
    };

    match local {
        b"cNvPr" => {
            for attr in e.attributes().flatten() {
                if attr.key.as_ref() == b"name" {
                    shape.name = attr_value(&attr);
                }
            }
        }
        b"ph" => {
            let mut ph = PlaceholderInfo {
                ph_type: None,
                idx: None,
            };
            for attr in e.attributes().flatten() {
                match attr.key.as_ref() {
                    b"type" => ph.ph_type = Some(attr_value(&attr)),
                    b"idx" => ph.idx = attr_value(&attr).parse().ok(),
                    _ => {}
                }
            }
            shape.placeholder = Some(ph);
        }
        b"off" => {
            for attr in e.attributes().flatten() {
                match attr.key.as_ref() {
                    b"x" => shape.x = attr_value(&attr).parse().unwrap_or(shape.x),
                    b"y" => shape.y = attr_value(&attr).parse().unwrap_or(shape.y),
                    _ => {}
                }
            }
        }
        b"blip" => {
            shape.picture = relationship_attr(e, b"embed");
        }
        _ => {}
    }
}

/// A relationship-namespaced attribute (`r:id`, `r:embed`), whatever its prefix.
fn relationship_attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            let key = attr.key.as_ref();
            local_name(key) == local && prefix_of(key).is_some()
        })
        .map(|attr| attr_value(&attr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_shapes_reads_paragraphs_and_levels() {
        let xml = concat!(
            r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 2"/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="10" y="20"/></a:xfrm></p:spPr>"#,
            r#"<p:txBody><a:p><a:r><a:t>Hello &amp; bye</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Body 3"/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:txBody><a:p><a:pPr lvl="1"/><a:r><a:t>one</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:t>two </a:t></a:r><a:br><a:rPr/></a:br><a:r><a:t>lines</a:t></a:r></a:p>"#,
            r#"</p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld></p:sld>"#
        );
        let shapes = DeckReader::new().extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 2);

        assert!(shapes[0].is_title());
        assert_eq!(shapes[0].text(), "Hello & bye");
        assert_eq!((shapes[0].x, shapes[0].y), (10, 20));

        let body = &shapes[1];
        assert_eq!(body.placeholder.as_ref().unwrap().idx, Some(1));
        assert_eq!(body.paragraphs[0].level, Some(1));
        assert_eq!(body.paragraphs[1].text, "two \nlines");
        assert_eq!(body.paragraphs[1].level, None);
    }

    #[test]
    fn test_picture_rel_id_is_captured() {
        let xml = concat!(
            r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree>"#,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="2" name="Background 2"/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>"#,
            r#"</p:spTree></p:cSld></p:sld>"#
        );
        let shapes = DeckReader::new().extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes[0].picture.as_deref(), Some("rId2"));
    }

    #[test]
    fn test_parse_presentation_keeps_list_order() {
        let xml = concat!(
            r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>"#,
            r#"<p:sldId id="257" r:id="rId9"/><p:sldId id="256" r:id="rId3"/>"#,
            r#"</p:sldIdLst><p:sldSz cx="100" cy="50"/></p:presentation>"#
        );
        let (w, h, ids) = DeckReader::new().parse_presentation(xml).unwrap();
        assert_eq!((w, h), (100, 50));
        assert_eq!(ids, vec!["rId9".to_string(), "rId3".to_string()]);
    }
}
