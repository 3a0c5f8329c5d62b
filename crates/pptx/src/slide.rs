//! Slide XML generation.

use crate::opc::{escape_xml, XML_DECLARATION};
use crate::template::SHAPE_TREE_HEADER;
use deck_core::{FontColor, PlaceholderInfo};
use std::fmt::Write as FmtWrite;

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// A rectangle in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    pub const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }
}

/// Where a text shape gets its geometry from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFrame {
    /// A free text box at an explicit position.
    Box(Rect),
    /// A layout placeholder; position and styling are inherited.
    Placeholder(PlaceholderInfo),
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One paragraph of a text shape.
///
/// Newlines inside `text` become line breaks within the paragraph, never
/// new paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    /// Bullet indent level; `None` for plain paragraphs.
    pub bullet_level: Option<u32>,
    pub align: Option<Align>,
    /// Font size in points.
    pub size: Option<u32>,
    pub bold: bool,
}

impl Paragraph {
    /// A plain paragraph.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bullet_level: None,
            align: None,
            size: None,
            bold: false,
        }
    }

    /// A bullet item at the given indent level.
    pub fn bullet(text: impl Into<String>, level: u32) -> Self {
        Self {
            bullet_level: Some(level),
            ..Self::plain(text)
        }
    }

    pub fn with_size(mut self, points: u32) -> Self {
        self.size = Some(points);
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }
}

/// Run properties applied to every run on the slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub color: Option<FontColor>,
    pub typeface: Option<String>,
}

/// Builds the XML of one slide, shape by shape, in z-order.
#[derive(Debug)]
pub struct SlideBuilder {
    style: RunStyle,
    shapes: String,
    next_shape_id: u32,
}

impl SlideBuilder {
    /// Start an empty slide.
    pub fn new(style: RunStyle) -> Self {
        Self {
            style,
            shapes: String::with_capacity(2048),
            // 1 is the shape tree itself
            next_shape_id: 2,
        }
    }

    /// Add a picture covering `rect`, referencing an image relationship.
    pub fn add_picture(&mut self, name: &str, description: &str, rel_id: &str, rect: Rect) {
        let id = self.take_shape_id();
        let xml = &mut self.shapes;

        xml.push_str("<p:pic>");
        xml.push_str("<p:nvPicPr>");
        let _ = write!(
            xml,
            r#"<p:cNvPr id="{}" name="{} {}" descr="{}"/>"#,
            id,
            escape_xml(name),
            id,
            escape_xml(description)
        );
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvPicPr>");

        xml.push_str("<p:blipFill>");
        let _ = write!(xml, r#"<a:blip r:embed="{}"/>"#, escape_xml(rel_id));
        xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
        xml.push_str("</p:blipFill>");

        xml.push_str("<p:spPr>");
        write_xfrm(xml, rect);
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        xml.push_str("</p:spPr>");
        xml.push_str("</p:pic>");
    }

    /// Add a text shape with the given paragraphs.
    pub fn add_text(&mut self, name: &str, frame: &TextFrame, paragraphs: &[Paragraph]) {
        let id = self.take_shape_id();
        let mut xml = String::with_capacity(512);

        xml.push_str("<p:sp>");
        xml.push_str("<p:nvSpPr>");
        let _ = write!(xml, r#"<p:cNvPr id="{}" name="{} {}"/>"#, id, escape_xml(name), id);
        match frame {
            TextFrame::Box(rect) => {
                xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/>"#);
                xml.push_str("</p:nvSpPr>");
                xml.push_str("<p:spPr>");
                write_xfrm(&mut xml, *rect);
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
                xml.push_str("</p:spPr>");
                xml.push_str("<p:txBody>");
                xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr>"#);
            }
            TextFrame::Placeholder(ph) => {
                xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
                xml.push_str("<p:nvPr><p:ph");
                if let Some(ref ph_type) = ph.ph_type {
                    let _ = write!(xml, r#" type="{}""#, escape_xml(ph_type));
                }
                if let Some(idx) = ph.idx {
                    let _ = write!(xml, r#" idx="{}""#, idx);
                }
                xml.push_str("/></p:nvPr>");
                xml.push_str("</p:nvSpPr>");
                xml.push_str("<p:spPr/>");
                xml.push_str("<p:txBody>");
                xml.push_str("<a:bodyPr/>");
            }
        }
        xml.push_str("<a:lstStyle/>");

        if paragraphs.is_empty() {
            // txBody requires at least one paragraph
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        }
        for paragraph in paragraphs {
            self.write_paragraph(&mut xml, frame, paragraph);
        }

        xml.push_str("</p:txBody>");
        xml.push_str("</p:sp>");

        self.shapes.push_str(&xml);
    }

    /// Finish the slide and return its XML.
    pub fn finish(self) -> String {
        let mut xml = String::with_capacity(self.shapes.len() + 1024);
        xml.push_str(XML_DECLARATION);
        xml.push_str(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        );
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        );
        xml.push_str(r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(SHAPE_TREE_HEADER);
        xml.push_str(&self.shapes);
        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        xml
    }

    fn take_shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn write_paragraph(&self, xml: &mut String, frame: &TextFrame, paragraph: &Paragraph) {
        xml.push_str("<a:p>");

        let explicit_bullet =
            matches!(frame, TextFrame::Box(_)) && paragraph.bullet_level.is_some();
        if paragraph.bullet_level.is_some() || paragraph.align.is_some() {
            xml.push_str("<a:pPr");
            if let Some(level) = paragraph.bullet_level {
                if explicit_bullet {
                    let margin = 342_900 * (level as i64 + 1);
                    let _ = write!(xml, r#" marL="{}" indent="-342900""#, margin);
                }
                let _ = write!(xml, r#" lvl="{}""#, level);
            }
            match paragraph.align {
                Some(Align::Center) => xml.push_str(r#" algn="ctr""#),
                Some(Align::Left) => xml.push_str(r#" algn="l""#),
                None => {}
            }
            if explicit_bullet {
                xml.push_str(r#"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#);
            } else {
                xml.push_str("/>");
            }
        }

        let run_props = self.run_properties(paragraph);
        // vertical tab is PowerPoint's soft line break
        for (i, line) in paragraph.text.split(['\n', '\u{000B}']).enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if i > 0 {
                let _ = write!(xml, "<a:br>{}</a:br>", run_props);
            }
            if line.is_empty() {
                continue;
            }
            let _ = write!(xml, "<a:r>{}<a:t>{}</a:t></a:r>", run_props, escape_xml(line));
        }

        let end_props = run_props
            .replacen("<a:rPr", "<a:endParaRPr", 1)
            .replace("</a:rPr>", "</a:endParaRPr>");
        xml.push_str(&end_props);
        xml.push_str("</a:p>");
    }

    fn run_properties(&self, paragraph: &Paragraph) -> String {
        let mut props = String::from(r#"<a:rPr lang="en-US""#);
        if let Some(size) = paragraph.size {
            let _ = write!(props, r#" sz="{}""#, size * 100);
        }
        if paragraph.bold {
            props.push_str(r#" b="1""#);
        }
        props.push_str(r#" dirty="0""#);

        if self.style.color.is_none() && self.style.typeface.is_none() {
            props.push_str("/>");
            return props;
        }

        props.push('>');
        if let Some(color) = self.style.color {
            let _ = write!(
                props,
                r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                color.to_hex()
            );
        }
        if let Some(ref typeface) = self.style.typeface {
            let _ = write!(props, r#"<a:latin typeface="{}"/>"#, escape_xml(typeface));
        }
        props.push_str("</a:rPr>");
        props
    }
}

fn write_xfrm(xml: &mut String, rect: Rect) {
    let _ = write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.x, rect.y, rect.cx, rect.cy
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box() -> TextFrame {
        TextFrame::Box(Rect::new(0, 0, EMU_PER_INCH, EMU_PER_INCH))
    }

    #[test]
    fn test_empty_slide_has_shape_tree() {
        let xml = SlideBuilder::new(RunStyle::default()).finish();
        assert!(xml.contains("<p:spTree>"));
        assert!(xml.contains(r#"<p:cNvPr id="1" name=""/>"#));
    }

    #[test]
    fn test_shape_ids_are_sequential() {
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_picture("Background", "bg", "rId2", Rect::new(0, 0, 10, 10));
        slide.add_text("Title", &text_box(), &[Paragraph::plain("Hi")]);
        let xml = slide.finish();
        assert!(xml.contains(r#"<p:cNvPr id="2" name="Background 2""#));
        assert!(xml.contains(r#"<p:cNvPr id="3" name="Title 3"/>"#));
    }

    #[test]
    fn test_newlines_become_line_breaks() {
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_text("Body", &text_box(), &[Paragraph::plain("hello\nworld")]);
        let xml = slide.finish();

        assert_eq!(xml.matches("<a:p>").count(), 1);
        assert!(xml.contains("<a:t>hello</a:t></a:r><a:br>"));
        assert!(xml.contains("<a:t>world</a:t>"));
    }

    #[test]
    fn test_bullets_in_text_box_get_explicit_bullet_char() {
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_text("Body", &text_box(), &[Paragraph::bullet("a", 1)]);
        let xml = slide.finish();
        assert!(xml.contains(r#"lvl="1""#));
        assert!(xml.contains("<a:buChar"));
    }

    #[test]
    fn test_placeholder_bullets_inherit_style() {
        let ph = PlaceholderInfo {
            ph_type: None,
            idx: Some(1),
        };
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_text("Content", &TextFrame::Placeholder(ph), &[Paragraph::bullet("a", 1)]);
        let xml = slide.finish();
        assert!(xml.contains(r#"<p:ph idx="1"/>"#));
        assert!(xml.contains(r#"<a:pPr lvl="1"/>"#));
        assert!(!xml.contains("<a:buChar"));
    }

    #[test]
    fn test_run_style_applies_color_and_typeface() {
        let style = RunStyle {
            color: Some(FontColor::rgb(0xFF, 0xFF, 0xFF)),
            typeface: Some("Georgia".to_string()),
        };
        let mut slide = SlideBuilder::new(style);
        let title = Paragraph::plain("T").with_size(40).with_bold(true);
        slide.add_text("Title", &text_box(), &[title]);
        let xml = slide.finish();
        assert!(xml.contains(r#"sz="4000" b="1""#));
        assert!(xml.contains(r#"<a:srgbClr val="FFFFFF"/>"#));
        assert!(xml.contains(r#"<a:latin typeface="Georgia"/>"#));
        assert!(xml.contains("<a:endParaRPr"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_text("Body", &text_box(), &[Paragraph::plain("a < b & c")]);
        assert!(slide.finish().contains("<a:t>a &lt; b &amp; c</a:t>"));
    }

    #[test]
    fn test_control_characters_are_not_written() {
        let mut slide = SlideBuilder::new(RunStyle::default());
        slide.add_text("Body", &text_box(), &[Paragraph::plain("one\u{000B}two\u{0001}")]);
        let xml = slide.finish();
        assert!(!xml.chars().any(|c| c < ' ' && c != '\t' && c != '\n' && c != '\r'));
        assert!(xml.contains("<a:t>one</a:t></a:r><a:br>"));
        assert!(xml.contains("<a:t>two</a:t>"));
    }
}
