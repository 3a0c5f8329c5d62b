//! Uploaded theme documents: reading their layouts and carrying their
//! masters, layouts and media into an export.
//!
//! A theme document is any presentation package. Its slides are discarded;
//! everything else (masters, layouts, themes, media, properties) is copied
//! through and the exported slides are grafted onto it.

use crate::opc::{
    attr_value, local_name, ns, prefix_of, rels_part_for, resolve_target, ContentTypes,
    Relationships,
};
use crate::template::{slide_id_list_xml, view_props_xml, PRESENTATION_PART};
use deck_core::{
    Error, LayoutInfo, PlaceholderInfo, Result, ThemeDocument, DEFAULT_SLIDE_HEIGHT,
    DEFAULT_SLIDE_WIDTH,
};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, Write};
use zip::ZipArchive;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Folders whose parts belong to the document's own slides.
const SLIDE_FOLDERS: [&str; 3] = ["ppt/slides/", "ppt/notesSlides/", "ppt/comments/"];

/// Images, audio and video; kept only while a kept part references them.
pub const MEDIA_FOLDER: &str = "ppt/media/";

/// Children of `<p:presentation>` that reference the dropped slides.
const SLIDE_LISTS: [&[u8]; 3] = [b"sldIdLst", b"custShowLst", b"sectionLst"];

/// Read an uploaded presentation and describe its first master's layouts.
pub fn read_theme_document(name: &str, data: Vec<u8>) -> Result<ThemeDocument> {
    let invalid = |message: String| Error::theme_document(name, message);

    let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))
        .map_err(|e| invalid(format!("not a ZIP package: {}", e)))?;

    let presentation = read_optional_part(&mut archive, PRESENTATION_PART)?
        .ok_or_else(|| invalid("missing ppt/presentation.xml".to_string()))?;
    let summary = PresentationSummary::parse(&presentation)?;

    let master_rel_id = summary
        .master_rel_id
        .ok_or_else(|| invalid("no slide master".to_string()))?;
    let pres_rels = read_optional_part(&mut archive, PRESENTATION_RELS_PART)?
        .map(|xml| Relationships::parse(&xml))
        .transpose()?
        .unwrap_or_default();
    let master_part = pres_rels
        .by_id(&master_rel_id)
        .map(|rel| resolve_target(PRESENTATION_PART, &rel.target))
        .ok_or_else(|| {
            invalid(format!("slide master relationship '{}' not found", master_rel_id))
        })?;

    let master = read_optional_part(&mut archive, &master_part)?
        .ok_or_else(|| invalid(format!("missing {}", master_part)))?;
    let master_rels = read_optional_part(&mut archive, &rels_part_for(&master_part))?
        .map(|xml| Relationships::parse(&xml))
        .transpose()?
        .unwrap_or_default();

    let mut layouts = Vec::new();
    for rel_id in layout_rel_ids(&master)? {
        let Some(rel) = master_rels.by_id(&rel_id) else {
            log::warn!("Theme '{}': layout relationship '{}' not found", name, rel_id);
            continue;
        };
        let part_name = resolve_target(&master_part, &rel.target);
        match read_optional_part(&mut archive, &part_name)? {
            Some(xml) => layouts.push(parse_layout(&part_name, &xml)?),
            None => log::warn!("Theme '{}': missing layout part {}", name, part_name),
        }
    }

    if layouts.is_empty() {
        return Err(invalid("slide master has no layouts".to_string()));
    }
    drop(archive);

    log::debug!(
        "Theme '{}': {} layouts, page {}x{} EMU",
        name,
        layouts.len(),
        summary.width,
        summary.height
    );

    Ok(ThemeDocument {
        name: name.to_string(),
        data,
        slide_width: summary.width,
        slide_height: summary.height,
        layouts,
    })
}

/// The parts of a theme document an export builds on.
#[derive(Debug)]
pub struct BaseParts {
    /// Parts copied through unchanged, in archive order.
    pub parts: Vec<(String, Vec<u8>)>,
    /// `ppt/presentation.xml`, still listing the document's own slides.
    pub presentation_xml: String,
    /// Presentation relationships with slide relationships removed.
    pub presentation_rels: Relationships,
    /// Content types with slide overrides removed.
    pub content_types: ContentTypes,
}

impl BaseParts {
    /// Split a theme document into reusable parts, dropping its slides and
    /// the media only those slides used.
    pub fn open(doc: &ThemeDocument) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(doc.data.as_slice()))
            .map_err(|e| Error::theme_document(&doc.name, format!("not a ZIP package: {}", e)))?;

        let presentation_xml = read_optional_part(&mut archive, PRESENTATION_PART)?
            .ok_or_else(|| Error::theme_document(&doc.name, "missing ppt/presentation.xml"))?;

        let mut presentation_rels = read_optional_part(&mut archive, PRESENTATION_RELS_PART)?
            .map(|xml| Relationships::parse(&xml))
            .transpose()?
            .unwrap_or_default();
        presentation_rels.retain(|rel| rel.rel_type != ns::REL_SLIDE);

        let view_props = presentation_rels
            .iter()
            .find(|rel| rel.rel_type == ns::REL_VIEW_PROPS)
            .map(|rel| resolve_target(PRESENTATION_PART, &rel.target));

        let mut content_types = match read_optional_part(&mut archive, CONTENT_TYPES_PART)? {
            Some(xml) => ContentTypes::parse(&xml)?,
            None => ContentTypes::new(),
        };
        content_types.retain_overrides(|part| {
            let part = part.trim_start_matches('/');
            !SLIDE_FOLDERS.iter().any(|folder| part.starts_with(folder))
        });

        let mut referenced: HashSet<String> = presentation_rels
            .iter()
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(PRESENTATION_PART, &rel.target))
            .collect();

        let mut parts = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            if is_replaced_part(&name) {
                continue;
            }

            if view_props.as_deref() == Some(name.as_str()) {
                // may list the dropped slides in outline view
                parts.push((name, view_props_xml().into_bytes()));
                continue;
            }
            if let Some(ref view_props) = view_props {
                if name == rels_part_for(view_props) {
                    continue;
                }
            }

            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

            if name.ends_with(".rels") {
                let (kept, targets) = drop_slide_relationships(&name, &data)?;
                data = kept;
                referenced.extend(targets);
            }

            parts.push((name, data));
        }

        let mut orphans = HashSet::new();
        parts.retain(|(name, _)| {
            let keep = !name.starts_with(MEDIA_FOLDER) || referenced.contains(name);
            if !keep {
                orphans.insert(name.clone());
            }
            keep
        });
        if !orphans.is_empty() {
            log::debug!(
                "Theme '{}': dropped {} media parts used only by its slides",
                doc.name,
                orphans.len()
            );
            content_types.retain_overrides(|part| !orphans.contains(part.trim_start_matches('/')));
        }

        Ok(Self {
            parts,
            presentation_xml,
            presentation_rels,
            content_types,
        })
    }
}

/// Whether the export writes its own version of this part.
fn is_replaced_part(name: &str) -> bool {
    name == CONTENT_TYPES_PART
        || name == PRESENTATION_PART
        || name == PRESENTATION_RELS_PART
        || SLIDE_FOLDERS.iter().any(|folder| name.starts_with(folder))
}

/// Remove relationships pointing into the dropped slide folders.
///
/// Returns the part to write and the parts its remaining internal
/// relationships point to.
fn drop_slide_relationships(rels_part: &str, data: &[u8]) -> Result<(Vec<u8>, Vec<String>)> {
    let xml = String::from_utf8_lossy(data);
    let mut rels = Relationships::parse(&xml)?;
    let before = rels.len();

    let source = source_part_of(rels_part);
    rels.retain(|rel| {
        if rel.external {
            return true;
        }
        let target = resolve_target(&source, &rel.target);
        !SLIDE_FOLDERS.iter().any(|folder| target.starts_with(folder))
    });

    let targets = rels
        .iter()
        .filter(|rel| !rel.external)
        .map(|rel| resolve_target(&source, &rel.target))
        .collect();

    if rels.len() == before {
        return Ok((data.to_vec(), targets));
    }
    Ok((rels.to_xml().into_bytes(), targets))
}

/// The part a `.rels` part describes (`ppt/_rels/a.xml.rels` → `ppt/a.xml`).
fn source_part_of(rels_part: &str) -> String {
    let (dir, file) = rels_part.rsplit_once('/').unwrap_or(("", rels_part));
    let file = file.strip_suffix(".rels").unwrap_or(file);
    let dir = dir.strip_suffix("_rels").unwrap_or(dir).trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Replace the slide list of a presentation part.
///
/// Drops the existing `sldIdLst`, custom shows and sections, and inserts a new
/// `sldIdLst` for `slides` right before `sldSz` (or at the end of the root
/// element when there is no `sldSz`). Everything else is kept as written.
pub fn rewrite_presentation_xml(xml: &str, slides: &[(u32, String)]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + slides.len() * 96));

    let mut root_prefix = String::new();
    let mut depth = 0usize;
    let mut skip_depth = 0usize;
    let mut inserted = false;

    let xml_error =
        |e: quick_xml::Error| Error::XmlError(format!("Error rewriting presentation: {}", e));

    loop {
        let event = reader.read_event().map_err(xml_error)?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                let is_start = matches!(event, Event::Start(_));

                if depth == 0 {
                    root_prefix = prefix_of(name.as_ref()).unwrap_or_default();
                }
                if SLIDE_LISTS.contains(&local) {
                    if is_start {
                        skip_depth = 1;
                    }
                    continue;
                }
                if depth == 1 && local == b"sldSz" && !inserted {
                    insert_slide_list(&mut writer, &root_prefix, slides)?;
                    inserted = true;
                }
                if is_start {
                    depth += 1;
                }
            }
            Event::End(_) => {
                if depth == 1 && !inserted {
                    insert_slide_list(&mut writer, &root_prefix, slides)?;
                    inserted = true;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }

        writer.write_event(event).map_err(xml_error)?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::XmlError(format!("Rewritten presentation is not UTF-8: {}", e)))
}

fn insert_slide_list(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    slides: &[(u32, String)],
) -> Result<()> {
    writer
        .get_mut()
        .write_all(slide_id_list_xml(prefix, slides).as_bytes())
        .map_err(Error::from)
}

/// Page size and master reference from `presentation.xml`.
#[derive(Debug)]
struct PresentationSummary {
    width: i64,
    height: i64,
    master_rel_id: Option<String>,
}

impl PresentationSummary {
    fn parse(xml: &str) -> Result<Self> {
        let mut summary = Self {
            width: DEFAULT_SLIDE_WIDTH,
            height: DEFAULT_SLIDE_HEIGHT,
            master_rel_id: None,
        };

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sldSz" => {
                            for attr in e.attributes().flatten() {
                                let value =
                                    attr_value(&attr).parse::<i64>().ok().filter(|v| *v > 0);
                                match (attr.key.as_ref(), value) {
                                    (b"cx", Some(v)) => summary.width = v,
                                    (b"cy", Some(v)) => summary.height = v,
                                    _ => {}
                                }
                            }
                        }
                        b"sldMasterId" if summary.master_rel_id.is_none() => {
                            summary.master_rel_id = relationship_id(e);
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

        Ok(summary)
    }
}

/// Relationship ids of a master's layouts, in `sldLayoutIdLst` order.
fn layout_rel_ids(master_xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(master_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == b"sldLayoutId" =>
            {
                if let Some(id) = relationship_id(e) {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing slide master: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Name and placeholders of one layout part.
fn parse_layout(part_name: &str, xml: &str) -> Result<LayoutInfo> {
    let mut layout = LayoutInfo {
        part_name: part_name.to_string(),
        name: String::new(),
        placeholders: Vec::new(),
    };

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"cSld" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                layout.name = attr_value(&attr);
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
                        layout.placeholders.push(ph);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing layout {}: {}",
                    part_name, e
                )));
            }
            _ => {}
        }
    }

    Ok(layout)
}

/// The `r:id` attribute of an element, whatever its prefix.
fn relationship_id(e: &quick_xml::events::BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            let key = attr.key.as_ref();
            local_name(key) == b"id" && prefix_of(key).is_some()
        })
        .map(|attr| attr_value(&attr))
}

/// Read a part as text, or `None` when the archive lacks it.
fn read_optional_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(Error::ZipError(format!("Failed to open '{}': {}", path, e)));
        }
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(Some(content))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A small hand-written theme document with a title layout and a
    //! title-and-content layout.

    use crate::opc::{content_type, ns, ContentTypes, Relationships};
    use crate::package::PackageWriter;

    const PML: &str = concat!(
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
    );

    fn layout(name: &str, placeholders: &str) -> String {
        format!(
            r#"<p:sldLayout {}><p:cSld name="{}"><p:spTree>{}</p:spTree></p:cSld></p:sldLayout>"#,
            PML, name, placeholders
        )
    }

    fn placeholder(id: u32, ph: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="ph {}"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
            id, id, ph
        )
    }

    /// Build the package. `layouts` limits how many layouts the master lists.
    pub fn theme_package(layouts: usize) -> Vec<u8> {
        let mut package = PackageWriter::new();

        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.add_override("ppt/presentation.xml", content_type::PRESENTATION);
        types.add_override("ppt/slideMasters/slideMaster1.xml", content_type::SLIDE_MASTER);
        types.add_override("ppt/slides/slide1.xml", content_type::SLIDE);
        types.add_override("ppt/theme/theme1.xml", content_type::THEME);

        let mut root = Relationships::new();
        root.add("rId1", ns::REL_OFFICE_DOCUMENT, "ppt/presentation.xml");

        let mut pres_rels = Relationships::new();
        pres_rels.add("rId1", ns::REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        pres_rels.add("rId2", ns::REL_SLIDE, "slides/slide1.xml");
        pres_rels.add("rId3", ns::REL_THEME, "theme/theme1.xml");

        let presentation = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<p:presentation {}>"#,
                r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
                r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#,
                r#"<p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/>"#,
                r#"</p:presentation>"#
            ),
            PML
        );

        let mut master_rels = Relationships::new();
        let mut layout_ids = String::new();
        for n in 1..=layouts {
            master_rels.add(
                format!("rId{}", n),
                ns::REL_SLIDE_LAYOUT,
                format!("../slideLayouts/slideLayout{}.xml", n),
            );
            layout_ids.push_str(&format!(
                r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#,
                2147483648u32 + n as u32,
                n
            ));
        }
        master_rels.add(format!("rId{}", layouts + 1), ns::REL_THEME, "../theme/theme1.xml");
        master_rels.add(format!("rId{}", layouts + 2), ns::REL_IMAGE, "../media/logo.png");
        let master = format!(
            r#"<p:sldMaster {}><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
            PML, layout_ids
        );

        package.add_xml("[Content_Types].xml", &types.to_xml()).unwrap();
        package.add_xml("_rels/.rels", &root.to_xml()).unwrap();
        package.add_xml("ppt/presentation.xml", &presentation).unwrap();
        package
            .add_xml("ppt/_rels/presentation.xml.rels", &pres_rels.to_xml())
            .unwrap();
        package
            .add_xml("ppt/slideMasters/slideMaster1.xml", &master)
            .unwrap();
        package
            .add_xml(
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                &master_rels.to_xml(),
            )
            .unwrap();

        let all_layouts = [
            layout(
                "Title Slide",
                &(placeholder(2, r#"<p:ph type="ctrTitle"/>"#)
                    + &placeholder(3, r#"<p:ph type="subTitle" idx="1"/>"#)),
            ),
            layout(
                "Title and Content",
                &(placeholder(2, r#"<p:ph type="title"/>"#)
                    + &placeholder(3, r#"<p:ph idx="1"/>"#)),
            ),
        ];
        for (n, xml) in all_layouts.iter().take(layouts).enumerate() {
            package
                .add_xml(&format!("ppt/slideLayouts/slideLayout{}.xml", n + 1), xml)
                .unwrap();
        }

        package
            .add_xml(
                "ppt/theme/theme1.xml",
                r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Uploaded"/>"#,
            )
            .unwrap();
        package
            .add_xml(
                "ppt/slides/slide1.xml",
                &format!(r#"<p:sld {}><p:cSld><p:spTree/></p:cSld></p:sld>"#, PML),
            )
            .unwrap();
        let mut slide_rels = Relationships::new();
        slide_rels.add("rId1", ns::REL_IMAGE, "../media/photo.png");
        package
            .add_xml("ppt/slides/_rels/slide1.xml.rels", &slide_rels.to_xml())
            .unwrap();
        package.add_part("ppt/media/logo.png", &[0x89, 0x50, 0x4E, 0x47]).unwrap();
        package.add_part("ppt/media/photo.png", &[0x89, 0x50, 0x4E, 0x47]).unwrap();

        package.finish().unwrap()
    }
}
