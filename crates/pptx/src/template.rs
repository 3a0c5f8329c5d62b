//! Built-in package parts for decks exported without a theme document.
//!
//! The built-in package has one slide master with a single blank layout and a
//! theme whose colors and fonts follow the chosen [`TemplateChoice`]. Slide
//! content is positioned with explicit text boxes rather than placeholders.

use crate::opc::{escape_xml, ns, XML_DECLARATION};
use deck_core::TemplateChoice;
use std::fmt::Write as FmtWrite;

pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const SLIDE_MASTER_PART: &str = "ppt/slideMasters/slideMaster1.xml";
pub const BLANK_LAYOUT_PART: &str = "ppt/slideLayouts/slideLayout1.xml";
pub const THEME_PART: &str = "ppt/theme/theme1.xml";
pub const PRES_PROPS_PART: &str = "ppt/presProps.xml";
pub const VIEW_PROPS_PART: &str = "ppt/viewProps.xml";
pub const TABLE_STYLES_PART: &str = "ppt/tableStyles.xml";
pub const CORE_PROPS_PART: &str = "docProps/core.xml";
pub const APP_PROPS_PART: &str = "docProps/app.xml";

/// Root element attributes shared by PresentationML parts.
const PML_NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

/// Empty group-shape header every shape tree starts with.
pub const SHAPE_TREE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

/// Generate presentation.xml.
///
/// `slides` holds `(slide id, relationship id)` pairs in presentation order.
/// The master is always `rId1`.
pub fn presentation_xml(slides: &[(u32, String)], width: i64, height: i64) -> String {
    let mut xml = String::with_capacity(1024 + slides.len() * 48);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, PML_NAMESPACES);
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    xml.push_str(&slide_id_list_xml("p", slides));
    let _ = write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, width, height);
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str(r#"<p:defaultTextStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:defaultTextStyle>"#);
    xml.push_str("</p:presentation>");
    xml
}

/// Generate a `<sldIdLst>` element using the given namespace prefix.
///
/// Returns an empty string when there are no slides, as the element must not
/// be empty.
pub fn slide_id_list_xml(prefix: &str, slides: &[(u32, String)]) -> String {
    if slides.is_empty() {
        return String::new();
    }

    let qualify = |local: &str| {
        if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        }
    };

    let mut xml = String::with_capacity(32 + slides.len() * 96);
    let _ = write!(xml, "<{}>", qualify("sldIdLst"));
    for (id, rel_id) in slides {
        let _ = write!(
            xml,
            r#"<{} xmlns:r="{}" id="{}" r:id="{}"/>"#,
            qualify("sldId"),
            ns::RELATIONSHIPS,
            id,
            escape_xml(rel_id)
        );
    }
    let _ = write!(xml, "</{}>", qualify("sldIdLst"));
    xml
}

/// Generate the slide master. Its layout is `rId1`, its theme `rId2`.
pub fn slide_master_xml(choice: TemplateChoice) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, "<p:sldMaster {}>", PML_NAMESPACES);
    xml.push_str("<p:cSld>");
    let _ = write!(
        xml,
        r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        choice.background().to_hex()
    );
    xml.push_str("<p:spTree>");
    xml.push_str(SHAPE_TREE_HEADER);
    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
        r#"hlink="hlink" folHlink="folHlink"/>"#
    ));
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("<p:txStyles>");
    let _ = write!(
        xml,
        r#"<p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="{}" b="1"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#,
        choice.title_size() * 100
    );
    xml.push_str(concat!(
        r#"<p:bodyStyle><a:lvl1pPr marL="0" indent="0"><a:buNone/><a:defRPr sz="2000">"#,
        r#"<a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr>"#,
        r#"<a:lvl2pPr marL="742950" indent="-285750"><a:buChar char="&#8226;"/><a:defRPr sz="2000">"#,
        r#"<a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl2pPr>"#,
        r#"</p:bodyStyle>"#,
        r#"<p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:otherStyle>"#
    ));
    xml.push_str("</p:txStyles>");
    xml.push_str("</p:sldMaster>");
    xml
}

/// Generate the blank slide layout.
pub fn blank_layout_xml() -> String {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, r#"<p:sldLayout {} type="blank" preserve="1">"#, PML_NAMESPACES);
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(SHAPE_TREE_HEADER);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

/// Generate theme1.xml with colors and fonts for the template.
pub fn theme_xml(choice: TemplateChoice) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    let _ = write!(
        xml,
        r#"<a:theme xmlns:a="{}" name="{}">"#,
        ns::DRAWINGML,
        choice.name()
    );
    xml.push_str("<a:themeElements>");

    let _ = write!(xml, r#"<a:clrScheme name="{}">"#, choice.name());
    let _ = write!(xml, r#"<a:dk1><a:srgbClr val="{}"/></a:dk1>"#, choice.text_color().to_hex());
    let _ = write!(xml, r#"<a:lt1><a:srgbClr val="{}"/></a:lt1>"#, choice.background().to_hex());
    xml.push_str(r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2>"#);
    xml.push_str(r#"<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#);
    let _ = write!(
        xml,
        r#"<a:accent1><a:srgbClr val="{}"/></a:accent1>"#,
        choice.accent().to_hex()
    );
    xml.push_str(concat!(
        r#"<a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
        r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>"#,
        r#"<a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
        r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>"#,
        r#"<a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
        r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink>"#,
        r#"<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
        "</a:clrScheme>"
    ));

    let _ = write!(
        xml,
        concat!(
            r#"<a:fontScheme name="{0}">"#,
            r#"<a:majorFont><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            "</a:fontScheme>"
        ),
        choice.name(),
        choice.typeface()
    );

    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        let _ = write!(
            xml,
            r#"<a:ln w="{}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            width
        );
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements>");
    xml.push_str("<a:objectDefaults/><a:extraClrSchemeLst/>");
    xml.push_str("</a:theme>");
    xml
}

/// Generate presProps.xml.
pub fn pres_props_xml() -> String {
    format!("{}<p:presentationPr {}/>", XML_DECLARATION, PML_NAMESPACES)
}

/// Generate viewProps.xml.
pub fn view_props_xml() -> String {
    format!(
        "{}<p:viewPr {}><p:gridSpacing cx=\"76200\" cy=\"76200\"/></p:viewPr>",
        XML_DECLARATION, PML_NAMESPACES
    )
}

/// Generate tableStyles.xml.
pub fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECLARATION,
        ns::DRAWINGML
    )
}

/// Generate docProps/core.xml carrying the deck title.
pub fn core_props_xml(title: &str) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECLARATION);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
        r#"xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));
    if !title.is_empty() {
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape_xml(title));
    }
    xml.push_str("<cp:revision>1</cp:revision>");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Generate docProps/app.xml carrying the slide count.
pub fn app_props_xml(slide_count: usize) -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>{}</Application><Slides>{}</Slides>",
            "</Properties>"
        ),
        XML_DECLARATION,
        env!("CARGO_PKG_NAME"),
        slide_count
    )
}
