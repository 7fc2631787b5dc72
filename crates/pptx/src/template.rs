//! Fixed package parts shared by every generated presentation.
//!
//! One slide master with a single blank layout, one theme and empty
//! presentation properties. Slides only ever use the blank layout.

pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
pub const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
pub const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
pub const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
pub const CT_PRES_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Part names of the fixed parts.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
pub const SLIDE_MASTER_PART: &str = "ppt/slideMasters/slideMaster1.xml";
pub const SLIDE_MASTER_RELS_PART: &str = "ppt/slideMasters/_rels/slideMaster1.xml.rels";
pub const SLIDE_LAYOUT_PART: &str = "ppt/slideLayouts/slideLayout1.xml";
pub const SLIDE_LAYOUT_RELS_PART: &str = "ppt/slideLayouts/_rels/slideLayout1.xml.rels";
pub const THEME_PART: &str = "ppt/theme/theme1.xml";
pub const PRES_PROPS_PART: &str = "ppt/presProps.xml";

/// Empty group-shape header every shape tree starts with.
pub const GROUP_SHAPE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

pub fn package_rels_xml() -> String {
    format!(
        r#"{decl}<Relationships xmlns="{ns}"><Relationship Id="rId1" Type="{rel}" Target="ppt/presentation.xml"/></Relationships>"#,
        decl = XML_DECLARATION,
        ns = NS_PKG_RELS,
        rel = REL_OFFICE_DOCUMENT,
    )
}

pub fn slide_master_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{group}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
            r#"hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>",
            "</p:sldMaster>",
        ),
        decl = XML_DECLARATION,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_SHAPE_HEADER,
    )
}

pub fn slide_master_rels_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="{layout}" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{theme}" Target="../theme/theme1.xml"/>"#,
            "</Relationships>",
        ),
        decl = XML_DECLARATION,
        ns = NS_PKG_RELS,
        layout = REL_SLIDE_LAYOUT,
        theme = REL_THEME,
    )
}

pub fn slide_layout_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>",
        ),
        decl = XML_DECLARATION,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_SHAPE_HEADER,
    )
}

pub fn slide_layout_rels_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="{master}" Target="../slideMasters/slideMaster1.xml"/>"#,
            "</Relationships>",
        ),
        decl = XML_DECLARATION,
        ns = NS_PKG_RELS,
        master = REL_SLIDE_MASTER,
    )
}

pub fn pres_props_xml() -> String {
    format!(
        r#"{decl}<p:presentationPr xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"/>"#,
        decl = XML_DECLARATION,
        a = NS_A,
        r = NS_R,
        p = NS_P,
    )
}

pub fn theme_xml() -> String {
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = |w: u32| format!(r#"<a:ln w="{}">{}</a:ln>"#, w, solid);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        concat!(
            "{decl}",
            r#"<a:theme xmlns:a="{a}" name="Deck">"#,
            "<a:themeElements>",
            r#"<a:clrScheme name="Deck">"#,
            r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2>"#,
            r#"<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="667EEA"/></a:accent1>"#,
            r#"<a:accent2><a:srgbClr val="764BA2"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="F093FB"/></a:accent3>"#,
            r#"<a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>"#,
            r#"<a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink>"#,
            r#"<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
            "</a:clrScheme>",
            r#"<a:fontScheme name="Deck">"#,
            r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            "</a:fontScheme>",
            r#"<a:fmtScheme name="Deck">"#,
            "<a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst>",
            "<a:lnStyleLst>{ln1}{ln2}{ln3}</a:lnStyleLst>",
            "<a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>",
            "<a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst>",
            "</a:fmtScheme>",
            "</a:themeElements>",
            "<a:objectDefaults/><a:extraClrSchemeLst/>",
            "</a:theme>",
        ),
        decl = XML_DECLARATION,
        a = NS_A,
        solid = solid,
        ln1 = line(6350),
        ln2 = line(12700),
        ln3 = line(19050),
        effect = effect,
    )
}
