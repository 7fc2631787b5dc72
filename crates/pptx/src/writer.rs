//! PPTX document sink.
//!
//! Slides are kept in memory as a list of shapes and serialized to
//! PresentationML when the document is saved. Pictures are copied into the
//! package as media parts.

use crate::template::{self, XML_DECLARATION};
use deckgen_core::{
    Alignment, Canvas, DocumentSink, ImagePlacement, ImageResource, Paragraph, SinkError, SlideId,
    TextFrame,
};
use quick_xml::escape::escape;
use std::fmt::{self, Write as FmtWrite};
use std::fs::{self, File};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// First `p:sldId` value; PowerPoint requires ids of at least 256.
const FIRST_SLIDE_ID: usize = 256;

/// Relationship ids 1-3 of the presentation part go to master, theme and properties.
const FIRST_SLIDE_REL_ID: usize = 4;

/// An in-memory PowerPoint presentation.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    canvas: Canvas,
    slides: Vec<SlidePart>,
    media: Vec<MediaPart>,
}

#[derive(Debug, Clone, Default)]
struct SlidePart {
    shapes: Vec<Shape>,
}

#[derive(Debug, Clone)]
enum Shape {
    Text(TextFrame),
    Picture {
        /// Index into the document's media parts.
        media: usize,
        description: String,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
}

#[derive(Debug, Clone)]
struct MediaPart {
    data: Vec<u8>,
    extension: &'static str,
}

impl MediaPart {
    fn file_name(&self, index: usize) -> String {
        format!("image{}.{}", index + 1, self.extension)
    }
}

impl PptxDocument {
    /// Create an empty presentation with the standard 10 x 7.5 inch page.
    pub fn new() -> Self {
        Self::with_canvas(Canvas::STANDARD)
    }

    /// Create an empty presentation with a custom page size.
    pub fn with_canvas(canvas: Canvas) -> Self {
        Self {
            canvas,
            slides: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Number of media parts added so far.
    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    fn slide_mut(&mut self, slide: SlideId) -> Result<&mut SlidePart, SinkError> {
        self.slides
            .get_mut(slide.0)
            .ok_or(SinkError::UnknownSlide(slide.0))
    }

    /// Write the whole package to `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), SinkError> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let put = |zip: &mut ZipWriter<W>, name: &str, data: &[u8]| -> Result<(), SinkError> {
            zip.start_file(name, options)
                .map_err(|e| SinkError::Package(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
            Ok(())
        };

        put(&mut zip, "[Content_Types].xml", self.content_types_xml().as_bytes())?;
        put(&mut zip, "_rels/.rels", template::package_rels_xml().as_bytes())?;
        put(
            &mut zip,
            template::PRESENTATION_PART,
            self.presentation_xml().map_err(xml_error)?.as_bytes(),
        )?;
        put(
            &mut zip,
            template::PRESENTATION_RELS_PART,
            self.presentation_rels_xml().map_err(xml_error)?.as_bytes(),
        )?;
        put(&mut zip, template::SLIDE_MASTER_PART, template::slide_master_xml().as_bytes())?;
        put(
            &mut zip,
            template::SLIDE_MASTER_RELS_PART,
            template::slide_master_rels_xml().as_bytes(),
        )?;
        put(&mut zip, template::SLIDE_LAYOUT_PART, template::slide_layout_xml().as_bytes())?;
        put(
            &mut zip,
            template::SLIDE_LAYOUT_RELS_PART,
            template::slide_layout_rels_xml().as_bytes(),
        )?;
        put(&mut zip, template::THEME_PART, template::theme_xml().as_bytes())?;
        put(&mut zip, template::PRES_PROPS_PART, template::pres_props_xml().as_bytes())?;

        for (index, slide) in self.slides.iter().enumerate() {
            let number = index + 1;
            let (xml, rels) = self.slide_xml(slide).map_err(xml_error)?;
            put(&mut zip, &format!("ppt/slides/slide{}.xml", number), xml.as_bytes())?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                rels.as_bytes(),
            )?;
        }

        for (index, media) in self.media.iter().enumerate() {
            put(&mut zip, &format!("ppt/media/{}", media.file_name(index)), &media.data)?;
        }

        zip.finish()
            .map_err(|e| SinkError::Package(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SinkError> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, template::NS_CONTENT_TYPES));
        xml.push_str(&format!(
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            template::CT_RELATIONSHIPS
        ));
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

        let mut extensions: Vec<&str> = self.media.iter().map(|m| m.extension).collect();
        extensions.sort_unstable();
        extensions.dedup();
        for extension in extensions {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="image/{}"/>"#,
                extension, extension
            ));
        }

        let overrides = [
            (template::PRESENTATION_PART, template::CT_PRESENTATION),
            (template::SLIDE_MASTER_PART, template::CT_SLIDE_MASTER),
            (template::SLIDE_LAYOUT_PART, template::CT_SLIDE_LAYOUT),
            (template::THEME_PART, template::CT_THEME),
            (template::PRES_PROPS_PART, template::CT_PRES_PROPS),
        ];
        for (part, content_type) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                part, content_type
            ));
        }
        for number in 1..=self.slides.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
                number,
                template::CT_SLIDE
            ));
        }

        xml.push_str("</Types>");
        xml
    }

    fn presentation_xml(&self) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            template::NS_A,
            template::NS_R,
            template::NS_P
        )?;
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for index in 0..self.slides.len() {
                write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + index,
                    FIRST_SLIDE_REL_ID + index
                )?;
            }
            xml.push_str("</p:sldIdLst>");
        }

        write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            self.canvas.width, self.canvas.height
        )?;
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        Ok(xml)
    }

    fn presentation_rels_xml(&self) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        write!(xml, r#"<Relationships xmlns="{}">"#, template::NS_PKG_RELS)?;
        write!(
            xml,
            r#"<Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
            template::REL_SLIDE_MASTER
        )?;
        write!(
            xml,
            r#"<Relationship Id="rId2" Type="{}" Target="theme/theme1.xml"/>"#,
            template::REL_THEME
        )?;
        write!(
            xml,
            r#"<Relationship Id="rId3" Type="{}" Target="presProps.xml"/>"#,
            template::REL_PRES_PROPS
        )?;
        for index in 0..self.slides.len() {
            write!(
                xml,
                r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                FIRST_SLIDE_REL_ID + index,
                template::REL_SLIDE,
                index + 1
            )?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }

    /// Slide XML and its relationships part.
    fn slide_xml(&self, slide: &SlidePart) -> Result<(String, String), fmt::Error> {
        let mut xml = String::with_capacity(4096);
        let mut rels = String::with_capacity(512);

        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
            template::NS_A,
            template::NS_R,
            template::NS_P
        )?;
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(template::GROUP_SHAPE_HEADER);

        rels.push_str(XML_DECLARATION);
        write!(rels, r#"<Relationships xmlns="{}">"#, template::NS_PKG_RELS)?;
        write!(
            rels,
            r#"<Relationship Id="rId1" Type="{}" Target="../slideLayouts/slideLayout1.xml"/>"#,
            template::REL_SLIDE_LAYOUT
        )?;

        // Shape id 1 is the group shape.
        let mut next_rel = 2;
        for (index, shape) in slide.shapes.iter().enumerate() {
            let shape_id = index + 2;
            match shape {
                Shape::Text(frame) => write_text_box(&mut xml, shape_id, frame)?,
                Shape::Picture {
                    media,
                    description,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let rel_id = format!("rId{}", next_rel);
                    next_rel += 1;
                    write!(
                        rels,
                        r#"<Relationship Id="{}" Type="{}" Target="../media/{}"/>"#,
                        rel_id,
                        template::REL_IMAGE,
                        self.media[*media].file_name(*media)
                    )?;

                    write!(
                        xml,
                        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
                        shape_id,
                        shape_id - 1,
                        xml_text(description)
                    )?;
                    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
                    write!(
                        xml,
                        r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                        rel_id
                    )?;
                    xml.push_str("<p:spPr>");
                    write_xfrm(&mut xml, *x, *y, *width, *height)?;
                    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
                }
            }
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        rels.push_str("</Relationships>");

        Ok((xml, rels))
    }
}

impl Default for PptxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSink for PptxDocument {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn add_slide(&mut self) -> Result<SlideId, SinkError> {
        self.slides.push(SlidePart::default());
        Ok(SlideId(self.slides.len() - 1))
    }

    fn add_text_box(&mut self, slide: SlideId, frame: TextFrame) -> Result<(), SinkError> {
        self.slide_mut(slide)?.shapes.push(Shape::Text(frame));
        Ok(())
    }

    fn add_image(
        &mut self,
        slide: SlideId,
        image: &ImageResource,
        placement: ImagePlacement,
    ) -> Result<(), SinkError> {
        // Validate the slide before reading the file.
        self.slide_mut(slide)?;

        let data = fs::read(&image.path)?;
        let (extension, width_px, height_px) = sniff_image(&data)
            .map_err(|reason| SinkError::Image(format!("{}: {}", image.name, reason)))?;

        let height = placement.width * i64::from(height_px) / i64::from(width_px);
        log::debug!(
            "Embedding {} ({}x{} px, {}) at height {} EMU",
            image.name,
            width_px,
            height_px,
            extension,
            height
        );

        self.media.push(MediaPart { data, extension });
        let media = self.media.len() - 1;
        self.slide_mut(slide)?.shapes.push(Shape::Picture {
            media,
            description: image.name.clone(),
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height,
        });
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), SinkError> {
        let file = File::create(path)?;
        self.write_to(file)?;
        log::debug!("Wrote {} slides to {}", self.slides.len(), path.display());
        Ok(())
    }
}

/// Detect the format and pixel size of an image.
fn sniff_image(data: &[u8]) -> Result<(&'static str, u32, u32), String> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;

    let extension = match reader.format() {
        Some(image::ImageFormat::Png) => "png",
        Some(image::ImageFormat::Jpeg) => "jpeg",
        Some(image::ImageFormat::Gif) => "gif",
        Some(image::ImageFormat::Bmp) => "bmp",
        Some(other) => return Err(format!("unsupported image format {:?}", other)),
        None => return Err("unrecognized image format".to_string()),
    };

    let (width, height) = reader.into_dimensions().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err(format!("degenerate image size {}x{}", width, height));
    }
    Ok((extension, width, height))
}

fn write_xfrm(xml: &mut String, x: i64, y: i64, width: i64, height: i64) -> fmt::Result {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x, y, width, height
    )
}

fn write_text_box(xml: &mut String, shape_id: usize, frame: &TextFrame) -> fmt::Result {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
        shape_id,
        shape_id - 1
    )?;
    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame.rect.x, frame.rect.y, frame.rect.width, frame.rect.height)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);

    let wrap = if frame.word_wrap { "square" } else { "none" };
    write!(xml, r#"<p:txBody><a:bodyPr wrap="{}" rtlCol="0"/><a:lstStyle/>"#, wrap)?;

    // A text body always has at least one paragraph.
    if frame.paragraphs.is_empty() {
        xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
    }
    for paragraph in &frame.paragraphs {
        write_paragraph(xml, paragraph)?;
    }

    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) -> fmt::Result {
    let style = &paragraph.style;
    let algn = match style.alignment {
        Alignment::Left => "l",
        Alignment::Center => "ctr",
    };

    xml.push_str("<a:p>");
    match style.space_after_pt {
        Some(points) => write!(
            xml,
            r#"<a:pPr algn="{}"><a:spcAft><a:spcPts val="{}"/></a:spcAft></a:pPr>"#,
            algn,
            points * 100
        )?,
        None => write!(xml, r#"<a:pPr algn="{}"/>"#, algn)?,
    }

    let mut run_props = format!(r#"lang="en-US" sz="{}""#, style.size_pt * 100);
    if style.bold {
        run_props.push_str(r#" b="1""#);
    }
    let fill = format!(
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        style.color.hex()
    );

    if paragraph.text.is_empty() {
        write!(xml, r#"<a:endParaRPr {} dirty="0">{}</a:endParaRPr>"#, run_props, fill)?;
    } else {
        write!(
            xml,
            r#"<a:r><a:rPr {} dirty="0">{}</a:rPr><a:t>{}</a:t></a:r>"#,
            run_props,
            fill,
            xml_text(&paragraph.text)
        )?;
    }

    xml.push_str("</a:p>");
    Ok(())
}

/// Escape text content, replacing characters XML 1.0 forbids with a space.
fn xml_text(text: &str) -> String {
    let allowed: String = text
        .chars()
        .map(|c| if is_xml_char(c) { c } else { ' ' })
        .collect();
    escape(allowed.as_str()).into_owned()
}

fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{FFFE}' | '\u{FFFF}' => false,
        c => c >= '\u{20}',
    }
}

fn xml_error(e: fmt::Error) -> SinkError {
    SinkError::Package(format!("Failed to build XML: {}", e))
}
