//! Text outline of an existing PPTX file.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(String),

    #[error("XML error in '{part}': {reason}")]
    Xml { part: String, reason: String },

    #[error("Slide relationship '{0}' has no target")]
    DanglingSlide(String),
}

/// Shapes of one slide, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideOutline {
    /// 1-based position in the presentation.
    pub number: usize,
    /// Paragraph texts of each text body.
    pub text_boxes: Vec<Vec<String>>,
    pub picture_count: usize,
}

impl SlideOutline {
    /// Every paragraph on the slide, text bodies concatenated.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.text_boxes.iter().flatten().map(String::as_str)
    }
}

/// Slide-by-slide outline of a presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PptxOutline {
    pub slides: Vec<SlideOutline>,
}

impl PptxOutline {
    /// Outline the presentation at `path`.
    pub fn open(path: &Path) -> Result<Self, OutlineError> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Outline a presentation read from a seekable stream.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self, OutlineError> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| OutlineError::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut slides = Vec::new();
        for (idx, part) in slide_order(&mut archive)?.iter().enumerate() {
            let content = read_part(&mut archive, part)?;
            let mut slide = outline_slide(&content, part)?;
            slide.number = idx + 1;
            slides.push(slide);
        }

        Ok(Self { slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// Slide part names in presentation order.
///
/// The order comes from `p:sldIdLst` in `presentation.xml`; each entry's
/// `r:id` is resolved through the presentation relationships.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, OutlineError> {
    let rels_part = "ppt/_rels/presentation.xml.rels";
    let rels = read_part(archive, rels_part)?;

    let mut targets: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(&rels);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let id = attribute(e, b"Id").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                let full_path = match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("ppt/{}", target),
                };
                targets.insert(id, full_path);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(rels_part, e)),
            _ => {}
        }
    }

    let presentation_part = "ppt/presentation.xml";
    let presentation = read_part(archive, presentation_part)?;
    let mut order = Vec::new();
    let mut reader = Reader::from_str(&presentation);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                let rel_id = attribute(e, b"r:id").unwrap_or_default();
                let part = targets
                    .get(&rel_id)
                    .cloned()
                    .ok_or(OutlineError::DanglingSlide(rel_id))?;
                order.push(part);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(presentation_part, e)),
            _ => {}
        }
    }

    Ok(order)
}

/// Collect text bodies and pictures from one slide part.
fn outline_slide(xml: &str, part: &str) -> Result<SlideOutline, OutlineError> {
    let mut slide = SlideOutline::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current_body: Option<Vec<String>> = None;
    let mut current_paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"txBody" => current_body = Some(Vec::new()),
                b"p" if current_body.is_some() => current_paragraph = Some(String::new()),
                b"t" => in_text = true,
                b"pic" => slide.picture_count += 1,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == b"p" {
                    if let Some(body) = current_body.as_mut() {
                        body.push(String::new());
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let Some(paragraph) = current_paragraph.as_mut() {
                        let text = e.unescape().map_err(|e| xml_error(part, e))?;
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" => {
                    if let (Some(body), Some(paragraph)) =
                        (current_body.as_mut(), current_paragraph.take())
                    {
                        body.push(paragraph);
                    }
                }
                b"txBody" => {
                    if let Some(body) = current_body.take() {
                        slide.text_boxes.push(body);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }

    Ok(slide)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, OutlineError> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| OutlineError::Zip(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn xml_error(part: &str, e: quick_xml::Error) -> OutlineError {
    OutlineError::Xml {
        part: part.to_string(),
        reason: e.to_string(),
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
