//! Seams between the layout engine and its collaborators: the document
//! sink that renders slides, and the lookup for per-slide images.

use crate::error::SinkError;
use crate::types::Color;
use std::path::{Path, PathBuf};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Page size of a document, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
}

impl Canvas {
    /// The 10 x 7.5 inch (4:3) page.
    pub const STANDARD: Canvas = Canvas {
        width: 10 * EMU_PER_INCH,
        height: 7 * EMU_PER_INCH + EMU_PER_INCH / 2,
    };

    /// A rectangle given as fractions of the page.
    pub fn region(&self, x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            x: self.scale_x(x),
            y: self.scale_y(y),
            width: self.scale_x(width),
            height: self.scale_y(height),
        }
    }

    /// A fraction of the page width, in EMU.
    pub fn scale_x(&self, fraction: f64) -> i64 {
        (self.width as f64 * fraction).round() as i64
    }

    /// A fraction of the page height, in EMU.
    pub fn scale_y(&self, fraction: f64) -> i64 {
        (self.height as f64 * fraction).round() as i64
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Position and size of a region, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// Character and spacing properties applied to a whole paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    /// Font size in points.
    pub size_pt: u32,
    pub bold: bool,
    pub color: Color,
    pub alignment: Alignment,
    /// Space after the paragraph in points.
    pub space_after_pt: Option<u32>,
}

/// One paragraph of a text box.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: ParagraphStyle,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A text box with its paragraphs in display order.
///
/// The first paragraph fills the frame's implicit first paragraph; an empty
/// list leaves the frame without any text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub rect: Rect,
    pub word_wrap: bool,
    pub paragraphs: Vec<Paragraph>,
}

/// Where to put an image. The sink derives the height from the image's
/// aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlacement {
    pub x: i64,
    pub y: i64,
    pub width: i64,
}

/// Handle of a slide created by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlideId(pub usize);

/// Renders slides into a concrete document format.
pub trait DocumentSink {
    /// Page size that all regions are proportioned to.
    fn canvas(&self) -> Canvas;

    /// Append a slide with a blank layout.
    fn add_slide(&mut self) -> Result<SlideId, SinkError>;

    /// Add a text box to a slide.
    fn add_text_box(&mut self, slide: SlideId, frame: TextFrame) -> Result<(), SinkError>;

    /// Add an image to a slide.
    fn add_image(
        &mut self,
        slide: SlideId,
        image: &ImageResource,
        placement: ImagePlacement,
    ) -> Result<(), SinkError>;

    /// Write the finished document.
    fn save(&mut self, path: &Path) -> Result<(), SinkError>;
}

/// An image available for a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    /// Resource name, e.g. `slide_3.png`.
    pub name: String,
    pub path: PathBuf,
}

/// Looks up the image for a slide by its 1-based number.
pub trait ImageSource {
    fn lookup(&self, slide_number: usize) -> Option<ImageResource>;

    /// Name reported when no image is found.
    fn expected_name(&self, slide_number: usize) -> String {
        format!("slide_{}", slide_number)
    }
}

/// Image extensions tried for each slide, in order.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Images stored as `slide_<N>.<ext>` in one directory.
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    dir: PathBuf,
}

impl ImageDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ImageSource for ImageDirectory {
    fn lookup(&self, slide_number: usize) -> Option<ImageResource> {
        IMAGE_EXTENSIONS.iter().find_map(|ext| {
            let name = format!("slide_{}.{}", slide_number, ext);
            let path = self.dir.join(&name);
            path.is_file().then_some(ImageResource { name, path })
        })
    }

    fn expected_name(&self, slide_number: usize) -> String {
        self.dir
            .join(format!("slide_{}.png", slide_number))
            .display()
            .to_string()
    }
}

/// An image source with no images.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSource for NoImages {
    fn lookup(&self, _slide_number: usize) -> Option<ImageResource> {
        None
    }
}
