//! Slide layout.
//!
//! Turns a [`DeckSpec`] into document-sink calls: one title slide followed by
//! one content slide per [`SlideSpec`], in deck order. Every region is a
//! fraction of the sink's canvas, so the same deck always produces the same
//! geometry. Only the title-slide subtitle carries the generation date.
//!
//! Content slide layout (fractions of the page):
//!
//! ```text
//! +------------------------------------------------+
//! | heading (x .05, y .04, w .90, h .107)          |
//! |                                                |
//! | image (x .05, y .20,   | bullets (x .52, y .20,|
//! |        w .45)          |          w .43, h .60)|
//! +------------------------------------------------+
//! ```

use crate::error::{AssetError, Diagnostic, Error, Result, SinkError, Stage};
use crate::sink::{
    Alignment, Canvas, DocumentSink, ImagePlacement, ImageSource, Paragraph, ParagraphStyle,
    SlideId, TextFrame,
};
use crate::types::{Color, DeckSpec, SlideSpec, Theme};
use chrono::NaiveDate;

/// Glyph prefixed to every bullet paragraph.
pub const BULLET: &str = "• ";

const TOPIC_SIZE_PT: u32 = 44;
const SUBTITLE_SIZE_PT: u32 = 16;
const HEADING_SIZE_PT: u32 = 32;
const BULLET_SIZE_PT: u32 = 14;
const BULLET_SPACE_AFTER_PT: u32 = 10;

/// Fractional region as (x, y, width, height).
type Region = (f64, f64, f64, f64);

const TOPIC_REGION: Region = (0.10, 1.0 / 3.0, 0.80, 0.20);
const SUBTITLE_REGION: Region = (0.10, 0.56, 0.80, 1.0 / 15.0);
const HEADING_REGION: Region = (0.05, 0.04, 0.90, 0.8 / 7.5);
const BODY_REGION: Region = (0.52, 0.20, 0.43, 0.60);

/// Image origin and width; height follows the image.
const IMAGE_X: f64 = 0.05;
const IMAGE_Y: f64 = 0.20;
const IMAGE_WIDTH: f64 = 0.45;

/// Outcome of a successful assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    /// Slides emitted, title slide included.
    pub slides_emitted: usize,

    /// Non-fatal problems, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lays decks out onto a document sink.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    generated_on: NaiveDate,
}

impl LayoutEngine {
    /// Create an engine that stamps title slides with the given date.
    pub fn new(generated_on: NaiveDate) -> Self {
        Self { generated_on }
    }

    /// Emit the title slide and every content slide of `deck` into `sink`.
    ///
    /// Image problems are recorded in the report; only sink failures on
    /// slides or text boxes abort assembly.
    pub fn assemble<S: DocumentSink + ?Sized>(
        &self,
        sink: &mut S,
        deck: &DeckSpec,
        images: &dyn ImageSource,
    ) -> Result<AssemblyReport> {
        let canvas = sink.canvas();
        let mut report = AssemblyReport::default();

        self.title_slide(sink, canvas, deck).map_err(sink_error)?;
        report.slides_emitted += 1;
        log::debug!("Title slide created for '{}'", deck.topic);

        for (i, slide) in deck.slides.iter().enumerate() {
            let number = i + 1;
            self.content_slide(sink, canvas, &deck.theme, slide, number, images, &mut report)
                .map_err(sink_error)?;
            report.slides_emitted += 1;
            log::debug!("Slide {} created: {}", number, slide.title);
        }

        log::info!(
            "Assembled {} slides ({} diagnostics)",
            report.slides_emitted,
            report.diagnostics.len()
        );
        Ok(report)
    }

    fn title_slide<S: DocumentSink + ?Sized>(
        &self,
        sink: &mut S,
        canvas: Canvas,
        deck: &DeckSpec,
    ) -> std::result::Result<(), SinkError> {
        let slide = sink.add_slide()?;

        let topic = Paragraph::new(
            deck.topic.as_str(),
            ParagraphStyle {
                size_pt: TOPIC_SIZE_PT,
                bold: true,
                color: deck.theme.primary_color,
                alignment: Alignment::Center,
                space_after_pt: None,
            },
        );
        sink.add_text_box(slide, frame(canvas, TOPIC_REGION, vec![topic]))?;

        let subtitle = Paragraph::new(
            self.subtitle(),
            ParagraphStyle {
                size_pt: SUBTITLE_SIZE_PT,
                bold: false,
                color: deck.theme.secondary_color,
                alignment: Alignment::Center,
                space_after_pt: None,
            },
        );
        sink.add_text_box(slide, frame(canvas, SUBTITLE_REGION, vec![subtitle]))?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn content_slide<S: DocumentSink + ?Sized>(
        &self,
        sink: &mut S,
        canvas: Canvas,
        theme: &Theme,
        slide_spec: &SlideSpec,
        number: usize,
        images: &dyn ImageSource,
        report: &mut AssemblyReport,
    ) -> std::result::Result<(), SinkError> {
        let slide = sink.add_slide()?;

        let heading = Paragraph::new(
            slide_spec.title.as_str(),
            ParagraphStyle {
                size_pt: HEADING_SIZE_PT,
                bold: true,
                color: theme.primary_color,
                alignment: Alignment::Left,
                space_after_pt: None,
            },
        );
        sink.add_text_box(slide, frame(canvas, HEADING_REGION, vec![heading]))?;

        if let Some(diagnostic) = place_image(sink, canvas, slide, number, images) {
            log::warn!("{}", diagnostic);
            report.diagnostics.push(diagnostic);
        }

        sink.add_text_box(
            slide,
            frame(canvas, BODY_REGION, bullet_paragraphs(&slide_spec.content)),
        )?;

        Ok(())
    }

    fn subtitle(&self) -> String {
        format!("Generated on {}", self.generated_on.format("%Y-%m-%d"))
    }
}

/// One bullet paragraph per content item, in order.
pub fn bullet_paragraphs(content: &[String]) -> Vec<Paragraph> {
    let style = ParagraphStyle {
        size_pt: BULLET_SIZE_PT,
        bold: false,
        color: Color::BODY_TEXT,
        alignment: Alignment::Left,
        space_after_pt: Some(BULLET_SPACE_AFTER_PT),
    };
    content
        .iter()
        .map(|point| Paragraph::new(format!("{}{}", BULLET, point), style))
        .collect()
}

/// Place the slide's image, returning a diagnostic if it could not be.
fn place_image<S: DocumentSink + ?Sized>(
    sink: &mut S,
    canvas: Canvas,
    slide: SlideId,
    number: usize,
    images: &dyn ImageSource,
) -> Option<Diagnostic> {
    let Some(image) = images.lookup(number) else {
        return Some(Diagnostic::Asset(AssetError::Missing {
            slide: number,
            name: images.expected_name(number),
        }));
    };

    let placement = ImagePlacement {
        x: canvas.scale_x(IMAGE_X),
        y: canvas.scale_y(IMAGE_Y),
        width: canvas.scale_x(IMAGE_WIDTH),
    };
    match sink.add_image(slide, &image, placement) {
        Ok(()) => {
            log::debug!("Image added to slide {}: {}", number, image.path.display());
            None
        }
        Err(e) => Some(Diagnostic::Asset(AssetError::Unembeddable {
            slide: number,
            path: image.path.clone(),
            reason: e.to_string(),
        })),
    }
}

fn frame(canvas: Canvas, region: Region, paragraphs: Vec<Paragraph>) -> TextFrame {
    let (x, y, width, height) = region;
    TextFrame {
        rect: canvas.region(x, y, width, height),
        word_wrap: true,
        paragraphs,
    }
}

fn sink_error(source: SinkError) -> Error {
    Error::Sink {
        stage: Stage::Assemble,
        source,
    }
}
