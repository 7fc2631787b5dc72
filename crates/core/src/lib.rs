//! Core of topic-to-deck generation: the deck model, extraction of decks
//! from model replies, slide layout, output naming and the pipeline that
//! ties them together.

pub mod completion;
pub mod error;
pub mod extract;
pub mod layout;
pub mod naming;
pub mod pipeline;
pub mod prompt;
pub mod sink;
pub mod types;

pub use completion::{GenerationParams, TextCompletion};
pub use error::{
    AssetError, CompletionError, Diagnostic, Error, ExtractionError, Result, SchemaLocation,
    SinkError, Stage,
};
pub use extract::{extract_deck, extract_slide_patch, parse_deck};
pub use layout::{AssemblyReport, LayoutEngine};
pub use naming::output_file_name;
pub use pipeline::{load_deck, Mode, Pipeline, PipelineConfig, RunReport};
pub use sink::{
    Alignment, Canvas, DocumentSink, ImageDirectory, ImagePlacement, ImageResource, ImageSource,
    NoImages, Paragraph, ParagraphStyle, Rect, SlideId, TextFrame,
};
pub use types::{Color, DeckSpec, SlidePatch, SlideSpec, Theme};
