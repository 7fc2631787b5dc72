//! PPTX (Office Open XML) backend for generated decks.
//!
//! [`PptxDocument`] is a [`deckgen_core::DocumentSink`] that writes a
//! PresentationML package. [`PptxOutline`] reads the text back out of one.

pub mod reader;
pub mod template;
pub mod writer;

pub use reader::{OutlineError, PptxOutline, SlideOutline};
pub use writer::PptxDocument;
