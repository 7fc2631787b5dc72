//! Error types for deck generation and assembly.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading a persisted deck.
    Load,
    /// Requesting and extracting a new deck.
    Generate,
    /// Writing a deck snapshot.
    Snapshot,
    /// Laying slides out into the document sink.
    Assemble,
    /// Writing the finished document.
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Generate => "generate",
            Stage::Snapshot => "snapshot",
            Stage::Assemble => "assemble",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

/// Fatal errors that stop a pipeline run.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or placeholder credentials, or a collaborator that was never configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A spec file or output location could not be read or written.
    #[error("[{stage}] failed to access {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reply or persisted deck did not contain a valid deck.
    #[error("[{stage}] {source}")]
    Extraction {
        stage: Stage,
        #[source]
        source: ExtractionError,
    },

    /// The text-completion call itself failed.
    #[error("[{stage}] text completion failed: {source}")]
    RemoteService {
        stage: Stage,
        #[source]
        source: CompletionError,
    },

    /// The document sink rejected an operation.
    #[error("[{stage}] document sink error: {source}")]
    Sink {
        stage: Stage,
        #[source]
        source: SinkError,
    },

    /// A deck could not be serialized for persistence.
    #[error("[{stage}] failed to serialize deck: {source}")]
    Snapshot {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The stage this error was raised in, if it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Configuration(_) => None,
            Error::Io { stage, .. }
            | Error::Extraction { stage, .. }
            | Error::RemoteService { stage, .. }
            | Error::Sink { stage, .. }
            | Error::Snapshot { stage, .. } => Some(*stage),
        }
    }
}

/// Where in a payload a schema violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaLocation {
    /// The top-level object (topic, theme, or the slides array itself).
    Root,
    /// The slide at this 0-based index of `slides`.
    Slide(usize),
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaLocation::Root => f.write_str("deck root"),
            SchemaLocation::Slide(index) => write!(f, "slide index {}", index),
        }
    }
}

/// Errors turning a raw reply into structured deck data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The payload is not parseable JSON. `prefix` holds a bounded head of the reply.
    #[error("malformed payload ({reason}); reply began with: {prefix:?}")]
    MalformedPayload { reason: String, prefix: String },

    /// The payload parsed but has the wrong shape.
    #[error("schema violation at {location}: {reason}")]
    SchemaViolation {
        location: SchemaLocation,
        reason: String,
    },
}

impl ExtractionError {
    /// The offending slide index for slide-level schema violations.
    pub fn slide_index(&self) -> Option<usize> {
        match self {
            ExtractionError::SchemaViolation {
                location: SchemaLocation::Slide(index),
                ..
            } => Some(*index),
            _ => None,
        }
    }
}

/// Errors raised by a text-completion collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but the reply carried no text.
    #[error("reply contained no text")]
    EmptyReply,
}

/// Errors raised by a document sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An image could not be read or decoded.
    #[error("image error: {0}")]
    Image(String),

    /// A slide handle did not refer to a slide of this document.
    #[error("unknown slide {0}")]
    UnknownSlide(usize),

    /// The document package could not be written.
    #[error("package error: {0}")]
    Package(String),
}

/// Non-fatal image problems recorded during assembly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// No image resource exists for the slide.
    #[error("no image found for slide {slide} (looked for {name})")]
    Missing { slide: usize, name: String },

    /// An image exists but the sink could not embed it.
    #[error("image {} for slide {slide} could not be embedded: {reason}", path.display())]
    Unembeddable {
        slide: usize,
        path: PathBuf,
        reason: String,
    },
}

/// A recorded, non-fatal problem. The run still succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An image was missing or could not be embedded.
    Asset(AssetError),

    /// A slide kept its original content because enhancing it failed.
    EnhancementSkipped { slide: usize, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Asset(err) => write!(f, "{}", err),
            Diagnostic::EnhancementSkipped { slide, reason } => {
                write!(f, "slide {} kept its original content: {}", slide, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = [
            Stage::Load,
            Stage::Generate,
            Stage::Snapshot,
            Stage::Assemble,
            Stage::Save,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(names, ["load", "generate", "snapshot", "assemble", "save"]);
    }

    #[test]
    fn test_schema_violation_names_slide_index() {
        let err = ExtractionError::SchemaViolation {
            location: SchemaLocation::Slide(2),
            reason: "missing string field `title`".to_string(),
        };
        assert_eq!(err.slide_index(), Some(2));
        assert!(err.to_string().contains("slide index 2"));
    }

    #[test]
    fn test_error_display_names_stage() {
        let err = Error::Extraction {
            stage: Stage::Generate,
            source: ExtractionError::SchemaViolation {
                location: SchemaLocation::Root,
                reason: "expected an object".to_string(),
            },
        };
        assert_eq!(err.stage(), Some(Stage::Generate));
        assert!(err.to_string().starts_with("[generate]"));
    }
}
