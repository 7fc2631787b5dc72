//! Pipeline orchestration: request content, extract, assemble, save.
//!
//! A run is selected by [`Mode`]. Every run starts from scratch: it loads or
//! requests its deck, lays it out into the sink it was given and saves the
//! document under a name derived from the topic. Nothing is cached between
//! runs.

use crate::completion::{GenerationParams, TextCompletion};
use crate::error::{Diagnostic, Error, Result, Stage};
use crate::extract::{extract_deck, extract_slide_patch, parse_deck};
use crate::layout::LayoutEngine;
use crate::naming::{output_file_name, snapshot_file_name};
use crate::prompt::{deck_prompt, enhance_prompt};
use crate::sink::{DocumentSink, ImageSource, NoImages};
use crate::types::{DeckSpec, SlideSpec};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of slides requested in generate mode.
pub const DEFAULT_SLIDE_COUNT: usize = 10;

/// What a pipeline run does before assembling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Assemble a persisted deck as-is.
    Load { spec_path: PathBuf },

    /// Ask the service for a new deck on `topic`.
    Generate { topic: String, slide_count: usize },

    /// Ask the service to improve every slide of a persisted deck.
    Enhance { spec_path: PathBuf },
}

impl Mode {
    /// Short name, also used to tag snapshot files.
    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Load { .. } => "loaded",
            Mode::Generate { .. } => "generated",
            Mode::Enhance { .. } => "enhanced",
        }
    }

    /// Whether this mode calls the text-completion service.
    pub fn needs_completion(&self) -> bool {
        !matches!(self, Mode::Load { .. })
    }
}

/// Where a pipeline writes its files.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for finished documents.
    pub output_dir: PathBuf,

    /// Directory for deck snapshots of generate/enhance runs.
    pub snapshot_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            snapshot_dir: PathBuf::from("."),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub topic: String,

    /// Theme style of the assembled deck.
    pub style: String,

    /// The saved document.
    pub output_path: PathBuf,

    /// The deck snapshot, for modes that write one.
    pub snapshot_path: Option<PathBuf>,

    /// Slides in the document, title slide included.
    pub slide_count: usize,

    /// Non-fatal problems from enhancement and assembly.
    pub diagnostics: Vec<Diagnostic>,
}

/// Sequences one run of deck generation.
pub struct Pipeline {
    config: PipelineConfig,
    completion: Option<Box<dyn TextCompletion>>,
    images: Box<dyn ImageSource>,
    clock: fn() -> NaiveDateTime,
}

impl Pipeline {
    /// Create a pipeline without a completion client and without images.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            completion: None,
            images: Box::new(NoImages),
            clock: local_now,
        }
    }

    /// Use a configured text-completion client.
    pub fn with_completion(mut self, completion: Box<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Look slide images up in `images`.
    pub fn with_images(mut self, images: Box<dyn ImageSource>) -> Self {
        self.images = images;
        self
    }

    /// Replace the clock used for subtitles and snapshot names.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Run `mode` and save the document through `sink`.
    pub fn run<S: DocumentSink + ?Sized>(&self, mode: &Mode, sink: &mut S) -> Result<RunReport> {
        if mode.needs_completion() && self.completion.is_none() {
            return Err(Error::Configuration(format!(
                "{} mode needs a text-completion client",
                mode.tag()
            )));
        }

        let now = (self.clock)();
        let mut diagnostics = Vec::new();

        let (deck, snapshot_path) = match mode {
            Mode::Load { spec_path } => (load_deck(spec_path)?, None),
            Mode::Generate { topic, slide_count } => {
                let deck = self.generate(topic, *slide_count)?;
                let snapshot = self.persist(&deck, mode.tag(), now)?;
                (deck, Some(snapshot))
            }
            Mode::Enhance { spec_path } => {
                let deck = self.enhance(load_deck(spec_path)?, &mut diagnostics)?;
                let snapshot = self.persist(&deck, mode.tag(), now)?;
                (deck, Some(snapshot))
            }
        };

        let engine = LayoutEngine::new(now.date());
        let assembly = engine.assemble(sink, &deck, self.images.as_ref())?;
        diagnostics.extend(assembly.diagnostics);

        let output_path = self.save(sink, &deck)?;
        log::info!("Saved {} slides to {}", assembly.slides_emitted, output_path.display());

        Ok(RunReport {
            topic: deck.topic,
            style: deck.theme.style,
            output_path,
            snapshot_path,
            slide_count: assembly.slides_emitted,
            diagnostics,
        })
    }

    fn completion(&self) -> Result<&dyn TextCompletion> {
        self.completion
            .as_deref()
            .ok_or_else(|| Error::Configuration("no text-completion client configured".to_string()))
    }

    /// Request a new deck. One call, no retry.
    fn generate(&self, topic: &str, slide_count: usize) -> Result<DeckSpec> {
        let completion = self.completion()?;
        log::info!("Requesting {} slides on '{}'", slide_count, topic);

        let reply = completion
            .complete(&deck_prompt(topic, slide_count), &GenerationParams::DECK)
            .map_err(|source| Error::RemoteService {
                stage: Stage::Generate,
                source,
            })?;

        let deck = extract_deck(&reply).map_err(|source| Error::Extraction {
            stage: Stage::Generate,
            source,
        })?;
        log::info!(
            "Generated {} slides (theme: {})",
            deck.slides.len(),
            deck.theme.style
        );
        Ok(deck)
    }

    /// Improve each slide in order. A slide whose request fails keeps its
    /// original content.
    fn enhance(&self, deck: DeckSpec, diagnostics: &mut Vec<Diagnostic>) -> Result<DeckSpec> {
        let completion = self.completion()?;
        let DeckSpec {
            topic,
            theme,
            slides,
        } = deck;

        let slides = slides
            .into_iter()
            .enumerate()
            .map(|(i, slide)| {
                let number = i + 1;
                log::info!("Enhancing slide {}...", number);
                match enhance_slide(completion, &slide) {
                    Ok(enhanced) => enhanced,
                    Err(reason) => {
                        let diagnostic = Diagnostic::EnhancementSkipped {
                            slide: number,
                            reason,
                        };
                        log::warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                        slide
                    }
                }
            })
            .collect();

        Ok(DeckSpec {
            topic,
            theme,
            slides,
        })
    }

    /// Write a snapshot of `deck` and return its path.
    fn persist(&self, deck: &DeckSpec, tag: &str, at: NaiveDateTime) -> Result<PathBuf> {
        let dir = &self.config.snapshot_dir;
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            stage: Stage::Snapshot,
            path: dir.clone(),
            source,
        })?;

        let json = deck.to_json_pretty().map_err(|source| Error::Snapshot {
            stage: Stage::Snapshot,
            source,
        })?;

        let path = dir.join(snapshot_file_name(tag, at));
        fs::write(&path, json).map_err(|source| Error::Io {
            stage: Stage::Snapshot,
            path: path.clone(),
            source,
        })?;
        log::info!("Deck snapshot saved: {}", path.display());
        Ok(path)
    }

    fn save<S: DocumentSink + ?Sized>(&self, sink: &mut S, deck: &DeckSpec) -> Result<PathBuf> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            stage: Stage::Save,
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(output_file_name(&deck.topic));
        sink.save(&path).map_err(|source| Error::Sink {
            stage: Stage::Save,
            source,
        })?;
        Ok(path)
    }
}

/// Read and validate a persisted deck.
pub fn load_deck(path: &Path) -> Result<DeckSpec> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        stage: Stage::Load,
        path: path.to_path_buf(),
        source,
    })?;

    let deck = parse_deck(&text).map_err(|source| Error::Extraction {
        stage: Stage::Load,
        source,
    })?;
    log::info!("Loaded {} slides from {}", deck.slides.len(), path.display());
    Ok(deck)
}

/// One enhancement round trip; the error is a human-readable reason.
fn enhance_slide(
    completion: &dyn TextCompletion,
    slide: &SlideSpec,
) -> std::result::Result<SlideSpec, String> {
    let reply = completion
        .complete(&enhance_prompt(slide), &GenerationParams::ENHANCE)
        .map_err(|e| e.to_string())?;
    let patch = extract_slide_patch(&reply).map_err(|e| e.to_string())?;
    Ok(slide.clone().merged(patch))
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
