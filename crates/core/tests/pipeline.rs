//! End-to-end runs of the pipeline against scripted collaborators.

use chrono::{NaiveDate, NaiveDateTime};
use deckgen_core::{
    CompletionError, Diagnostic, DocumentSink, Error, ExtractionError, GenerationParams,
    ImageDirectory, ImagePlacement, ImageResource, Mode, Pipeline, PipelineConfig, SinkError,
    SlideId, Stage, TextCompletion, TextFrame,
};
use deckgen_core::{parse_deck, Canvas};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Replies handed out in order; records every prompt it receives.
#[derive(Clone, Default)]
struct ScriptedCompletion {
    replies: Rc<RefCell<VecDeque<Result<String, CompletionError>>>>,
    prompts: Rc<RefCell<Vec<(String, GenerationParams)>>>,
}

impl ScriptedCompletion {
    fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Rc::new(RefCell::new(replies.into())),
            prompts: Rc::default(),
        }
    }
}

impl TextCompletion for ScriptedCompletion {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, CompletionError> {
        self.prompts.borrow_mut().push((prompt.to_string(), *params));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyReply))
    }
}

/// Sink that keeps slide texts in memory and writes them out on save.
#[derive(Default)]
struct TextSink {
    slides: Vec<Vec<String>>,
    images: Vec<String>,
}

impl DocumentSink for TextSink {
    fn canvas(&self) -> Canvas {
        Canvas::STANDARD
    }

    fn add_slide(&mut self) -> Result<SlideId, SinkError> {
        self.slides.push(Vec::new());
        Ok(SlideId(self.slides.len() - 1))
    }

    fn add_text_box(&mut self, slide: SlideId, frame: TextFrame) -> Result<(), SinkError> {
        let texts = self.slides.get_mut(slide.0).ok_or(SinkError::UnknownSlide(slide.0))?;
        texts.extend(frame.paragraphs.into_iter().map(|p| p.text));
        Ok(())
    }

    fn add_image(
        &mut self,
        _slide: SlideId,
        image: &ImageResource,
        _placement: ImagePlacement,
    ) -> Result<(), SinkError> {
        self.images.push(image.name.clone());
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), SinkError> {
        let body = self
            .slides
            .iter()
            .map(|texts| texts.join("\n"))
            .collect::<Vec<_>>()
            .join("\n---\n");
        fs::write(path, body)?;
        Ok(())
    }
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.path("output"),
            snapshot_dir: self.path("snapshots"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn files_in(&self, dir: &str) -> Vec<PathBuf> {
        match fs::read_dir(self.path(dir)) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

const DECK_JSON: &str = r##"{
  "topic": "Attention and Transformers",
  "design_theme": {"primary_color": "#667eea", "style": "glassmorphism"},
  "slides": [
    {"title": "Why attention", "content": ["**Context** matters", "Long-range links"], "image_prompt": "glass"},
    {"title": "Self-attention", "content": ["Queries, keys, values"]},
    {"title": "GPT", "content": []}
  ]
}"##;

#[test]
fn generate_writes_snapshot_and_document() {
    let ws = Workspace::new();
    let reply = "```json\n{\"topic\":\"X\",\"slides\":[{\"title\":\"A\",\"content\":[\"p1\",\"p2\"]}]}\n```";
    let completion = ScriptedCompletion::new(vec![Ok(reply.to_string())]);
    let pipeline = Pipeline::new(ws.config())
        .with_completion(Box::new(completion.clone()))
        .with_clock(fixed_clock);

    let mode = Mode::Generate {
        topic: "X".to_string(),
        slide_count: 1,
    };
    let mut sink = TextSink::default();
    let report = pipeline.run(&mode, &mut sink).unwrap();

    assert_eq!(report.slide_count, 2);
    assert_eq!(report.output_path, ws.path("output").join("X_presentation.pptx"));
    assert!(report.output_path.is_file());
    assert_eq!(sink.slides[1], vec!["A", "• p1", "• p2"]);

    let snapshot = report.snapshot_path.unwrap();
    assert_eq!(
        snapshot,
        ws.path("snapshots").join("slides_generated_20240517_093000.json")
    );
    let saved = parse_deck(&fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(saved.topic, "X");
    assert_eq!(saved.slides[0].content, vec!["p1", "p2"]);

    let prompts = completion.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].0.contains("with 1 slides"));
    assert_eq!(prompts[0].1, GenerationParams::DECK);

    // No images directory was configured.
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn generate_missing_title_fails_and_writes_nothing() {
    let ws = Workspace::new();
    let reply = r#"{"topic":"T","slides":[{"title":"a"},{"title":"b"},{"content":["no title"]}]}"#;
    let pipeline = Pipeline::new(ws.config())
        .with_completion(Box::new(ScriptedCompletion::new(vec![Ok(reply.to_string())])));

    let mode = Mode::Generate {
        topic: "T".to_string(),
        slide_count: 3,
    };
    let mut sink = TextSink::default();
    let err = pipeline.run(&mode, &mut sink).unwrap_err();

    match &err {
        Error::Extraction {
            stage: Stage::Generate,
            source,
        } => {
            assert!(matches!(source, ExtractionError::SchemaViolation { .. }));
            assert_eq!(source.slide_index(), Some(2));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("slide index 2"));
    assert!(sink.slides.is_empty());
    assert!(ws.files_in("output").is_empty());
    assert!(ws.files_in("snapshots").is_empty());
}

#[test]
fn generate_malformed_reply_fails() {
    let ws = Workspace::new();
    let pipeline = Pipeline::new(ws.config()).with_completion(Box::new(ScriptedCompletion::new(
        vec![Ok("I'm sorry, I can't help with that.".to_string())],
    )));

    let mode = Mode::Generate {
        topic: "T".to_string(),
        slide_count: 3,
    };
    let err = pipeline.run(&mode, &mut TextSink::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction {
            stage: Stage::Generate,
            source: ExtractionError::MalformedPayload { .. }
        }
    ));
    assert!(ws.files_in("output").is_empty());
}

#[test]
fn generate_remote_failure_is_fatal() {
    let ws = Workspace::new();
    let failure = CompletionError::Status {
        status: 429,
        body: "quota exceeded".to_string(),
    };
    let pipeline = Pipeline::new(ws.config())
        .with_completion(Box::new(ScriptedCompletion::new(vec![Err(failure)])));

    let mode = Mode::Generate {
        topic: "T".to_string(),
        slide_count: 3,
    };
    let err = pipeline.run(&mode, &mut TextSink::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::RemoteService {
            stage: Stage::Generate,
            ..
        }
    ));
    assert!(ws.files_in("snapshots").is_empty());
}

#[test]
fn generate_without_client_is_configuration_error() {
    let ws = Workspace::new();
    let pipeline = Pipeline::new(ws.config());
    let mode = Mode::Generate {
        topic: "T".to_string(),
        slide_count: 3,
    };
    let err = pipeline.run(&mode, &mut TextSink::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn load_assembles_persisted_deck_with_images() {
    let ws = Workspace::new();
    let spec_path = ws.write("slides.json", DECK_JSON);
    fs::create_dir_all(ws.path("images")).unwrap();
    fs::write(ws.path("images").join("slide_2.png"), b"not checked by this sink").unwrap();

    let pipeline = Pipeline::new(ws.config())
        .with_images(Box::new(ImageDirectory::new(ws.path("images"))))
        .with_clock(fixed_clock);
    let mut sink = TextSink::default();
    let report = pipeline
        .run(&Mode::Load { spec_path }, &mut sink)
        .unwrap();

    assert_eq!(report.slide_count, 4);
    assert_eq!(report.style, "glassmorphism");
    assert!(report.snapshot_path.is_none());
    assert_eq!(
        report.output_path,
        ws.path("output").join("Attention_and_Transformers_presentation.pptx")
    );

    assert_eq!(
        sink.slides[0],
        vec!["Attention and Transformers", "Generated on 2024-05-17"]
    );
    assert_eq!(
        sink.slides[1],
        vec!["Why attention", "• **Context** matters", "• Long-range links"]
    );
    assert_eq!(sink.slides[3], vec!["GPT"]);
    assert_eq!(sink.images, vec!["slide_2.png"]);

    let missing: Vec<usize> = report
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::Asset(deckgen_core::AssetError::Missing { slide, .. }) => Some(*slide),
            _ => None,
        })
        .collect();
    assert_eq!(missing, vec![1, 3]);
}

#[test]
fn load_missing_file_fails_fast() {
    let ws = Workspace::new();
    let pipeline = Pipeline::new(ws.config());
    let mode = Mode::Load {
        spec_path: ws.path("missing.json"),
    };
    let mut sink = TextSink::default();
    let err = pipeline.run(&mode, &mut sink).unwrap_err();

    assert!(matches!(
        err,
        Error::Io {
            stage: Stage::Load,
            ..
        }
    ));
    assert!(sink.slides.is_empty());
}

#[test]
fn load_applies_schema_rules() {
    let ws = Workspace::new();
    let spec_path = ws.write("slides.json", r#"{"slides":[{"title":"ok"},{"content":[]}]}"#);
    let err = Pipeline::new(ws.config())
        .run(&Mode::Load { spec_path }, &mut TextSink::default())
        .unwrap_err();

    match err {
        Error::Extraction {
            stage: Stage::Load,
            source,
        } => assert_eq!(source.slide_index(), Some(1)),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn load_twice_yields_same_file_name() {
    let ws = Workspace::new();
    let spec_path = ws.write("slides.json", DECK_JSON);
    let pipeline = Pipeline::new(ws.config());
    let mode = Mode::Load { spec_path };

    let first = pipeline.run(&mode, &mut TextSink::default()).unwrap();
    let second = pipeline.run(&mode, &mut TextSink::default()).unwrap();
    assert_eq!(first.output_path, second.output_path);
}

#[test]
fn enhance_degrades_per_slide_and_keeps_order() {
    let ws = Workspace::new();
    let spec_path = ws.write("slides.json", DECK_JSON);
    let completion = ScriptedCompletion::new(vec![
        Ok("```json\n{\"title\": \"Why attention matters\", \"content\": [\"Sharper point\"]}\n```".to_string()),
        Ok("not json at all".to_string()),
        Err(CompletionError::Transport("connection reset".to_string())),
    ]);
    let pipeline = Pipeline::new(ws.config())
        .with_completion(Box::new(completion.clone()))
        .with_clock(fixed_clock);

    let mut sink = TextSink::default();
    let report = pipeline
        .run(&Mode::Enhance { spec_path }, &mut sink)
        .unwrap();

    let skipped: Vec<usize> = report
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::EnhancementSkipped { slide, .. } => Some(*slide),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![2, 3]);

    let snapshot = report.snapshot_path.unwrap();
    assert!(snapshot.ends_with("slides_enhanced_20240517_093000.json"));
    let deck = parse_deck(&fs::read_to_string(snapshot).unwrap()).unwrap();
    let titles: Vec<&str> = deck.slides.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Why attention matters", "Self-attention", "GPT"]);
    assert_eq!(deck.slides[0].content, vec!["Sharper point"]);
    assert_eq!(deck.slides[0].image_prompt.as_deref(), Some("glass"));
    assert_eq!(deck.slides[1].content, vec!["Queries, keys, values"]);

    assert_eq!(sink.slides[1], vec!["Why attention matters", "• Sharper point"]);

    let prompts = completion.prompts.borrow();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].0.contains("Title: Why attention"));
    assert!(prompts[1].0.contains("Title: Self-attention"));
    assert!(prompts[2].0.contains("Title: GPT"));
    assert!(prompts.iter().all(|(_, params)| *params == GenerationParams::ENHANCE));
}
