//! Lay decks out into real packages and read them back.

use chrono::NaiveDate;
use deckgen_core::{
    AssetError, DeckSpec, Diagnostic, ImageDirectory, LayoutEngine, NoImages, SlideSpec,
};
use deckgen_pptx::{PptxDocument, PptxOutline};
use std::io::Cursor;

fn engine() -> LayoutEngine {
    LayoutEngine::new(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
}

fn deck() -> DeckSpec {
    DeckSpec::new(
        "AI Basics",
        vec![
            SlideSpec::new("Intro", vec!["p1".to_string(), "**p2**".to_string()]),
            SlideSpec::new("Empty", Vec::new()),
        ],
    )
}

fn outline(doc: &PptxDocument) -> PptxOutline {
    PptxOutline::read(Cursor::new(doc.to_bytes().unwrap())).unwrap()
}

#[test]
fn test_deck_round_trips_through_package() {
    let mut doc = PptxDocument::new();
    let report = engine().assemble(&mut doc, &deck(), &NoImages).unwrap();
    assert_eq!(report.slides_emitted, 3);

    let outline = outline(&doc);
    assert_eq!(outline.slide_count(), 3);
    assert_eq!(
        outline.slides[0].text_boxes,
        vec![
            vec!["AI Basics".to_string()],
            vec!["Generated on 2024-05-17".to_string()],
        ]
    );
    assert_eq!(
        outline.slides[1].text_boxes,
        vec![
            vec!["Intro".to_string()],
            vec!["• p1".to_string(), "• **p2**".to_string()],
        ]
    );
    // Empty content still has the one paragraph every text body needs.
    assert_eq!(
        outline.slides[2].text_boxes,
        vec![vec!["Empty".to_string()], vec![String::new()]]
    );
}

#[test]
fn test_images_are_embedded_by_slide_number() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(8, 6)
        .save(dir.path().join("slide_1.png"))
        .unwrap();

    let mut doc = PptxDocument::new();
    let report = engine()
        .assemble(&mut doc, &deck(), &ImageDirectory::new(dir.path()))
        .unwrap();

    assert_eq!(doc.media_count(), 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.diagnostics[0],
        Diagnostic::Asset(AssetError::Missing { slide: 2, .. })
    ));

    let outline = outline(&doc);
    assert_eq!(outline.slides[1].picture_count, 1);
    assert_eq!(outline.slides[2].picture_count, 0);
}

#[test]
fn test_unreadable_image_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("slide_1.png"), b"not an image").unwrap();

    let mut doc = PptxDocument::new();
    let report = engine()
        .assemble(&mut doc, &deck(), &ImageDirectory::new(dir.path()))
        .unwrap();

    assert_eq!(report.slides_emitted, 3);
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::Asset(AssetError::Unembeddable { slide: 1, .. })
    )));
    assert_eq!(doc.media_count(), 0);
}

#[test]
fn test_control_characters_in_reply_still_give_readable_package() {
    let raw = r#"{"slides":[{"title":"A","content":["line\u000bbreak","bell\u0007"]}]}"#;
    let deck = deckgen_core::extract_deck(raw).unwrap();

    let mut doc = PptxDocument::new();
    engine().assemble(&mut doc, &deck, &NoImages).unwrap();

    let outline = outline(&doc);
    let bullets: Vec<&str> = outline.slides[1].text_boxes[1]
        .iter()
        .map(|p| p.trim_end())
        .collect();
    assert_eq!(bullets, vec!["• line break", "• bell"]);
}
