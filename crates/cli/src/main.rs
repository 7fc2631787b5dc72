//! CLI tool for generating PowerPoint decks from a topic.

mod check;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckgen_core::pipeline::DEFAULT_SLIDE_COUNT;
use deckgen_core::{ImageDirectory, Mode, Pipeline, PipelineConfig, RunReport};
use deckgen_gemini::GeminiClient;
use deckgen_pptx::{PptxDocument, PptxOutline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Generate PowerPoint decks with Gemini.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory for generated .pptx files
    #[arg(long, global = true, default_value = "output")]
    output_dir: PathBuf,

    /// Directory holding slide_<N>.png/.jpg images
    #[arg(long, global = true, default_value = "images")]
    images_dir: PathBuf,

    /// Directory for deck snapshots (slides_<mode>_<timestamp>.json)
    #[arg(long, global = true, default_value = ".")]
    snapshot_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a deck from a saved deck file
    Load {
        #[arg(default_value = "slides.json")]
        path: PathBuf,
    },

    /// Generate a new deck on a topic
    Generate {
        topic: String,

        /// Number of content slides to request
        #[arg(short = 'n', long = "slides", default_value_t = DEFAULT_SLIDE_COUNT as u32,
              value_parser = clap::value_parser!(u32).range(1..))]
        slides: u32,
    },

    /// Improve every slide of a saved deck file
    Enhance {
        #[arg(default_value = "slides.json")]
        path: PathBuf,
    },

    /// Print the text outline of a .pptx file
    Inspect { path: PathBuf },

    /// Check the API key setup
    Check {
        /// Also send a short test request
        #[arg(long)]
        ping: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env loaded: {}", e);
    }

    let mode = match &args.command {
        Command::Load { path } => Mode::Load {
            spec_path: path.clone(),
        },
        Command::Generate { topic, slides } => Mode::Generate {
            topic: topic.clone(),
            slide_count: *slides as usize,
        },
        Command::Enhance { path } => Mode::Enhance {
            spec_path: path.clone(),
        },
        Command::Inspect { path } => {
            inspect(path)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Check { ping } => {
            let passed = check::run(Path::new(".env"), *ping);
            return Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
    };

    let report = build_deck(&args, &mode)?;
    print_report(&report);
    Ok(ExitCode::SUCCESS)
}

/// Run the pipeline for `mode` and write a .pptx file.
fn build_deck(args: &Args, mode: &Mode) -> Result<RunReport> {
    if !args.images_dir.is_dir() {
        log::warn!(
            "Image directory {} not found; slides will have no images",
            args.images_dir.display()
        );
    }

    let pipeline_config = PipelineConfig {
        output_dir: args.output_dir.clone(),
        snapshot_dir: args.snapshot_dir.clone(),
    };
    let mut pipeline =
        Pipeline::new(pipeline_config).with_images(Box::new(ImageDirectory::new(&args.images_dir)));

    if mode.needs_completion() {
        let gemini = config::gemini_config()?;
        log::debug!("Using {:?}", gemini);
        let client = GeminiClient::new(gemini).context("Failed to set up the Gemini client")?;
        pipeline = pipeline.with_completion(Box::new(client));
    }

    let mut document = PptxDocument::new();
    let report = pipeline
        .run(mode, &mut document)
        .with_context(|| format!("Failed to build the {} deck", mode.tag()))?;
    Ok(report)
}

fn print_report(report: &RunReport) {
    println!("Presentation saved: {}", report.output_path.display());
    println!("  Topic: {}", report.topic);
    println!("  Slides: {} (including title slide)", report.slide_count);
    println!("  Theme style: {}", report.style);
    if let Some(snapshot) = &report.snapshot_path {
        println!("  Deck snapshot: {}", snapshot.display());
    }
    if !report.diagnostics.is_empty() {
        println!("  Warnings:");
        for diagnostic in &report.diagnostics {
            println!("    - {}", diagnostic);
        }
    }
}

/// Print the slides of an existing presentation.
fn inspect(path: &Path) -> Result<()> {
    let outline =
        PptxOutline::open(path).with_context(|| format!("Failed to read {}", path.display()))?;

    println!("{}: {} slides", path.display(), outline.slide_count());
    for slide in &outline.slides {
        println!();
        print!("Slide {}", slide.number);
        if slide.picture_count > 0 {
            print!(" ({} picture(s))", slide.picture_count);
        }
        println!();
        for paragraph in slide.paragraphs().filter(|p| !p.is_empty()) {
            println!("  {}", paragraph);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["deckgen", "load"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert_eq!(args.images_dir, PathBuf::from("images"));
        assert_eq!(args.snapshot_dir, PathBuf::from("."));
        assert!(matches!(args.command, Command::Load { ref path } if path == Path::new("slides.json")));
    }

    #[test]
    fn test_generate_flags() {
        let args = Args::try_parse_from(["deckgen", "generate", "Quantum computing", "-n", "5", "-v"])
            .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Generate { topic, slides } => {
                assert_eq!(topic, "Quantum computing");
                assert_eq!(slides, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from(["deckgen", "generate", "AI"]).unwrap();
        assert!(matches!(args.command, Command::Generate { slides: 10, .. }));
    }

    #[test]
    fn test_zero_slides_rejected() {
        assert!(Args::try_parse_from(["deckgen", "generate", "AI", "--slides", "0"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["deckgen", "enhance", "deck.json", "--output-dir", "out"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(matches!(args.command, Command::Enhance { ref path } if path == Path::new("deck.json")));
    }
}
