// src/bin/build_lesson.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lesson_tools::document::{self, DocumentMode, RuntimeBundle};
use lesson_tools::markdown::lesson_to_markdown;
use lesson_tools::Lesson;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "build-lesson")]
#[command(about = "Builds, unpacks and outlines standalone lesson documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embeds a slides payload into a standalone HTML document
    Build {
        /// JSON array of slide records
        #[arg(value_name = "SLIDES_JSON")]
        slides: PathBuf,
        /// JSON object mapping media index to data URI
        #[arg(long, value_name = "MEDIA_JSON")]
        media: Option<PathBuf>,
        /// Course title; derived from the slides when omitted
        #[arg(long)]
        title: Option<String>,
        /// Mark the document as editable
        #[arg(long)]
        editable: bool,
        /// JS glue from `wasm-bindgen --target no-modules`; makes the document playable offline
        #[arg(long, value_name = "GLUE_JS", requires = "runtime_wasm")]
        runtime_js: Option<PathBuf>,
        /// The wasm module matching `--runtime-js`
        #[arg(long, value_name = "MODULE_WASM", requires = "runtime_js")]
        runtime_wasm: Option<PathBuf>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Writes the slides payload of a lesson document as JSON
    Extract {
        #[arg(value_name = "LESSON_HTML")]
        document: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Writes a Markdown outline of a lesson document
    Outline {
        #[arg(value_name = "LESSON_HTML")]
        document: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn load_runtime(glue: &Path, module: &Path) -> Result<RuntimeBundle> {
    Ok(RuntimeBundle {
        glue_js: fs::read_to_string(glue).with_context(|| format!("reading {}", glue.display()))?,
        wasm: fs::read(module).with_context(|| format!("reading {}", module.display()))?,
    })
}

fn load_document(path: &Path) -> Result<Lesson> {
    let html = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    document::extract_lesson(&html)
        .with_context(|| format!("extracting lesson from {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse().command {
        Commands::Build {
            slides,
            media,
            title,
            editable,
            runtime_js,
            runtime_wasm,
            output,
        } => {
            let slides = read_json(&slides)?;
            let media = match media.as_deref() {
                Some(path) => read_json(path)?,
                None => Value::Null,
            };
            let lesson = Lesson::load(title, &slides, &media)?;
            log::info!(
                "Loaded \"{}\": {} slides, {} media entries",
                lesson.title,
                lesson.count(),
                lesson.media.len()
            );
            let mode = if editable {
                DocumentMode::Editable
            } else {
                DocumentMode::ReadOnly
            };
            let runtime = match (runtime_js.as_deref(), runtime_wasm.as_deref()) {
                (Some(glue), Some(module)) => Some(load_runtime(glue, module)?),
                _ => None,
            };
            if runtime.is_none() {
                log::info!("No runtime given; the document shows its slides statically");
            }
            let html = document::build_document_with_runtime(&lesson, mode, runtime.as_ref())?;
            write_output(output.as_deref(), &html)
        }
        Commands::Extract { document, output } => {
            let lesson = load_document(&document)?;
            let json = serde_json::to_string_pretty(&lesson.slides_wire())?;
            write_output(output.as_deref(), &json)
        }
        Commands::Outline { document, output } => {
            let lesson = load_document(&document)?;
            write_output(output.as_deref(), &lesson_to_markdown(&lesson)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_flags_parse() {
        let cli = Cli::try_parse_from([
            "build-lesson",
            "build",
            "slides.json",
            "--media",
            "media.json",
            "--editable",
            "-o",
            "out.html",
        ])
        .unwrap();
        let Commands::Build {
            slides,
            media,
            title,
            editable,
            runtime_js,
            runtime_wasm,
            output,
        } = cli.command
        else {
            panic!("expected build");
        };
        assert_eq!(slides, PathBuf::from("slides.json"));
        assert_eq!(media, Some(PathBuf::from("media.json")));
        assert_eq!(title, None);
        assert!(editable);
        assert_eq!(output, Some(PathBuf::from("out.html")));
        assert_eq!((runtime_js, runtime_wasm), (None, None));

        // The runtime needs both halves.
        assert!(Cli::try_parse_from(["build-lesson", "build", "s.json", "--runtime-js", "g.js"])
            .is_err());
        assert!(Cli::try_parse_from([
            "build-lesson",
            "build",
            "s.json",
            "--runtime-js",
            "g.js",
            "--runtime-wasm",
            "m.wasm",
        ])
        .is_ok());

        assert!(Cli::try_parse_from(["build-lesson", "publish", "x"]).is_err());
    }
}
