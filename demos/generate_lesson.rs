// demos/generate_lesson.rs
//
// Turns a text file into a lesson with Claude and writes an editable document.
//
//   cargo run --example generate_lesson -- notes.txt lesson.html

use std::env;
use std::fs;

use dotenvy::dotenv;
use lesson_tools::client::AnthropicClient;
use lesson_tools::config::RuntimeConfig;
use lesson_tools::document::{build_document, DocumentMode};
use lesson_tools::generation::GenerationRequest;
use lesson_tools::models::media::MediaTable;
use lesson_tools::Lesson;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --example generate_lesson -- <source.txt> <out.html>");
        eprintln!("Ensure ANTHROPIC_API_KEY is set in your environment or .env file.");
        return Ok(());
    }

    let mut request = GenerationRequest::new(fs::read_to_string(&args[1])?);
    if let Ok(title) = env::var("COURSE_TITLE") {
        request.course_title = Some(title);
    }

    let client = AnthropicClient::from_config(&RuntimeConfig::from_env()?)?;
    log::info!("Generating slides from {}...", args[1]);
    let slides = client.generate_slides(&request).await?;
    let lesson = Lesson::new(request.course_title.clone(), slides, MediaTable::new())?;
    log::info!("Generated {} slides for \"{}\"", lesson.count(), lesson.title);

    fs::write(&args[2], build_document(&lesson, DocumentMode::Editable)?)?;
    println!("Wrote {}", args[2]);
    Ok(())
}
