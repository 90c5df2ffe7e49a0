// demos/narrate_lesson.rs
//
// Walks a lesson in listen mode, fetching narration from ElevenLabs and printing the
// effects a page would perform.
//
//   cargo run --example narrate_lesson -- slides.json

use std::env;
use std::fs;

use dotenvy::dotenv;
use lesson_tools::client::{perform_fetches, probe_narration, ElevenLabsClient};
use lesson_tools::config::{RuntimeConfig, SessionSettings};
use lesson_tools::session::{Collaborators, Effect};
use lesson_tools::{Lesson, LessonSession};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the variables may already be exported.
    let _ = dotenv();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example narrate_lesson -- <slides.json>");
        eprintln!("Ensure ELEVENLABS_API_KEY is set in your environment or .env file.");
        return Ok(());
    }

    let slides: Value = serde_json::from_str(&fs::read_to_string(&args[1])?)?;
    let lesson = Lesson::load(None, &slides, &Value::Null)?;
    let config = RuntimeConfig::from_env()?;
    let synth = ElevenLabsClient::from_config(&config)?;

    let mut session = LessonSession::new(
        lesson,
        SessionSettings::default(),
        Collaborators {
            narration: true,
            ai_edit: config.has_editor_credentials(),
        },
    );

    let probed = probe_narration(&mut session, &synth).await;
    log::info!("Narration backend: {:?}", session.narration().remote_state());
    report(&probed);

    let mut effects = session.start(true);
    loop {
        effects = perform_fetches(&mut session, &synth, effects).await;
        report(&effects);

        // Stand in for the page: finish each clip immediately.
        let finished: Vec<_> = effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::PlayAudio { ticket, .. } | Effect::SpeakLocal { ticket, .. } => {
                    Some(*ticket)
                }
                _ => None,
            })
            .collect();
        let mut next = Vec::new();
        for ticket in finished {
            next.extend(session.playback_ended(ticket));
        }
        let timers: Vec<_> = next
            .iter()
            .filter_map(|effect| match effect {
                Effect::Schedule { timer, .. } => Some(*timer),
                _ => None,
            })
            .collect();
        report(&next);
        if timers.is_empty() {
            break;
        }
        effects = timers
            .into_iter()
            .flat_map(|timer| session.fire(timer))
            .collect();
        if effects.is_empty() {
            break;
        }
    }

    println!(
        "Finished on slide {} of {}",
        session.current_index() + 1,
        session.lesson().count()
    );
    Ok(())
}

fn report(effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::PlayAudio { slide, clip, .. } => {
                println!("play slide {} ({} bytes of {})", slide + 1, clip.bytes.len(), clip.mime)
            }
            Effect::SpeakLocal { chunks, .. } => {
                println!("speak locally: {} chunk(s)", chunks.len())
            }
            other => println!("{}", serde_json::to_string(other).unwrap_or_default()),
        }
    }
}
