pub mod client;
pub mod config;
pub mod converters;
pub mod document;
pub mod edit;
pub mod errors;
pub mod generation;
pub mod models;
pub mod session;
pub mod widgets;

pub use converters::markdown;
pub use errors::{LessonError, Result};
pub use models::lesson::Lesson;
pub use models::slide::{Slide, SlideKind};
pub use session::{Effect, LessonSession};

// features
#[cfg(feature = "diff")]
pub mod diff;
#[cfg(feature = "diff")]
pub use diff::comparer::ComparerBuilder;

pub mod wasm;
pub use wasm::LessonRuntime;

use wasm_bindgen::prelude::*;

/// Routes `log` output and panics to the browser console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Escapes text for the host page, which inserts some strings as raw HTML.
#[wasm_bindgen]
pub fn escape_html(text: &str) -> String {
    converters::html::utils::escape_html_text(text)
}
