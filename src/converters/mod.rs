//! Output formats for lessons: HTML fragments for the runtime and a Markdown
//! outline for review.

pub mod html;
pub mod markdown;
