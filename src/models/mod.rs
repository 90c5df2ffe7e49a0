//! The slide data model: lessons, slides, content blocks and the media table.

pub mod block;
pub mod lesson;
pub mod media;
pub(crate) mod raw;
pub mod slide;

pub use raw::defaults;
