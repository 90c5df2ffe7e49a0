// src/models/media.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{LessonError, Result};

/// Key into the [`MediaTable`]. Keys are not guaranteed to be contiguous.
pub type MediaIndex = usize;

/// Broad media category, derived from the MIME type of a stored data URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

/// Index-keyed store of image/video assets, each held as a data URI.
///
/// Serializes as a JSON object (`{"0": "data:image/png;base64,..."}`) and keeps
/// insertion order, so a load/serialize cycle reproduces the same table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaTable {
    entries: IndexMap<MediaIndex, String>,
}

impl MediaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a list of data URIs, keyed by position.
    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = uris
            .into_iter()
            .enumerate()
            .map(|(i, uri)| (i, uri.into()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, index: MediaIndex) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    /// Like [`MediaTable::get`] but surfaces a missing key as an error.
    pub fn resolve(&self, index: MediaIndex) -> Result<&str> {
        self.get(index)
            .ok_or(LessonError::UnresolvedMediaReference(index))
    }

    pub fn contains(&self, index: MediaIndex) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediaIndex, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Stores `uri` under `index`, replacing whatever was there.
    /// Returns the previous URI, if any.
    pub fn insert(&mut self, index: MediaIndex, uri: impl Into<String>) -> Option<String> {
        self.entries.insert(index, uri.into())
    }

    /// Stores `uri` under the lowest free index (probing upward from 0).
    pub fn allocate(&mut self, uri: impl Into<String>) -> MediaIndex {
        let index = self.lowest_free_index();
        self.entries.insert(index, uri.into());
        index
    }

    /// Releases `index`. Keeps the order of the remaining entries.
    pub fn remove(&mut self, index: MediaIndex) -> Option<String> {
        self.entries.shift_remove(&index)
    }

    pub fn lowest_free_index(&self) -> MediaIndex {
        (0..)
            .find(|i| !self.entries.contains_key(i))
            .unwrap_or(self.entries.len())
    }

    /// Media category of the entry at `index`, or `None` if the key is absent.
    pub fn kind_of(&self, index: MediaIndex) -> Option<MediaKind> {
        self.get(index).map(media_kind_of_uri)
    }

    pub fn is_video(&self, index: MediaIndex) -> bool {
        self.kind_of(index) == Some(MediaKind::Video)
    }
}

/// Classifies a stored URI by its MIME prefix (`image/`, `video/`).
pub fn media_kind_of_uri(uri: &str) -> MediaKind {
    let mime = DataUri::parse(uri).map(|d| d.mime).unwrap_or_default();
    if mime.starts_with("video/") {
        MediaKind::Video
    } else if mime.starts_with("image/") {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}

/// A borrowed view of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub is_base64: bool,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Splits `data:<mime>[;params][;base64],<payload>`. Returns `None` for anything else.
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default();
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));
        Some(Self {
            mime,
            is_base64,
            payload,
        })
    }

    /// Decodes the payload bytes. Non-base64 payloads are returned as-is.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.is_base64 {
            Ok(STANDARD.decode(self.payload.trim())?)
        } else {
            Ok(self.payload.as_bytes().to_vec())
        }
    }
}

/// Decoded bytes of one media entry, derived lazily for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaClip {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl MediaClip {
    pub fn from_uri(uri: &str) -> Result<Self> {
        let data = DataUri::parse(uri)
            .ok_or_else(|| LessonError::MalformedInput("media entry is not a data URI".into()))?;
        Ok(Self {
            mime: data.mime.to_string(),
            bytes: data.decode()?,
        })
    }
}
