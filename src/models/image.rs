use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters handed over by the plugin host for one invocation.
#[derive(Debug)]
pub struct ToolParameters {
    pub prompt: String,
    pub model: String,
    /// Target size, e.g. "1024x1024".
    pub image_size: String,
    /// Desired number of output images, >= 1.
    pub output_image_num: u32,
    pub image: Option<Vec<ImageReference>>,
}

/// Readable handle supplied by the host. `reset` restores the read
/// position after a full read so the host can reuse the handle; sources
/// without a position keep the no-op default.
pub trait ImageStream: Read + Send {
    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ImageStream for File {
    fn reset(&mut self) -> io::Result<()> {
        self.rewind()
    }
}

impl ImageStream for Cursor<Vec<u8>> {
    fn reset(&mut self) -> io::Result<()> {
        self.rewind()
    }
}

/// One input image, in one of the representations the host hands out.
/// Resolution tries the variants' methods in this declaration order.
pub enum ImageReference {
    /// Remote URL, fetched with a 60s timeout.
    Url(String),
    /// Bytes already in memory.
    Blob(Vec<u8>),
    /// Readable stream handed over by the host.
    Stream(Box<dyn ImageStream>),
    /// Filesystem path supplied as a plain string.
    Path(String),
    /// Host-side cached copy on the local filesystem.
    LocalCache(PathBuf),
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReference::Url(url) => f.debug_tuple("Url").field(url).finish(),
            ImageReference::Blob(bytes) => {
                write!(f, "Blob({} bytes)", bytes.len())
            }
            ImageReference::Stream(_) => write!(f, "Stream(..)"),
            ImageReference::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageReference::LocalCache(path) => {
                f.debug_tuple("LocalCache").field(path).finish()
            }
        }
    }
}

/// Outbound request for one streaming generation call.
#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    /// `data:image/jpeg;base64,...` URIs, or None for text-to-image.
    pub image: Option<Vec<String>>,
    pub size: String,
    pub max_images: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "image_generation.partial_failed")]
    PartialFailed,
    #[serde(rename = "image_generation.partial_succeeded")]
    PartialSucceeded,
    #[serde(rename = "image_generation.partial_image")]
    PartialImage,
    #[serde(rename = "image_generation.completed")]
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationError {
    pub code: String,
    pub message: Option<String>,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationUsage {
    pub generated_images: Option<u32>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// One event from the generation stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GenerationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<GenerationUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        let event: GenerationEvent = serde_json::from_str(
            r#"{"type":"image_generation.partial_succeeded","image_index":0,"url":"https://example.com/0.png"}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::PartialSucceeded);
        assert_eq!(event.image_index, Some(0));
        assert!(event.error.is_none());
    }

    #[test]
    fn test_unknown_event_kind() {
        let event: GenerationEvent =
            serde_json::from_str(r#"{"type":"image_generation.something_new"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
    }

    #[test]
    fn test_stream_reset() {
        let mut stream = Cursor::new(vec![1u8, 2, 3]);
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).unwrap();
        ImageStream::reset(&mut stream).unwrap();
        assert_eq!(stream.position(), 0);
        assert_eq!(buffer, vec![1, 2, 3]);
    }
}
