//! Arkgen is a client library for the Volcengine Ark (Doubao) sequential
//! image generation API, packaged as a plugin tool adapter: it resolves
//! host-supplied reference images, streams generation events from the API,
//! and re-emits them as text/image/json plugin messages.

pub mod ark;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod tool;

pub use ark::{ArkClient, EventStream, ImageClient};
pub use config::ArkConfig;
pub use error::{ArkError, Result};
pub use models::{
    EventKind, GenerationError, GenerationEvent, GenerationUsage, ImageGenerationRequest,
    ImageReference, ImageStream, ToolMessage, ToolParameters,
};
pub use tool::{ChannelSink, Image2ImageTool, MessageSink, MessageStream};
