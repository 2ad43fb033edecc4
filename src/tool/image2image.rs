use crate::{
    ark::ArkClient,
    config::ArkConfig,
    error::{ArkError, Result},
    logger,
    models::{
        EventKind, GenerationEvent, ImageGenerationRequest, ImageReference, ToolMessage,
        ToolParameters,
    },
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::stream::Stream;
use futures::StreamExt;
use serde_json::json;
use std::io::Read;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

use super::sink::{ChannelSink, MessageSink};

pub type MessageStream = Pin<Box<dyn Stream<Item = ToolMessage> + Send>>;

/// Timeout for fetching a reference image over HTTP.
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Image-to-image generation tool for the Ark API.
///
/// One invocation resolves and encodes the input images, opens a single
/// streaming generation call, and re-emits every stream event as plugin
/// messages. There is no retry and no shared state between invocations.
pub struct Image2ImageTool {
    config: ArkConfig,
}

impl Image2ImageTool {
    pub fn new(config: ArkConfig) -> Self {
        Self { config }
    }

    /// Run one invocation. The returned stream is lazy on the consumer
    /// side; the producing task suspends only on network I/O. Dropping
    /// the stream stops the producer at its next message.
    ///
    /// Must be called from within a tokio runtime.
    pub fn invoke(&self, parameters: ToolParameters) -> MessageStream {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let config = self.config.clone();

        tokio::spawn(async move {
            let sink = ChannelSink::new(tx);
            if let Err(error) = run(config, parameters, &sink).await {
                let _ = sink
                    .emit(ToolMessage::text(format!(
                        "Error while generating images: {}",
                        error
                    )))
                    .await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

async fn run(
    config: ArkConfig,
    parameters: ToolParameters,
    sink: &dyn MessageSink,
) -> Result<()> {
    let images_data = match parameters.image {
        None => None,
        Some(references) if references.is_empty() => None,
        Some(references) => {
            let mut encoded_images = Vec::with_capacity(references.len());
            for reference in references {
                let bytes = resolve_image(reference, sink).await?;
                let (encoded, report) = encode_image(&bytes);
                sink.emit(ToolMessage::text(report)).await?;
                encoded_images.push(format!("data:image/jpeg;base64,{}", encoded));
            }
            Some(encoded_images)
        }
    };

    sink.emit(ToolMessage::text("Preparing to generate images..."))
        .await?;
    sink.emit(ToolMessage::text(format!("Prompt: {}", parameters.prompt)))
        .await?;

    let client = ArkClient::new(config)?;
    let request = ImageGenerationRequest {
        model: parameters.model,
        prompt: parameters.prompt,
        image: images_data,
        size: parameters.image_size,
        max_images: parameters.output_image_num,
    };

    let events = client.images().generate_stream(request).await?;
    sink.emit(ToolMessage::text("Waiting for image generation..."))
        .await?;

    pump_events(events, sink).await
}

/// Obtain the raw bytes behind one image reference. Each variant maps to
/// one retrieval method; a successful method reports itself and the byte
/// size involved, a failed one aborts the whole request.
async fn resolve_image(reference: ImageReference, sink: &dyn MessageSink) -> Result<Vec<u8>> {
    let bytes = match reference {
        ImageReference::Url(url) => {
            let preview: String = url.chars().take(30).collect();
            sink.emit(ToolMessage::text(format!(
                "Fetching image from URL: {}...",
                preview
            )))
            .await?;

            let _timer = logger::timer("image download");
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
                .build()
                .map_err(|e| {
                    ArkError::TransportFailure(format!("Failed to build download client: {}", e))
                })?;

            let response = client.get(&url).send().await.map_err(|e| {
                ArkError::TransportFailure(format!("Image download failed: {}", e))
            })?;

            if !response.status().is_success() {
                return Err(ArkError::TransportFailure(format!(
                    "Image download returned {}",
                    response.status()
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| {
                    ArkError::TransportFailure(format!("Image download failed: {}", e))
                })?
                .to_vec();

            sink.emit(ToolMessage::text(format!(
                "Downloaded image: size={:.2}KB",
                kb(bytes.len())
            )))
            .await?;
            bytes
        }
        ImageReference::Blob(bytes) => {
            sink.emit(ToolMessage::text(format!(
                "Using in-memory image bytes: size={:.2}KB",
                kb(bytes.len())
            )))
            .await?;
            bytes
        }
        ImageReference::Stream(mut stream) => {
            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes).map_err(|e| {
                ArkError::ImageUnavailable(format!("Failed to read image stream: {}", e))
            })?;
            if let Err(e) = stream.reset() {
                log::warn!("Could not reset image stream position: {}", e);
            }
            sink.emit(ToolMessage::text(format!(
                "Read image from host stream: size={:.2}KB",
                kb(bytes.len())
            )))
            .await?;
            bytes
        }
        ImageReference::Path(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                ArkError::ImageUnavailable(format!(
                    "Failed to read image from path {}: {}",
                    path, e
                ))
            })?;
            sink.emit(ToolMessage::text(format!(
                "Read image from file path: {}, size={:.2}KB",
                path,
                kb(bytes.len())
            )))
            .await?;
            bytes
        }
        ImageReference::LocalCache(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                ArkError::ImageUnavailable(format!(
                    "Failed to read image from local cache {}: {}",
                    path.display(),
                    e
                ))
            })?;
            sink.emit(ToolMessage::text(format!(
                "Read image from local cache: {}, size={:.2}KB",
                path.display(),
                kb(bytes.len())
            )))
            .await?;
            bytes
        }
    };

    if bytes.is_empty() {
        return Err(ArkError::ImageUnavailable(
            "image source yielded no data".into(),
        ));
    }

    Ok(bytes)
}

/// Base64-encode image bytes. Returns the encoded text and a size report
/// for observability.
fn encode_image(bytes: &[u8]) -> (String, String) {
    let encoded = BASE64.encode(bytes);
    let report = format!(
        "Image encoded: original size={:.2}KB, encoded size={:.2}KB",
        kb(bytes.len()),
        kb(encoded.len())
    );
    (encoded, report)
}

fn kb(len: usize) -> f64 {
    len as f64 / 1024.0
}

/// Translate the event stream into outbound messages. Successful events
/// accumulate into the summary emitted on `completed`; an
/// `InternalServiceError` partial failure abandons the stream mid-flight
/// with no summary.
async fn pump_events<E>(mut events: E, sink: &dyn MessageSink) -> Result<()>
where
    E: Stream<Item = Result<GenerationEvent>> + Unpin,
{
    let mut images_info: Vec<GenerationEvent> = Vec::new();

    while let Some(item) = events.next().await {
        let event = item?;
        match event.kind {
            EventKind::PartialFailed => {
                let detail = event
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                log::warn!("Partial image generation failed: {}", detail);
                sink.emit(ToolMessage::text(format!(
                    "Partial image generation failed: {}",
                    detail
                )))
                .await?;

                if let Some(error) = &event.error {
                    if error.code == "InternalServiceError" {
                        sink.emit(ToolMessage::text(format!(
                            "InternalServiceError, image generation aborted: {}",
                            error
                        )))
                        .await?;
                        return Ok(());
                    }
                }
            }
            EventKind::PartialSucceeded => {
                if event.error.is_none() && event.url.is_some() {
                    let url = event.url.clone().unwrap_or_default();
                    let index = event.image_index.unwrap_or_default();
                    images_info.push(event);
                    sink.emit(ToolMessage::text(format!(
                        "Image #{} generated. The link expires 24 hours after generation, be sure to save it in time.",
                        index
                    )))
                    .await?;
                    sink.emit(ToolMessage::image(url)).await?;
                }
            }
            EventKind::PartialImage => {
                let url = event.url.clone().unwrap_or_default();
                let index = event.image_index.unwrap_or_default();
                images_info.push(event);
                sink.emit(ToolMessage::text(format!(
                    "Image #{} generated. The link expires 24 hours after generation, be sure to save it in time.",
                    index
                )))
                .await?;
                sink.emit(ToolMessage::image(url)).await?;
            }
            EventKind::Completed => {
                if event.error.is_none() {
                    sink.emit(ToolMessage::text("Image generation completed"))
                        .await?;
                    sink.emit(ToolMessage::json(json!({
                        "images_info": &images_info,
                        "usage": event.usage,
                    })))
                    .await?;
                }
            }
            EventKind::Unknown => {}
        }
    }

    Ok(())
}
