use crate::{
    error::{ArkError, Result},
    models::{GenerationEvent, ImageGenerationRequest},
};
use futures::stream::Stream;
use futures::StreamExt;
use serde_json::json;
use std::pin::Pin;
use tokio_stream::wrappers::ReceiverStream;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent>> + Send>>;

#[derive(Clone)]
pub struct ImageClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ImageClient {
    pub fn new(client: reqwest::Client, api_key: String, endpoint: String) -> Self {
        Self {
            client,
            api_key,
            endpoint,
        }
    }

    /// Open one streaming generation call and yield its events as they
    /// arrive. The stream ends when the server sends `data: [DONE]`, the
    /// connection closes, or the consumer drops the stream.
    pub async fn generate_stream(&self, request: ImageGenerationRequest) -> Result<EventStream> {
        let payload = Self::build_payload(&request);

        log::info!("Invoking streaming image model: {}", request.model);
        log::debug!("Image generation request payload: {}", payload);

        let response = self
            .client
            .post(format!("{}/images/generations", self.endpoint))
            .headers(self.build_headers())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ArkError::TransportFailure(format!("Ark request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArkError::RemoteGenerationFailure(format!(
                "Ark returned {}: {}",
                status, body
            )));
        }

        // Convert the SSE body to a stream of parsed events using a channel
        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            'receive: while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(newline) = buffer.find('\n') {
                            let line: String = buffer.drain(..=newline).collect();
                            match parse_sse_line(&line) {
                                Some(SseLine::Event(event)) => {
                                    if tx.send(Ok(event)).await.is_err() {
                                        break 'receive;
                                    }
                                }
                                Some(SseLine::Done) => {
                                    buffer.clear();
                                    break 'receive;
                                }
                                Some(SseLine::Error(message)) => {
                                    let _ =
                                        tx.send(Err(ArkError::ResponseError(message))).await;
                                    buffer.clear();
                                    break 'receive;
                                }
                                None => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(ArkError::TransportFailure(format!(
                                "Stream read failed: {}",
                                e
                            ))))
                            .await;
                        break;
                    }
                }
            }

            // A final event may arrive without a trailing newline
            if let Some(SseLine::Event(event)) = parse_sse_line(&buffer) {
                let _ = tx.send(Ok(event)).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.api_key).parse().unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            "text/event-stream".parse().unwrap(),
        );
        headers
    }

    fn build_payload(request: &ImageGenerationRequest) -> serde_json::Value {
        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "size": request.size,
            "sequential_image_generation": "auto",
            "sequential_image_generation_options": {
                "max_images": request.max_images
            },
            "stream": true,
            "response_format": "url",
            "watermark": false
        });

        if let Some(images) = &request.image {
            if !images.is_empty() {
                payload["image"] = json!(images);
            }
        }

        payload
    }
}

enum SseLine {
    Event(GenerationEvent),
    Done,
    Error(String),
}

/// Parse one Server-Sent Events line. Blank lines and comments yield None.
fn parse_sse_line(line: &str) -> Option<SseLine> {
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    if line == "data: [DONE]" {
        return Some(SseLine::Done);
    }

    if let Some(data) = line.strip_prefix("data: ") {
        return match serde_json::from_str::<GenerationEvent>(data) {
            Ok(event) => Some(SseLine::Event(event)),
            Err(e) => Some(SseLine::Error(format!("Failed to parse event: {}", e))),
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;

    #[test]
    fn test_parse_sse_event_line() {
        let line = r#"data: {"type":"image_generation.partial_succeeded","image_index":1,"url":"https://example.com/1.png"}"#;

        match parse_sse_line(line) {
            Some(SseLine::Event(event)) => {
                assert_eq!(event.kind, EventKind::PartialSucceeded);
                assert_eq!(event.image_index, Some(1));
                assert_eq!(event.url.as_deref(), Some("https://example.com/1.png"));
            }
            _ => panic!("Expected an event"),
        }
    }

    #[test]
    fn test_parse_sse_done() {
        assert!(matches!(parse_sse_line("data: [DONE]"), Some(SseLine::Done)));
    }

    #[test]
    fn test_parse_sse_skips_blank_and_comments() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line("   ").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
    }

    #[test]
    fn test_parse_sse_malformed_payload() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Some(SseLine::Error(_))
        ));
    }

    #[test]
    fn test_payload_without_images() {
        let request = ImageGenerationRequest {
            model: "doubao-seedream-4-0".to_string(),
            prompt: "a red bicycle".to_string(),
            image: None,
            size: "1024x1024".to_string(),
            max_images: 2,
        };

        let payload = ImageClient::build_payload(&request);
        assert!(payload.get("image").is_none());
        assert_eq!(payload["stream"], json!(true));
        assert_eq!(payload["sequential_image_generation"], json!("auto"));
        assert_eq!(
            payload["sequential_image_generation_options"]["max_images"],
            json!(2)
        );
        assert_eq!(payload["response_format"], json!("url"));
        assert_eq!(payload["watermark"], json!(false));
    }

    #[test]
    fn test_payload_with_images() {
        let request = ImageGenerationRequest {
            model: "doubao-seedream-4-0".to_string(),
            prompt: "same bicycle, at night".to_string(),
            image: Some(vec!["data:image/jpeg;base64,AAAA".to_string()]),
            size: "1024x1024".to_string(),
            max_images: 1,
        };

        let payload = ImageClient::build_payload(&request);
        assert_eq!(payload["image"], json!(["data:image/jpeg;base64,AAAA"]));
    }
}
