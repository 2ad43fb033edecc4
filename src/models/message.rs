use serde_json::Value;

/// A discrete message emitted back to the plugin host, mirroring the
/// host's text/image/json message primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMessage {
    Text(String),
    Image { url: String },
    Json(Value),
}

impl ToolMessage {
    pub fn text(content: impl Into<String>) -> Self {
        ToolMessage::Text(content.into())
    }

    pub fn image(url: impl Into<String>) -> Self {
        ToolMessage::Image { url: url.into() }
    }

    pub fn json(value: Value) -> Self {
        ToolMessage::Json(value)
    }
}
