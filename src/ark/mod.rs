pub mod image_client;

use crate::{config::ArkConfig, error::Result, ArkError};

pub use image_client::{EventStream, ImageClient};

#[derive(Clone)]
pub struct ArkClient {
    image_client: ImageClient,
}

impl ArkClient {
    pub fn new(config: ArkConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ArkError::ConfigError("Ark API key is required".into()))?;

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| ArkError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            image_client: ImageClient::new(http_client, api_key, config.endpoint()),
        })
    }

    pub fn images(&self) -> &ImageClient {
        &self.image_client
    }
}
