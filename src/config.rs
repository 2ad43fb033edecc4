use std::env;

/// Default Ark region. The service publishes one regional endpoint per
/// region, `https://ark.{region}.volces.com/api/v3`.
const DEFAULT_REGION: &str = "cn-beijing";

#[derive(Debug, Clone)]
pub struct ArkConfig {
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub base_url: Option<String>,
}

impl Default for ArkConfig {
    fn default() -> Self {
        ArkConfig {
            api_key: None,
            region: None,
            base_url: None,
        }
    }
}

impl ArkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("ARK_API_KEY").ok();
        let region = env::var("ARK_REGION").ok();
        let base_url = env::var("ARK_BASE_URL").ok();

        ArkConfig {
            api_key,
            region,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolved endpoint for API calls. An explicit base URL wins over the
    /// region-derived one.
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://ark.{}.volces.com/api/v3",
                self.region.as_deref().unwrap_or(DEFAULT_REGION)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let config = ArkConfig::new();
        assert_eq!(config.endpoint(), "https://ark.cn-beijing.volces.com/api/v3");
    }

    #[test]
    fn test_region_endpoint() {
        let config = ArkConfig::new().with_region("ap-southeast-1");
        assert_eq!(
            config.endpoint(),
            "https://ark.ap-southeast-1.volces.com/api/v3"
        );
    }

    #[test]
    fn test_base_url_override() {
        let config = ArkConfig::new()
            .with_region("cn-beijing")
            .with_base_url("http://localhost:9000/api/v3/");
        assert_eq!(config.endpoint(), "http://localhost:9000/api/v3");
    }
}
