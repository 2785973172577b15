use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Listen address; empty means "use server.host:server.port".
    #[serde(default)]
    pub bind_addr: String,
    /// Serve the merged OpenAPI document at `/openapi.json`.
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: String::new(),
            enable_docs: false,
            cors_enabled: default_cors_enabled(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

fn default_cors_enabled() -> bool {
    true
}

fn default_body_limit_bytes() -> usize {
    16 * 1024 * 1024
}
