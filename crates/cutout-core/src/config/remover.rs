//! Background-remover capability configuration.

use serde::{Deserialize, Serialize};

/// Settings for the HTTP inference sidecar that performs removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoverConfig {
    /// URL of the removal endpoint. Accepts raw image bytes, returns PNG.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds. Inference can take several seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:7000/remove".to_string()
}

fn default_timeout() -> u64 {
    120
}
