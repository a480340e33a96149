// ── Runtime connection configuration ──
//
// Describes *how* to reach the back office. Carries credential data and
// transport tuning, but never touches disk -- propflow-config constructs
// a `GatewayConfig` from profiles and hands it in.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use propflow_api::{GatewayClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Configuration for connecting to a single back-office deployment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API base URL (e.g. `https://backoffice.example.com`).
    pub base_url: Url,
    /// Bearer token for the `Authorization` header.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Build a ready-to-use gateway client behind an `Arc` for sharing
    /// across stores.
    pub fn build_client(&self) -> Result<Arc<GatewayClient>, CoreError> {
        let transport = TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        };
        let client = GatewayClient::new(self.base_url.as_str(), &self.token, &transport)?;
        Ok(Arc::new(client))
    }
}
