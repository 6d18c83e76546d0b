//! Completion gateway adapters

#[cfg(feature = "http-gateway")]
mod openai;
mod scripted;

#[cfg(feature = "http-gateway")]
pub use openai::OpenAiCompletionGateway;
pub use scripted::ScriptedCompletionGateway;

use crate::config::{FileGatewayConfig, GatewayProvider};
use roundtable_application::{CompletionGateway, GatewayError};
use std::time::Duration;
use tracing::info;

/// Build the gateway selected by `[gateway]`; `offline` forces the scripted one
pub fn build_gateway(
    config: &FileGatewayConfig,
    offline: bool,
) -> Result<Box<dyn CompletionGateway>, GatewayError> {
    if offline || config.provider == GatewayProvider::Scripted {
        info!("Using scripted completion gateway");
        let delay = Duration::from_millis(config.scripted_delay_ms);
        return Ok(Box::new(ScriptedCompletionGateway::new().with_delay(delay)));
    }
    build_http_gateway(config)
}

#[cfg(feature = "http-gateway")]
fn build_http_gateway(config: &FileGatewayConfig) -> Result<Box<dyn CompletionGateway>, GatewayError> {
    info!(model = %config.model, "Using completion endpoint {}", config.base_url);
    Ok(Box::new(OpenAiCompletionGateway::new(config.clone())?))
}

#[cfg(not(feature = "http-gateway"))]
fn build_http_gateway(_config: &FileGatewayConfig) -> Result<Box<dyn CompletionGateway>, GatewayError> {
    Err(GatewayError::Other(
        "built without the http-gateway feature; use --offline".to_string(),
    ))
}
