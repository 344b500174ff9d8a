//! Completion backends for actloop.
//!
//! All providers implement the `actloop_core::Provider` trait.
//! `build_from_config` picks one based on configuration.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use actloop_core::error::ProviderError;
use actloop_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
pub fn build_from_config(
    config: &actloop_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_config = &config.provider;
    let api_key = provider_config.api_key.clone().unwrap_or_default();

    tracing::debug!(
        provider = %provider_config.name,
        base_url = %provider_config.base_url,
        "Building provider"
    );

    let provider = OpenAiCompatProvider::with_timeout(
        provider_config.name.clone(),
        provider_config.base_url.clone(),
        api_key,
        Duration::from_secs(provider_config.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let config = actloop_config::AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn provider_name_follows_config() {
        let mut config = actloop_config::AppConfig::default();
        config.provider.name = "openai".into();
        config.provider.base_url = "https://api.openai.com/v1".into();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
