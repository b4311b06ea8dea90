//! Helpers for querying the environment the encoder runs in.
//!
//! Currently this is limited to working out the local host name, which backs the fallback `host` tag.
#![deny(warnings)]
#![deny(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tsdbput_config::GenericConfiguration;
use tsdbput_error::GenericError;

pub mod hostname;
use self::hostname::{HostnameProvider, MaybeStaticHostnameProvider, OperatingSystemHostnameProvider};

#[derive(Clone)]
struct ChainedProvider {
    provider: Arc<dyn HostnameProvider + Send + Sync>,
    name: &'static str,
}

impl ChainedProvider {
    fn new<H>(name: &'static str, provider: H) -> Self
    where
        H: HostnameProvider + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
            name,
        }
    }
}

/// Resolves the local host name from an ordered list of providers.
///
/// Providers are tried in order, and the first one to return a hostname wins. The default chain checks for a
/// configured static hostname (the `hostname` key) and then falls back to the operating system.
#[derive(Clone)]
pub struct HostnameResolver {
    providers: Vec<ChainedProvider>,
}

impl HostnameResolver {
    /// Creates a `HostnameResolver` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the `hostname` key is present but is not a string, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        let maybe_hostname = config.try_get_typed::<String>("hostname")?;

        Ok(Self {
            providers: vec![
                ChainedProvider::new("static", MaybeStaticHostnameProvider::new(maybe_hostname)),
                ChainedProvider::new("os", OperatingSystemHostnameProvider),
            ],
        })
    }

    /// Creates an empty `HostnameResolver`, which never resolves a hostname.
    pub fn empty() -> Self {
        Self { providers: Vec::new() }
    }

    /// Appends a provider to the end of the chain.
    pub fn with_provider<H>(mut self, name: &'static str, provider: H) -> Self
    where
        H: HostnameProvider + Send + Sync + 'static,
    {
        self.providers.push(ChainedProvider::new(name, provider));
        self
    }
}

#[async_trait]
impl HostnameProvider for HostnameResolver {
    async fn get_hostname(&self) -> Option<String> {
        for provider in &self.providers {
            if let Some(hostname) = provider.provider.get_hostname().await {
                debug!(provider = provider.name, %hostname, "Resolved hostname.");
                return Some(hostname);
            }
        }

        debug!("Unable to determine the hostname from any provider.");
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tsdbput_config::ConfigurationLoader;

    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl HostnameProvider for Fixed {
        async fn get_hostname(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[tokio::test]
    async fn first_provider_with_a_hostname_wins() {
        let resolver = HostnameResolver::empty()
            .with_provider("none", Fixed(None))
            .with_provider("first", Fixed(Some("h1")))
            .with_provider("second", Fixed(Some("h2")));

        assert_eq!(resolver.get_hostname().await.as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn empty_resolver() {
        assert_eq!(HostnameResolver::empty().get_hostname().await, None);
    }

    #[tokio::test]
    async fn configured_hostname_takes_precedence() {
        let config = ConfigurationLoader::default()
            .with_values(json!({ "hostname": "configured-host" }))
            .into_generic();

        let resolver = HostnameResolver::from_configuration(&config).unwrap();
        assert_eq!(resolver.get_hostname().await.as_deref(), Some("configured-host"));
    }

    #[test]
    fn non_string_hostname_is_rejected() {
        let config = ConfigurationLoader::default()
            .with_values(json!({ "hostname": ["a", "b"] }))
            .into_generic();

        assert!(HostnameResolver::from_configuration(&config).is_err());
    }
}
