use async_trait::async_trait;
use tracing::debug;

use super::{validate_hostname, HostnameProvider};

/// A hostname provider that returns a static hostname.
///
/// The hostname is optional so that a configuration value that may or may not be present can be handed over as-is.
/// Invalid hostnames are treated the same as an absent one.
#[derive(Clone, Debug)]
pub struct MaybeStaticHostnameProvider {
    hostname: Option<String>,
}

impl MaybeStaticHostnameProvider {
    /// Creates a new `MaybeStaticHostnameProvider` with the given hostname.
    pub fn new(hostname: Option<String>) -> Self {
        Self { hostname }
    }
}

#[async_trait]
impl HostnameProvider for MaybeStaticHostnameProvider {
    async fn get_hostname(&self) -> Option<String> {
        let hostname = match self.hostname.as_ref() {
            Some(hostname) => hostname.trim(),
            None => {
                debug!("No static hostname provided.");
                return None;
            }
        };

        if let Err(e) = validate_hostname(hostname) {
            debug!(error = %e, "Invalid static hostname.");
            return None;
        }

        Some(hostname.to_string())
    }
}
