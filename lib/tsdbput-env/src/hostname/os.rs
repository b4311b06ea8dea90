use async_trait::async_trait;
use tracing::debug;

use super::HostnameProvider;

/// A hostname provider that returns the hostname reported by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatingSystemHostnameProvider;

#[async_trait]
impl HostnameProvider for OperatingSystemHostnameProvider {
    async fn get_hostname(&self) -> Option<String> {
        match hostname::get() {
            Ok(hostname) => {
                let hostname = hostname.to_string_lossy();
                let hostname = hostname.trim();
                if hostname.is_empty() {
                    debug!("Operating system reported an empty hostname.");
                    None
                } else {
                    Some(hostname.to_string())
                }
            }
            Err(e) => {
                debug!(error = %e, "Failed to query hostname.");
                None
            }
        }
    }
}
