//! Hostname discovery and validation.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

mod maybe_static;
pub use self::maybe_static::MaybeStaticHostnameProvider;

mod os;
pub use self::os::OperatingSystemHostnameProvider;

const HOSTNAME_MAX_LENGTH: usize = 255;

/// A source of the local host name.
///
/// Providers return `None` when they have nothing usable to offer, which callers treat as "try the next provider" or,
/// at the end of the line, as "no hostname".
#[async_trait]
pub trait HostnameProvider {
    /// Returns the host name, if one could be determined.
    async fn get_hostname(&self) -> Option<String>;
}

/// Validates that the given hostname is usable as a `host` tag value.
///
/// # Errors
///
/// If the hostname is empty, is a well-known local hostname, is too long, or is not RFC1123 compliant, an error
/// describing the problem is returned.
pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    if hostname.is_empty() {
        return Err("hostname is empty".to_string());
    }

    if is_local_hostname(hostname) {
        return Err(format!("{} is a local hostname", hostname));
    }

    if hostname.len() > HOSTNAME_MAX_LENGTH {
        return Err(format!(
            "name exceeded the maximum length of {} characters",
            HOSTNAME_MAX_LENGTH
        ));
    }

    if !is_rfc1123_compliant_hostname(hostname) {
        return Err(format!("{} is not RFC1123 compliant", hostname));
    }

    Ok(())
}

/// Returns `true` if the hostname refers to the loopback host.
pub fn is_local_hostname(hostname: &str) -> bool {
    static LOCAL_HOSTNAME_IDS: [&str; 4] = [
        "localhost",
        "localhost.localdomain",
        "localhost6.localdomain6",
        "ip6-localhost",
    ];

    LOCAL_HOSTNAME_IDS
        .iter()
        .any(|local_hostname| hostname.eq_ignore_ascii_case(local_hostname))
}

/// Returns `true` if the hostname is a valid RFC1123 hostname.
pub fn is_rfc1123_compliant_hostname(hostname: &str) -> bool {
    static HOSTNAME_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = HOSTNAME_REGEX.get_or_init(|| Regex::new(r"^(([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]*[a-zA-Z0-9])\.)*([A-Za-z0-9]|[A-Za-z0-9][A-Za-z0-9\-]*[A-Za-z0-9])$").unwrap());

    regex.is_match(hostname)
}
