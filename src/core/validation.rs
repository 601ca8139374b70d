//! Repository URL validation
//!
//! Guards the scan entry point: only http/https/git/ssh URLs are accepted,
//! and hosts that resolve to loopback, link-local or private-network
//! addresses are refused so a scan can never be pointed at internal
//! infrastructure.

use gix_url::Scheme;
use std::net::IpAddr;

/// Validate a repository URL before a scan is allowed to start.
///
/// Returns a human-readable reason on rejection. A host that cannot be
/// resolved at all is allowed through; the clone will fail on its own
/// with a more specific message.
pub async fn validate_repo_url(repo_url: &str) -> Result<(), String> {
    if repo_url.trim().is_empty() {
        return Err("repository URL is empty".to_string());
    }

    let url = gix_url::parse(repo_url.as_bytes().into())
        .map_err(|e| format!("invalid repository URL '{}': {}", repo_url, e))?;

    match url.scheme {
        Scheme::Http | Scheme::Https | Scheme::Git | Scheme::Ssh => {}
        other => {
            return Err(format!(
                "unsupported URL scheme '{}': only http, https, git and ssh are allowed",
                other
            ));
        }
    }

    let host = match url.host() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err("repository URL has no host".to_string()),
    };

    // Literal IP hosts are checked directly, everything else via DNS.
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_disallowed_ip(ip) {
            return Err(format!("host '{}' is a loopback or private address", host));
        }
        return Ok(());
    }

    let result = match tokio::net::lookup_host((host.as_str(), 443)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_disallowed_ip(addr.ip()) {
                    return Err(format!(
                        "host '{}' resolves to a loopback or private address ({})",
                        host,
                        addr.ip()
                    ));
                }
            }
            Ok(())
        }
        Err(e) => {
            // Unresolvable hosts are the clone's problem, not validation's.
            log::debug!("DNS lookup for '{}' failed during validation: {}", host, e);
            Ok(())
        }
    };
    result
}

/// True for addresses a scan must never be pointed at
fn is_disallowed_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique-local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link-local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
