//! Key-derivation functions for the rate-limit gates.

use tracing::warn;

/// Derives the rate-limit key for a client from its `remote_address`.
///
/// Strips the port from `host:port` and `[host]:port` forms. If the address
/// can't be parsed as a host:port pair, the raw string is used as the key
/// (still useful for limiting a single misbehaving peer) and the failure is
/// logged.
pub fn ip_key(remote_address: &str) -> String {
    if let Some(rest) = remote_address.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[..end].to_string();
        }
        warn!(remote_address, "unparseable bracketed remote address");
        return remote_address.to_string();
    }

    match remote_address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            host.to_string()
        }
        _ => {
            if remote_address.contains(':') && remote_address.matches(':').count() > 1 {
                // Bare IPv6 literal with no brackets and no port; use as-is.
                remote_address.to_string()
            } else {
                warn!(remote_address, "unparseable remote address, using raw string as key");
                remote_address.to_string()
            }
        }
    }
}

/// Derives the rate-limit key from the `X-User-Id` header, if present.
///
/// This key is client-controlled, so it is defense-in-depth against a single
/// user flooding the service, not an identity guarantee.
pub fn user_id_key(header_value: Option<&str>) -> Option<String> {
    header_value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
