//! The flashlight error taxonomy.
//!
//! Every failure in the system — malformed client input, a missing player, a
//! rate limit, an unhappy upstream — is represented as one [`FlashlightError`]
//! with an [`ErrorKind`] tag. Layers that wrap a lower-level error preserve its
//! kind; the HTTP port is the single place that performs an exhaustive match
//! from kind to status code, rather than each call site growing its own
//! `From` impl and guessing at a status.

use std::fmt;

/// The closed set of ways a request can fail.
///
/// Mirrors the taxonomy in the system's error handling design: each variant
/// names a *kind* of failure, not a specific cause, so that the HTTP writer
/// can match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input from the HTTP client is malformed (bad UUID, missing query param).
    ClientError,
    /// Upstream reported `success=true, player=null`.
    PlayerNotFound,
    /// Identity upstream replied not-found for a username.
    UsernameNotFound,
    /// A local rate limiter refused admission.
    RateLimitExceeded,
    /// Upstream is flaky (429/5xx/gateway HTML) or our own window limiter
    /// refused the call — retrying later is reasonable.
    TemporarilyUnavailable,
    /// Unclassified failure, including parse errors on the upstream body.
    ServerError,
}

impl ErrorKind {
    /// The HTTP status this kind maps to at the port boundary.
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorKind::ClientError => 400,
            ErrorKind::PlayerNotFound => 404,
            ErrorKind::UsernameNotFound => 404,
            ErrorKind::RateLimitExceeded => 429,
            ErrorKind::TemporarilyUnavailable => 504,
            ErrorKind::ServerError => 500,
        }
    }

    /// Whether this kind is noisy/actionable enough to forward to the
    /// external error reporter.
    pub const fn should_report(self) -> bool {
        matches!(
            self,
            ErrorKind::ServerError | ErrorKind::TemporarilyUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ClientError => "client_error",
            ErrorKind::PlayerNotFound => "player_not_found",
            ErrorKind::UsernameNotFound => "username_not_found",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::TemporarilyUnavailable => "temporarily_unavailable",
            ErrorKind::ServerError => "server_error",
        };
        f.write_str(s)
    }
}

/// A single error flowing through the system, tagged with its [`ErrorKind`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FlashlightError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FlashlightError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn client_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientError, message)
    }

    pub fn player_not_found() -> Self {
        Self::new(ErrorKind::PlayerNotFound, "player not found")
    }

    pub fn username_not_found(username: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UsernameNotFound,
            format!("no such username: {username}"),
        )
    }

    pub fn rate_limit_exceeded() -> Self {
        Self::new(ErrorKind::RateLimitExceeded, "rate limit exceeded")
    }

    pub fn temporarily_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TemporarilyUnavailable, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Prefixes the message with `context` while keeping the kind, e.g. when
    /// a lower layer's message needs enriching with request context.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

/// Replaces UUIDs and `host:port` tuples in `message` with placeholders so the
/// sanitized string is safe to use as an alert-grouping fingerprint and safe
/// to log without leaking identifying information.
///
/// Per the error handling design: UUIDs become `<uuid>`, `ip:port` tuples
/// become `<host>`.
pub fn sanitize_message(message: &str) -> String {
    replace_host_ports(&replace_uuids(message))
}

fn replace_uuids(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if let Some(len) = uuid_len_at(&chars, i) {
            out.push_str("<uuid>");
            i += len;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Returns the length in chars of a canonical (36) or compact (32) UUID
/// candidate starting at `i`, if one is present and isn't part of a longer
/// run of hex-ish characters.
fn uuid_len_at(chars: &[char], i: usize) -> Option<usize> {
    let is_boundary = |idx: isize| -> bool {
        idx < 0 || idx as usize >= chars.len() || !chars[idx as usize].is_ascii_hexdigit()
    };

    for (len, dashed) in [(36usize, true), (32usize, false)] {
        if i + len > chars.len() {
            continue;
        }
        let candidate = &chars[i..i + len];
        let matches = if dashed {
            candidate.iter().enumerate().all(|(idx, c)| {
                if matches!(idx, 8 | 13 | 18 | 23) {
                    *c == '-'
                } else {
                    c.is_ascii_hexdigit()
                }
            })
        } else {
            candidate.iter().all(|c| c.is_ascii_hexdigit())
        };
        if matches && is_boundary(i as isize - 1) && is_boundary((i + len) as isize) {
            return Some(len);
        }
    }
    None
}

/// Replaces `host:port`-shaped substrings (a run of alphanumerics/`.`/`-`
/// followed by `:` and digits) with `<host>`.
fn replace_host_ports(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'-')
        {
            i += 1;
        }
        if i > start && i < bytes.len() && bytes[i] == b':' {
            let mut port_end = i + 1;
            while port_end < bytes.len() && bytes[port_end].is_ascii_digit() {
                port_end += 1;
            }
            if port_end > i + 1 {
                out.push_str("<host>");
                i = port_end;
                continue;
            }
        }
        if i == start {
            // No host run matched at `start`; copy one char and advance.
            let ch_len = input[start..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&input[start..start + ch_len]);
            i = start + ch_len;
        } else {
            out.push_str(&input[start..i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_maps_to_status() {
        assert_eq!(ErrorKind::ClientError.http_status(), 400);
        assert_eq!(ErrorKind::PlayerNotFound.http_status(), 404);
        assert_eq!(ErrorKind::UsernameNotFound.http_status(), 404);
        assert_eq!(ErrorKind::RateLimitExceeded.http_status(), 429);
        assert_eq!(ErrorKind::TemporarilyUnavailable.http_status(), 504);
        assert_eq!(ErrorKind::ServerError.http_status(), 500);
    }

    #[test]
    fn only_server_and_unavailable_are_reported() {
        assert!(ErrorKind::ServerError.should_report());
        assert!(ErrorKind::TemporarilyUnavailable.should_report());
        assert!(!ErrorKind::ClientError.should_report());
        assert!(!ErrorKind::PlayerNotFound.should_report());
        assert!(!ErrorKind::UsernameNotFound.should_report());
        assert!(!ErrorKind::RateLimitExceeded.should_report());
    }

    #[test]
    fn sanitize_replaces_dashed_uuid() {
        let msg = "player 1234abcd-1234-5678-9abc-1234567890ab not found";
        assert_eq!(sanitize_message(msg), "player <uuid> not found");
    }

    #[test]
    fn sanitize_replaces_compact_uuid() {
        let msg = "player 1234abcd123456789abc1234567890ab not found";
        assert_eq!(sanitize_message(msg), "player <uuid> not found");
    }

    #[test]
    fn sanitize_replaces_host_port() {
        let msg = "request from 192.0.2.7:54321 failed";
        assert_eq!(sanitize_message(msg), "request from <host> failed");
    }

    #[test]
    fn sanitize_is_idempotent_on_clean_message() {
        let msg = "upstream returned 500";
        assert_eq!(sanitize_message(msg), msg);
    }

    #[test]
    fn sanitize_handles_both_in_one_message() {
        let msg = "uuid 1234abcd-1234-5678-9abc-1234567890ab from 10.0.0.1:8080";
        assert_eq!(sanitize_message(msg), "uuid <uuid> from <host>");
    }
}
