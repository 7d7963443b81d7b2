//! Canonical UUID normalization.
//!
//! A canonical UUID is 32 lowercase hex digits with dashes at positions
//! 8, 13, 18, 23 (length 36). Input is accepted either in that dashed form or
//! as a 32-character compact hex string (no dashes); anything else is
//! rejected. Case is folded to lowercase.

use crate::error::FlashlightError;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

const DASH_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// A UUID known to be in canonical form: 36 lowercase hex characters with
/// dashes at positions 8, 13, 18 and 23.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUuid(String);

impl CanonicalUuid {
    /// Normalizes `input`, accepting either the 36-char dashed form or the
    /// 32-char compact form, case-insensitively.
    ///
    /// Rejects any non-hex, non-dash character, and rejects dashes in any
    /// position other than the canonical ones.
    pub fn parse(input: &str) -> Result<Self, FlashlightError> {
        match input.len() {
            36 => Self::parse_dashed(input),
            32 => Self::parse_compact(input),
            other => Err(FlashlightError::client_error(format!(
                "invalid uuid length {other}, expected 32 or 36"
            ))),
        }
    }

    fn parse_compact(input: &str) -> Result<Self, FlashlightError> {
        if !input.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FlashlightError::client_error(
                "uuid contains non-hex characters",
            ));
        }
        let lower = input.to_ascii_lowercase();
        Ok(Self(dash(&lower)))
    }

    fn parse_dashed(input: &str) -> Result<Self, FlashlightError> {
        for (i, b) in input.bytes().enumerate() {
            let expect_dash = DASH_POSITIONS.contains(&i);
            if expect_dash {
                if b != b'-' {
                    return Err(FlashlightError::client_error(
                        "uuid missing dash at expected position",
                    ));
                }
            } else if !b.is_ascii_hexdigit() {
                return Err(FlashlightError::client_error(
                    "uuid contains non-hex characters",
                ));
            }
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    /// The canonical 36-character string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 32-character compact form (dashes removed), e.g. for building
    /// upstream query parameters that expect it.
    pub fn to_compact(&self) -> String {
        self.0.chars().filter(|&c| c != '-').collect()
    }
}

impl fmt::Display for CanonicalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt;

impl Serialize for CanonicalUuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CanonicalUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CanonicalUuid::parse(&raw).map_err(de::Error::custom)
    }
}

fn dash(compact: &str) -> String {
    let mut out = String::with_capacity(36);
    for (i, c) in compact.chars().enumerate() {
        if DASH_POSITIONS.contains(&i) {
            out.push('-');
        }
        out.push(c);
    }
    out
}
