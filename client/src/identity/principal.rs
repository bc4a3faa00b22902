//! # Principals
//!
//! A [`Principal`] is the network's notion of "who": an opaque byte string
//! of at most 29 bytes identifying a user keypair, a deployed service, or
//! one of the two well-known built-ins (the anonymous caller and the
//! empty management id). The human form is a checksummed base32 rendering
//! grouped by dashes, e.g. `ryjl3-tyaaa-aaaaa-aaaba-cai`.
//!
//! ## Design Decisions
//!
//! - **Checksum first, meaning second.** The textual form prepends a
//!   CRC-32 over the raw bytes before base32-encoding, so a single typo'd
//!   character fails fast locally instead of sending funds into the void.
//! - **Canonical or rejected.** Parsing lowercases its input (typing case
//!   is not a user error) but then re-encodes the decoded bytes and
//!   demands an exact match. Wrong dash grouping and non-canonical
//!   padding bits are errors, so every principal has exactly one accepted
//!   spelling.
//! - **Strings for humans, bytes for machines.** Serde emits the textual
//!   form in human-readable formats and the raw bytes in binary ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a principal's raw byte form.
pub const MAX_PRINCIPAL_LEN: usize = 29;

/// Errors produced when parsing or constructing a principal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalError {
    /// The textual input was empty.
    #[error("principal text is empty")]
    Empty,

    /// The textual input contained a character outside base32 and `-`.
    #[error("principal '{input}' contains invalid character '{found}'")]
    InvalidCharacter {
        /// The rejected input.
        input: String,
        /// The first offending character.
        found: char,
    },

    /// The decoded form is shorter than the 4-byte checksum prefix.
    #[error("principal '{input}' is too short to carry a checksum")]
    TooShort {
        /// The rejected input.
        input: String,
    },

    /// The raw byte form exceeds [`MAX_PRINCIPAL_LEN`].
    #[error("principal data is {got} bytes, the maximum is {max}")]
    TooLong {
        /// Length of the rejected data.
        got: usize,
        /// The permitted maximum.
        max: usize,
    },

    /// The embedded CRC-32 does not match the decoded bytes.
    #[error("principal '{input}' fails its checksum")]
    ChecksumMismatch {
        /// The rejected input.
        input: String,
    },

    /// The input decoded but is not the canonical spelling of its bytes
    /// (wrong dash grouping or non-zero padding bits).
    #[error("principal '{input}' is not in canonical form")]
    NotCanonical {
        /// The rejected input.
        input: String,
    },
}

// ---------------------------------------------------------------------------
// CRC-32 (ISO-HDLC, the zlib polynomial)
// ---------------------------------------------------------------------------

const CRC32_TABLE: [u32; 256] = build_crc32_table();

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        let index = ((crc ^ b as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Base32 (RFC 4648 alphabet, lowercase, no padding)
// ---------------------------------------------------------------------------

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &b in bytes {
        buffer = (buffer << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        // Final partial group, left-aligned with zero padding bits.
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn base32_decode_char(c: char) -> Option<u32> {
    match c {
        'a'..='z' => Some(c as u32 - 'a' as u32),
        '2'..='7' => Some(c as u32 - '2' as u32 + 26),
        _ => None,
    }
}

/// Decodes ungrouped base32 text, dropping any trailing padding bits.
/// Non-canonical padding is caught later by the re-encode comparison.
fn base32_decode(text: &str, original: &str) -> Result<Vec<u8>, PrincipalError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.chars() {
        let value = base32_decode_char(c).ok_or_else(|| PrincipalError::InvalidCharacter {
            input: original.to_string(),
            found: c,
        })?;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xFF) as u8);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An identity on the network: at most 29 opaque bytes with a checksummed
/// textual form.
///
/// # Examples
///
/// ```
/// use zenith_client::identity::Principal;
///
/// let ledger: Principal = "ryjl3-tyaaa-aaaaa-aaaba-cai".parse().unwrap();
/// assert_eq!(ledger.to_text(), "ryjl3-tyaaa-aaaaa-aaaba-cai");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal {
    bytes: Vec<u8>,
}

impl Principal {
    /// The anonymous principal: the caller you are before logging in.
    pub fn anonymous() -> Self {
        Principal { bytes: vec![0x04] }
    }

    /// The zero-byte management principal, textual form `aaaaa-aa`.
    pub fn management() -> Self {
        Principal { bytes: Vec::new() }
    }

    /// Wraps raw principal bytes, enforcing the length cap.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_PRINCIPAL_LEN {
            return Err(PrincipalError::TooLong {
                got: bytes.len(),
                max: MAX_PRINCIPAL_LEN,
            });
        }
        Ok(Principal {
            bytes: bytes.to_vec(),
        })
    }

    /// Derives the principal a public key authenticates as: the key's
    /// 28-byte digest followed by the self-authenticating tag byte.
    pub fn self_authenticating(public_key: &[u8]) -> Self {
        let digest = blake3::hash(public_key);
        let mut bytes = digest.as_bytes()[..28].to_vec();
        bytes.push(0x02);
        Principal { bytes }
    }

    /// Parses the checksummed textual form.
    ///
    /// Case-insensitive on input, strict about everything else: the
    /// checksum must match and the spelling must be canonical.
    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let lowered = text.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err(PrincipalError::Empty);
        }

        let ungrouped: String = lowered.chars().filter(|&c| c != '-').collect();
        let decoded = base32_decode(&ungrouped, &lowered)?;
        if decoded.len() < 4 {
            return Err(PrincipalError::TooShort { input: lowered });
        }

        let (checksum_bytes, data) = decoded.split_at(4);
        if data.len() > MAX_PRINCIPAL_LEN {
            return Err(PrincipalError::TooLong {
                got: data.len(),
                max: MAX_PRINCIPAL_LEN,
            });
        }

        let expected = u32::from_be_bytes([
            checksum_bytes[0],
            checksum_bytes[1],
            checksum_bytes[2],
            checksum_bytes[3],
        ]);
        if crc32(data) != expected {
            return Err(PrincipalError::ChecksumMismatch { input: lowered });
        }

        let principal = Principal {
            bytes: data.to_vec(),
        };
        // One spelling per principal: re-encode and demand an exact match.
        if principal.to_text() != lowered {
            return Err(PrincipalError::NotCanonical { input: lowered });
        }
        Ok(principal)
    }

    /// Renders the canonical textual form.
    pub fn to_text(&self) -> String {
        let mut framed = crc32(&self.bytes).to_be_bytes().to_vec();
        framed.extend_from_slice(&self.bytes);
        let encoded = base32_encode(&framed);

        let mut out = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }

    /// The raw byte form.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` for the anonymous principal.
    pub fn is_anonymous(&self) -> bool {
        self.bytes == [0x04]
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Principal::from_text(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(&self.to_text())
        } else {
            serializer.serialize_bytes(&self.bytes)
        }
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            Principal::from_text(&text).map_err(D::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Principal::from_bytes(&bytes).map_err(D::Error::custom)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_principal_is_aaaaa_aa() {
        assert_eq!(Principal::management().to_text(), "aaaaa-aa");
        let parsed = Principal::from_text("aaaaa-aa").unwrap();
        assert!(parsed.as_slice().is_empty());
    }

    #[test]
    fn anonymous_principal_is_2vxsx_fae() {
        assert_eq!(Principal::anonymous().to_text(), "2vxsx-fae");
        let parsed = Principal::from_text("2vxsx-fae").unwrap();
        assert!(parsed.is_anonymous());
        assert_eq!(parsed.as_slice(), [0x04]);
    }

    #[test]
    fn well_known_service_id_round_trips() {
        let text = "ryjl3-tyaaa-aaaaa-aaaba-cai";
        let parsed = Principal::from_text(text).unwrap();
        assert_eq!(parsed.as_slice(), [0, 0, 0, 0, 0, 0, 0, 2, 1, 1]);
        assert_eq!(parsed.to_text(), text);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        let upper = Principal::from_text("RYJL3-TYAAA-AAAAA-AAABA-CAI").unwrap();
        let lower = Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap();
        assert_eq!(upper, lower);
        // But the canonical rendering is always lowercase.
        assert_eq!(upper.to_text(), "ryjl3-tyaaa-aaaaa-aaaba-cai");
    }

    #[test]
    fn bytes_round_trip_through_text() {
        for data in [
            vec![],
            vec![0x04],
            vec![0xAB],
            vec![1, 2, 3, 4, 5],
            vec![0xFF; MAX_PRINCIPAL_LEN],
        ] {
            let principal = Principal::from_bytes(&data).unwrap();
            let reparsed = Principal::from_text(&principal.to_text()).unwrap();
            assert_eq!(reparsed, principal, "data {:?}", data);
        }
    }

    #[test]
    fn self_authenticating_is_29_bytes_tagged() {
        let principal = Principal::self_authenticating(b"some public key bytes");
        assert_eq!(principal.as_slice().len(), 29);
        assert_eq!(principal.as_slice()[28], 0x02);
        // Deterministic: same key, same principal.
        assert_eq!(principal, Principal::self_authenticating(b"some public key bytes"));
        assert_ne!(principal, Principal::self_authenticating(b"another key"));
    }

    #[test]
    fn rejects_empty_text() {
        assert_eq!(Principal::from_text(""), Err(PrincipalError::Empty));
        assert_eq!(Principal::from_text("   "), Err(PrincipalError::Empty));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!(
            Principal::from_text("2vxsx-fa!"),
            Err(PrincipalError::InvalidCharacter { found: '!', .. })
        ));
        // '0' and '1' are not in the base32 alphabet.
        assert!(matches!(
            Principal::from_text("0vxsx-fae"),
            Err(PrincipalError::InvalidCharacter { found: '0', .. })
        ));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        // Any single-character corruption of a valid principal must fail:
        // either the checksum breaks or the spelling stops being canonical.
        assert!(Principal::from_text("syjl3-tyaaa-aaaaa-aaaba-cai").is_err());
        assert!(Principal::from_text("2vxsx-faf").is_err());
    }

    #[test]
    fn rejects_wrong_dash_grouping() {
        // Same characters as the anonymous principal, dashes misplaced.
        assert_eq!(
            Principal::from_text("2vxs-xfae"),
            Err(PrincipalError::NotCanonical {
                input: "2vxs-xfae".to_string()
            })
        );
        assert_eq!(
            Principal::from_text("2vxsxfae"),
            Err(PrincipalError::NotCanonical {
                input: "2vxsxfae".to_string()
            })
        );
    }

    #[test]
    fn rejects_truncated_text() {
        assert!(matches!(
            Principal::from_text("aa"),
            Err(PrincipalError::TooShort { .. })
        ));
    }

    #[test]
    fn rejects_oversized_data() {
        let err = Principal::from_bytes(&[0u8; 30]).unwrap_err();
        assert_eq!(
            err,
            PrincipalError::TooLong {
                got: 30,
                max: MAX_PRINCIPAL_LEN
            }
        );
    }

    #[test]
    fn json_uses_textual_form() {
        let principal = Principal::anonymous();
        let json = serde_json::to_string(&principal).unwrap();
        assert_eq!(json, "\"2vxsx-fae\"");
        let recovered: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, principal);
    }

    #[test]
    fn json_rejects_malformed_text() {
        assert!(serde_json::from_str::<Principal>("\"not-a-principal\"").is_err());
    }

    #[test]
    fn bincode_uses_raw_bytes() {
        let principal = Principal::self_authenticating(b"serde test key");
        let bytes = bincode::serialize(&principal).unwrap();
        let recovered: Principal = bincode::deserialize(&bytes).unwrap();
        assert_eq!(recovered, principal);
    }
}
