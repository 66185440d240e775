//! Bech32 LNURL encoding (LUD-01).
//!
//! An LNURL is a URL encoded as bech32 with the `lnurl` human-readable part,
//! conventionally upper-cased so it fits QR alphanumeric mode.
//!
//! Long pay links exceed the bech32 code length, so [`Lnurl`] keeps
//! the bech32 checksum but lifts the code length limit.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Checksum, Hrp};

use crate::error::LnurlError;

/// Human-readable part of every LNURL.
pub const LNURL_HRP: &str = "lnurl";

/// Bech32 checksum without a length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lnurl {}

impl Checksum for Lnurl {
    type MidstateRepr = u32;
    const CODE_LENGTH: usize = usize::MAX;
    const CHECKSUM_LENGTH: usize = 6;
    const GENERATOR_SH: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];
    const TARGET_RESIDUE: u32 = 1;
}

/// Encodes `url` as an upper-case LNURL.
///
/// # Errors
///
/// Returns [`LnurlError::Encoding`] if the human-readable part is rejected.
pub fn encode(url: &str) -> Result<String, LnurlError> {
    let hrp = Hrp::parse(LNURL_HRP).map_err(|e| LnurlError::Encoding(e.to_string()))?;
    let encoded = bech32::encode::<Lnurl>(hrp, url.as_bytes())
        .map_err(|e| LnurlError::Encoding(e.to_string()))?;
    Ok(encoded.to_uppercase())
}

/// Decodes an LNURL, in either case, back to its URL.
///
/// # Errors
///
/// Returns [`LnurlError::Encoding`] on a bad checksum, a foreign
/// human-readable part, or a payload that is not UTF-8.
pub fn decode(lnurl: &str) -> Result<String, LnurlError> {
    let lnurl = lnurl.trim();
    let lnurl = lnurl
        .strip_prefix("lightning:")
        .or_else(|| lnurl.strip_prefix("LIGHTNING:"))
        .unwrap_or(lnurl);
    let checked = CheckedHrpstring::new::<Lnurl>(lnurl)
        .map_err(|e| LnurlError::Encoding(e.to_string()))?;
    let hrp = checked.hrp();
    if hrp.to_lowercase() != LNURL_HRP {
        return Err(LnurlError::Encoding(format!(
            "unexpected human-readable part: {hrp}"
        )));
    }
    String::from_utf8(checked.byte_iter().collect())
        .map_err(|e| LnurlError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_uppercase_lnurl() {
        let encoded = encode("https://pay.example.com/lnurlp/nwc").unwrap();
        assert!(encoded.starts_with("LNURL1"));
        assert_eq!(encoded, encoded.to_uppercase());
    }

    #[test]
    fn test_decode_recovers_url() {
        let url = "https://pay.example.com/lnurlp/nwc?amount=21&description=hi";
        let encoded = encode(url).unwrap();
        assert_eq!(decode(&encoded).unwrap(), url);
        assert_eq!(decode(&encoded.to_lowercase()).unwrap(), url);
        assert_eq!(decode(&format!("lightning:{encoded}")).unwrap(), url);
    }

    #[test]
    fn test_long_urls_round_trip() {
        let url = format!(
            "https://pay.example.com/lnurlp/nwc?description={}",
            "a".repeat(700)
        );
        let encoded = encode(&url).unwrap();
        assert!(encoded.len() > 1023);
        assert_eq!(decode(&encoded).unwrap(), url);
    }

    #[test]
    fn test_matches_bech32_below_the_limit() {
        let hrp = Hrp::parse(LNURL_HRP).unwrap();
        let url = "https://pay.example.com/.well-known/lnurlp/nwc";
        assert_eq!(
            encode(url).unwrap(),
            bech32::encode::<bech32::Bech32>(hrp, url.as_bytes())
                .unwrap()
                .to_uppercase()
        );
    }

    #[test]
    fn test_decode_rejects_foreign_hrp() {
        let hrp = Hrp::parse("lnbc").unwrap();
        let other = bech32::encode::<Lnurl>(hrp, b"https://x").unwrap();
        assert!(matches!(decode(&other), Err(LnurlError::Encoding(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("LNURL1NOTVALID").is_err());
    }
}
