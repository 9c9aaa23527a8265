//! Byte encoding detection for payloads of unknown origin

use encoding_rs::Encoding;
use std::borrow::Cow;

/// Result of a detection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// WHATWG encoding label, e.g. "UTF-8", "windows-1252"
    pub encoding: String,
}

/// Anything that can guess the encoding of a byte payload.
/// Returns None when no guess can be made.
pub trait EncodingDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection>;
}

/// BOM sniffing, then chardetng statistical detection
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl EncodingDetector for ChardetDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection> {
        if let Some((enc, _)) = Encoding::for_bom(bytes) {
            return Some(Detection {
                encoding: enc.name().to_string(),
            });
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        let enc = detector.guess(None, true);
        Some(Detection {
            encoding: enc.name().to_string(),
        })
    }
}

/// Detector that never produces a guess
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetector;

impl EncodingDetector for NoDetector {
    fn detect(&self, _bytes: &[u8]) -> Option<Detection> {
        None
    }
}

/// Strict decode with the encoding named by `label`.
/// None if the label is unknown or the bytes are malformed for it.
pub fn decode_strict<'a>(bytes: &'a [u8], label: &str) -> Option<Cow<'a, str>> {
    let enc = Encoding::for_label(label.as_bytes())?;
    let (bom_enc, bom_len) = Encoding::for_bom(bytes).unwrap_or((enc, 0));
    if bom_enc != enc {
        return None;
    }
    enc.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
}
