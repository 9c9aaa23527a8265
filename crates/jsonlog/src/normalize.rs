//! Text normalization for untrusted payloads.
//!
//! Everything the recorders store as text goes through [`TextNormalizer::fix`]:
//! bytes are decoded with the detected encoding, newlines are removed and
//! surrounding whitespace trimmed. When the encoding cannot be detected or the
//! bytes are malformed for it, a replacing UTF-8 decode is used instead.

use std::borrow::Cow;
use thug_core::encoding::{decode_strict, ChardetDetector, EncodingDetector};

/// A payload as handed over by an analysis subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl Payload<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(s) => s.is_empty(),
            Payload::Bytes(b) => b.is_empty(),
        }
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(s: &'a str) -> Self {
        Payload::Text(s)
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(s: &'a String) -> Self {
        Payload::Text(s.as_str())
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(b: &'a [u8]) -> Self {
        Payload::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Payload<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Payload::Bytes(b.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Payload::Bytes(b.as_slice())
    }
}

pub struct TextNormalizer {
    detector: Box<dyn EncodingDetector>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(Box::new(ChardetDetector))
    }
}

impl TextNormalizer {
    pub fn new(detector: Box<dyn EncodingDetector>) -> Self {
        Self { detector }
    }

    /// Absent stays absent
    pub fn fix_opt(&self, payload: Option<Payload<'_>>) -> Option<String> {
        payload.map(|p| self.fix(p))
    }

    pub fn fix(&self, payload: Payload<'_>) -> String {
        let text = match payload {
            Payload::Text(s) => Cow::Borrowed(s),
            Payload::Bytes(bytes) => self.decode(bytes),
        };
        strip(&text)
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        let decoded = self
            .detector
            .detect(bytes)
            .and_then(|d| decode_strict(bytes, &d.encoding));

        match decoded {
            Some(text) => text,
            None => {
                tracing::debug!(len = bytes.len(), "encoding detection failed, lossy decode");
                String::from_utf8_lossy(bytes)
            }
        }
    }
}

fn strip(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}
