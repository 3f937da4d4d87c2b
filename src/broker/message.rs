//! Message envelope
//!
//! This module defines the payload that travels from a publisher to every
//! subscriber of the channels it was published on.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// Content type used when a publisher does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// A published message
///
/// Cheap to clone: the payload is reference counted by `Bytes` and the
/// content type is shared, so every subscriber sees the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Raw payload, delivered verbatim
    pub payload: Bytes,
    /// Content type of the payload (e.g., "application/json")
    pub content_type: Arc<str>,
}

impl Message {
    /// Create a message with an explicit content type
    pub fn new(payload: impl Into<Bytes>, content_type: impl AsRef<str>) -> Self {
        Self {
            payload: payload.into(),
            content_type: Arc::from(content_type.as_ref()),
        }
    }

    /// Create a `text/plain` message
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, DEFAULT_CONTENT_TYPE)
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Number of leading characters kept when logging ids and payloads
const ABBREV_LEN: usize = 5;

/// Display adapter that only shows the first few characters of a value
///
/// Channel ids act as capabilities, so logs never carry them in full.
pub struct Abbrev<'a>(pub &'a [u8]);

impl<'a> Abbrev<'a> {
    pub fn str(s: &'a str) -> Self {
        Self(s.as_bytes())
    }
}

impl fmt::Display for Abbrev<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(self.0);
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(ABBREV_LEN).collect();
        if chars.next().is_some() {
            write!(f, "{}...", head)
        } else {
            write!(f, "{}", head)
        }
    }
}

/// Display adapter for a list of channel ids, each abbreviated
pub struct AbbrevList<'a>(pub &'a [String]);

impl fmt::Display for AbbrevList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Abbrev::str(id))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message() {
        let msg = Message::text("hello");
        assert_eq!(&*msg.content_type, "text/plain");
        assert_eq!(msg.len(), 5);
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_clone_shares_payload() {
        let msg = Message::new(Bytes::from_static(b"{}"), "application/json");
        let copy = msg.clone();
        assert_eq!(msg.payload.as_ptr(), copy.payload.as_ptr());
        assert!(Arc::ptr_eq(&msg.content_type, &copy.content_type));
    }

    #[test]
    fn test_abbrev() {
        assert_eq!(Abbrev::str("abc").to_string(), "abc");
        assert_eq!(Abbrev::str("abcde").to_string(), "abcde");
        assert_eq!(Abbrev::str("abcdefgh").to_string(), "abcde...");
        // Multi-byte characters are never split
        assert_eq!(Abbrev::str("ääääää").to_string(), "äääää...");
    }

    #[test]
    fn test_abbrev_list() {
        let ids = vec!["news".to_string(), "weather-updates".to_string()];
        assert_eq!(AbbrevList(&ids).to_string(), "[news, weath...]");
    }
}
