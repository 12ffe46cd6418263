//! Bounds on inbound `serviceResponse` documents.
//!
//! A CAS client decodes whatever `/serviceValidate` or `/proxyValidate`
//! returned. Those bodies are small: a user, a PGT IOU, a proxy chain and a
//! handful of released attributes. [`DocumentLimits`] lets the decoder refuse
//! a body that is far outside that shape before spending any parsing work on
//! it.

use crate::error::DecodeError;

/// Default ceiling for a validation response body (4 MB).
///
/// Large attribute releases (group memberships, certificates) stay well
/// below this.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 4 * 1024 * 1024;

/// Size ceiling applied by [`decode_with_limits`](crate::decode_with_limits).
///
/// ```rust
/// use cas_response::{DocumentLimits, decode_with_limits};
///
/// let body = br#"<serviceResponse xmlns="http://www.yale.edu/tp/cas">
///   <authenticationSuccess><user>jdoe</user></authenticationSuccess>
/// </serviceResponse>"#;
///
/// // A client that only ever validates service tickets can be strict.
/// let response = decode_with_limits(body, DocumentLimits::new(64 * 1024)).unwrap();
/// assert_eq!(response.user(), Some("jdoe"));
///
/// // Trusted in-process documents need no ceiling.
/// assert!(decode_with_limits(body, DocumentLimits::unlimited()).is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentLimits {
    /// `None` disables the check.
    max_document_size: Option<usize>,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_SIZE)
    }
}

impl DocumentLimits {
    /// Refuse documents longer than `max_document_size` bytes.
    pub fn new(max_document_size: usize) -> Self {
        Self {
            max_document_size: Some(max_document_size),
        }
    }

    /// Accept documents of any length.
    pub fn unlimited() -> Self {
        Self {
            max_document_size: None,
        }
    }

    pub fn max_document_size(&self) -> Option<usize> {
        self.max_document_size
    }

    /// Compare a body length against the ceiling.
    ///
    /// Runs on the raw byte length, ahead of UTF-8 validation and XML parsing.
    pub fn check_size(&self, size: usize) -> Result<(), DecodeError> {
        match self.max_document_size {
            Some(max) if size > max => {
                tracing::debug!(size, max, "refusing oversized CAS validation response");
                Err(DecodeError::TooLarge { size, max })
            }
            _ => Ok(()),
        }
    }
}
