//! CAS response error types and failure codes.
//!
//! This module provides:
//! - [`FailureCode`]: The failure codes defined by the CAS protocol
//! - [`FormatError`]: Timestamp parse failures
//! - [`DecodeError`]: Failures while parsing a document
//! - [`EncodeError`]: Failures while writing a document

use std::str::FromStr;

/// CAS authentication failure codes, matching the codes defined in the CAS protocol.
///
/// [`AuthenticationFailure`](crate::AuthenticationFailure) stores its code as a
/// plain string so that codes from newer servers survive a decode/encode cycle;
/// this enum covers the codes the protocol defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureCode {
    InvalidRequest,
    InvalidTicketSpec,
    UnauthorizedService,
    UnauthorizedServiceProxy,
    InvalidProxyCallback,
    InvalidTicket,
    InvalidService,
    InternalError,
}

impl FailureCode {
    /// Get the wire representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::InvalidRequest => "INVALID_REQUEST",
            FailureCode::InvalidTicketSpec => "INVALID_TICKET_SPEC",
            FailureCode::UnauthorizedService => "UNAUTHORIZED_SERVICE",
            FailureCode::UnauthorizedServiceProxy => "UNAUTHORIZED_SERVICE_PROXY",
            FailureCode::InvalidProxyCallback => "INVALID_PROXY_CALLBACK",
            FailureCode::InvalidTicket => "INVALID_TICKET",
            FailureCode::InvalidService => "INVALID_SERVICE",
            FailureCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FailureCode> for String {
    fn from(code: FailureCode) -> Self {
        code.as_str().to_owned()
    }
}

/// Error returned when parsing a [`FailureCode`] from a string fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFailureCodeError(());

impl std::fmt::Display for ParseFailureCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown CAS failure code")
    }
}

impl std::error::Error for ParseFailureCodeError {}

impl FromStr for FailureCode {
    type Err = ParseFailureCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID_REQUEST" => Ok(FailureCode::InvalidRequest),
            "INVALID_TICKET_SPEC" => Ok(FailureCode::InvalidTicketSpec),
            "UNAUTHORIZED_SERVICE" => Ok(FailureCode::UnauthorizedService),
            "UNAUTHORIZED_SERVICE_PROXY" => Ok(FailureCode::UnauthorizedServiceProxy),
            "INVALID_PROXY_CALLBACK" => Ok(FailureCode::InvalidProxyCallback),
            "INVALID_TICKET" => Ok(FailureCode::InvalidTicket),
            "INVALID_SERVICE" => Ok(FailureCode::InvalidService),
            "INTERNAL_ERROR" => Ok(FailureCode::InternalError),
            _ => Err(ParseFailureCodeError(())),
        }
    }
}

/// A timestamp that is not RFC3339 once its zone-id annotation is removed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("invalid CAS timestamp {input:?}: {source}")]
pub struct FormatError {
    /// The raw value as found in the document.
    pub input: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Errors produced while decoding a `serviceResponse` document.
///
/// Decoding is all-or-nothing: when any of these is returned, no partially
/// populated response is handed back.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The byte stream is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The byte stream is not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The root element is not `serviceResponse`.
    #[error("unexpected root element <{0}>, expected <serviceResponse>")]
    UnexpectedRoot(String),

    /// The root element is not in the CAS namespace.
    #[error("serviceResponse is not in the http://www.yale.edu/tp/cas namespace")]
    WrongNamespace,

    /// Neither `authenticationSuccess` nor `authenticationFailure` is present.
    #[error("serviceResponse has no authenticationSuccess or authenticationFailure")]
    MissingOutcome,

    /// More than one authentication outcome is present.
    #[error("serviceResponse has more than one authentication outcome")]
    ConflictingOutcome,

    /// A boolean element holds something other than a boolean.
    #[error("invalid boolean {value:?} in <{element}>")]
    InvalidBool { element: &'static str, value: String },

    /// The `authenticationDate` element could not be parsed.
    #[error(transparent)]
    Timestamp(#[from] FormatError),

    /// The document is larger than the configured limit.
    #[error("document size {size} bytes exceeds maximum allowed size of {max} bytes")]
    TooLarge { size: usize, max: usize },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(err: quick_xml::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DecodeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for DecodeError {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// Errors produced while encoding a response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Writing to the output buffer failed.
    #[error("write failed: {0}")]
    Io(String),

    /// An extension element name is not a valid unprefixed XML name.
    #[error("invalid element name {0:?}")]
    InvalidName(String),

    /// An `authenticationDate` whose year has no four-digit RFC3339 form.
    #[error("authenticationDate {0} is outside RFC3339 years 0000-9999")]
    DateOutOfRange(chrono::DateTime<chrono::Utc>),

    /// A character that XML 1.0 does not allow.
    #[error("invalid XML character U+{code:04X} in <{element}>")]
    InvalidCharacter { element: String, code: u32 },
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err.to_string())
    }
}
