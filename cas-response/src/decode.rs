//! Parsing `serviceResponse` documents.
//!
//! The root must be `serviceResponse` in the CAS namespace; whether the
//! namespace is the default one or bound to a prefix (`cas:`) does not
//! matter. Below the root, elements are matched by local name.
//!
//! Each block with an extension point (`authenticationSuccess`,
//! `attributes`, `userAttributes`) routes children it does not know into its
//! extension list, in document order, instead of rejecting them.

use std::str;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::encode::CAS_NAMESPACE;
use crate::error::DecodeError;
use crate::limits::DocumentLimits;
use crate::model::{
    AnyAttribute, Attributes, AuthenticationFailure, AuthenticationSuccess, NamedAttribute,
    ServiceResponse, UserAttributes,
};
use crate::timestamp;

/// Decode a `serviceResponse` document using [`DocumentLimits::default`].
pub fn decode(bytes: &[u8]) -> Result<ServiceResponse, DecodeError> {
    decode_with_limits(bytes, DocumentLimits::default())
}

/// Decode a `serviceResponse` document.
///
/// # Errors
/// - [`DecodeError::TooLarge`] if `bytes` exceeds `limits`
/// - [`DecodeError::Malformed`] / [`DecodeError::Encoding`] for unparsable input
/// - [`DecodeError::MissingOutcome`] / [`DecodeError::ConflictingOutcome`] unless
///   exactly one of `authenticationSuccess` and `authenticationFailure` is present
/// - [`DecodeError::Timestamp`] for an unparsable `authenticationDate`
pub fn decode_with_limits(
    bytes: &[u8],
    limits: DocumentLimits,
) -> Result<ServiceResponse, DecodeError> {
    limits.check_size(bytes.len())?;
    let xml = str::from_utf8(bytes)?;

    let response = XmlDecoder::new(xml).document()?;
    tracing::trace!(
        bytes = bytes.len(),
        success = response.is_success(),
        "decoded CAS service response"
    );
    Ok(response)
}

/// A child element whose start tag has been consumed.
struct Child<'a> {
    start: BytesStart<'a>,
    /// `<tag/>`: there is no content and no end tag to consume.
    empty: bool,
}

impl Child<'_> {
    fn name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }
}

struct XmlDecoder<'a> {
    reader: NsReader<&'a [u8]>,
}

impl<'a> XmlDecoder<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: NsReader::from_str(xml),
        }
    }

    fn document(&mut self) -> Result<ServiceResponse, DecodeError> {
        loop {
            let (namespace, event) = self.reader.read_resolved_event()?;
            let (start, empty) = match event {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::Eof => {
                    return Err(DecodeError::Malformed("document has no root element".into()));
                }
                // Declaration, doctype, comments, processing instructions, whitespace.
                _ => continue,
            };

            if start.local_name().as_ref() != b"serviceResponse" {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                return Err(DecodeError::UnexpectedRoot(name));
            }
            let in_cas_namespace = matches!(
                namespace,
                ResolveResult::Bound(Namespace(ns)) if ns == CAS_NAMESPACE.as_bytes()
            );
            if !in_cas_namespace {
                return Err(DecodeError::WrongNamespace);
            }

            return self.service_response(&Child { start, empty });
        }
    }

    fn service_response(&mut self, root: &Child<'a>) -> Result<ServiceResponse, DecodeError> {
        if root.empty {
            return Err(DecodeError::MissingOutcome);
        }

        let mut outcome = None;
        while let Some(child) = self.next_child()? {
            let decoded = match child.name() {
                b"authenticationFailure" => ServiceResponse::Failure(self.failure(&child)?),
                b"authenticationSuccess" => ServiceResponse::Success(self.success(&child)?),
                _ => {
                    self.skip(&child)?;
                    continue;
                }
            };
            if outcome.replace(decoded).is_some() {
                return Err(DecodeError::ConflictingOutcome);
            }
        }

        outcome.ok_or(DecodeError::MissingOutcome)
    }

    fn failure(&mut self, element: &Child<'a>) -> Result<AuthenticationFailure, DecodeError> {
        Ok(AuthenticationFailure {
            code: attribute(&element.start, b"code")?.unwrap_or_default(),
            message: self.inner_markup(element)?,
        })
    }

    fn success(&mut self, element: &Child<'a>) -> Result<AuthenticationSuccess, DecodeError> {
        let mut success = AuthenticationSuccess::default();
        if element.empty {
            return Ok(success);
        }

        while let Some(child) = self.next_child()? {
            match child.name() {
                b"user" => success.user = self.text(&child)?,
                b"proxyGrantingTicket" => {
                    let pgt = self.text(&child)?;
                    success.proxy_granting_ticket = (!pgt.is_empty()).then_some(pgt);
                }
                b"proxies" => {
                    let proxies = success.proxies.get_or_insert_with(Vec::new);
                    self.proxies(&child, proxies)?;
                }
                b"attributes" => {
                    let attributes = success.attributes.get_or_insert_with(Attributes::default);
                    self.attributes(&child, attributes)?;
                }
                _ => success.extra_attributes.push(self.extension(&child)?),
            }
        }

        Ok(success)
    }

    fn proxies(
        &mut self,
        element: &Child<'a>,
        proxies: &mut Vec<String>,
    ) -> Result<(), DecodeError> {
        if element.empty {
            return Ok(());
        }

        while let Some(child) = self.next_child()? {
            if child.name() == b"proxy" {
                proxies.push(self.text(&child)?);
            } else {
                self.skip(&child)?;
            }
        }
        Ok(())
    }

    fn attributes(
        &mut self,
        element: &Child<'a>,
        attributes: &mut Attributes,
    ) -> Result<(), DecodeError> {
        if element.empty {
            return Ok(());
        }

        while let Some(child) = self.next_child()? {
            match child.name() {
                b"authenticationDate" => {
                    let raw = self.text(&child)?;
                    attributes.authentication_date = Some(timestamp::parse(&raw)?);
                }
                b"longTermAuthenticationRequestTokenUsed" => {
                    let raw = self.text(&child)?;
                    attributes.long_term_authentication_request_token_used =
                        parse_bool("longTermAuthenticationRequestTokenUsed", &raw)?;
                }
                b"isFromNewLogin" => {
                    let raw = self.text(&child)?;
                    attributes.is_from_new_login = parse_bool("isFromNewLogin", &raw)?;
                }
                b"memberOf" => attributes.member_of.push(self.text(&child)?),
                b"userAttributes" => {
                    let user_attributes = attributes
                        .user_attributes
                        .get_or_insert_with(UserAttributes::default);
                    self.user_attributes(&child, user_attributes)?;
                }
                _ => attributes.extra_attributes.push(self.extension(&child)?),
            }
        }
        Ok(())
    }

    fn user_attributes(
        &mut self,
        element: &Child<'a>,
        user_attributes: &mut UserAttributes,
    ) -> Result<(), DecodeError> {
        if element.empty {
            return Ok(());
        }

        while let Some(child) = self.next_child()? {
            if child.name() == b"attribute" {
                user_attributes.attributes.push(NamedAttribute {
                    name: attribute(&child.start, b"name")?,
                    value: self.inner_markup(&child)?,
                });
            } else {
                user_attributes.any_attributes.push(self.extension(&child)?);
            }
        }
        Ok(())
    }

    fn extension(&mut self, element: &Child<'a>) -> Result<AnyAttribute, DecodeError> {
        let name = str::from_utf8(element.name())?.to_owned();
        tracing::debug!(element = %name, "captured unrecognized CAS element");
        Ok(AnyAttribute {
            value: self.text(element)?,
            name,
        })
    }

    /// Next child element of the current element, or `None` once its end tag
    /// has been consumed. Text between child elements is ignored.
    fn next_child(&mut self) -> Result<Option<Child<'a>>, DecodeError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(start) => return Ok(Some(Child { start, empty: false })),
                Event::Empty(start) => return Ok(Some(Child { start, empty: true })),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Character data directly inside `element`; nested elements are skipped.
    fn text(&mut self, element: &Child<'a>) -> Result<String, DecodeError> {
        let mut text = String::new();
        if element.empty {
            return Ok(text);
        }

        let mut depth = 0usize;
        loop {
            match self.reader.read_event()? {
                Event::Text(chunk) if depth == 0 => text.push_str(&chunk.unescape()?),
                Event::CData(chunk) if depth == 0 => {
                    text.push_str(str::from_utf8(&chunk.into_inner())?)
                }
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(text),
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Everything between the start and end tag of `element`, as written.
    fn inner_markup(&mut self, element: &Child<'a>) -> Result<String, DecodeError> {
        if element.empty {
            return Ok(String::new());
        }
        Ok(self.reader.read_text(element.start.name())?.into_owned())
    }

    fn skip(&mut self, element: &Child<'a>) -> Result<(), DecodeError> {
        if !element.empty {
            self.reader.read_to_end(element.start.name())?;
        }
        Ok(())
    }
}

/// Look up an attribute by local name.
fn attribute(start: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>, DecodeError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_bool(element: &'static str, raw: &str) -> Result<bool, DecodeError> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(DecodeError::InvalidBool {
            element,
            value: raw.to_owned(),
        }),
    }
}

fn unexpected_eof() -> DecodeError {
    DecodeError::Malformed("unexpected end of document".into())
}
