//! Serializing a [`ServiceResponse`] to XML.
//!
//! Document shape:
//!
//! ```text
//! <serviceResponse xmlns="http://www.yale.edu/tp/cas">
//!   <authenticationFailure code="..">message</authenticationFailure>
//!   | <authenticationSuccess>
//!       user, proxyGrantingTicket?, proxies?, attributes?, extras*
//!     </authenticationSuccess>
//! </serviceResponse>
//! ```

use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::EncodeError;
use crate::model::{
    AnyAttribute, Attributes, AuthenticationFailure, AuthenticationSuccess, ServiceResponse,
    UserAttributes,
};
use crate::timestamp;

/// Namespace of the `serviceResponse` root element.
pub const CAS_NAMESPACE: &str = "http://www.yale.edu/tp/cas";

/// Encode a response as a `serviceResponse` document.
///
/// With `indent == 0` the output is compact. Otherwise every nested element
/// starts on its own line, indented by `indent` spaces per level.
///
/// Failure messages and named attribute values are written as raw markup;
/// they must be well-formed XML content.
pub fn encode(response: &ServiceResponse, indent: usize) -> Result<Bytes, EncodeError> {
    let writer = if indent == 0 {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    };

    let mut encoder = XmlEncoder { writer };
    encoder.service_response(response)?;

    let out = encoder.writer.into_inner();
    tracing::trace!(bytes = out.len(), indent, "encoded CAS service response");
    Ok(Bytes::from(out))
}

struct XmlEncoder {
    writer: Writer<Vec<u8>>,
}

impl XmlEncoder {
    fn service_response(&mut self, response: &ServiceResponse) -> Result<(), EncodeError> {
        let mut root = BytesStart::new("serviceResponse");
        root.push_attribute(("xmlns", CAS_NAMESPACE));
        self.write(Event::Start(root))?;

        match response {
            ServiceResponse::Failure(failure) => self.failure(failure)?,
            ServiceResponse::Success(success) => self.success(success)?,
        }

        self.end("serviceResponse")
    }

    fn failure(&mut self, failure: &AuthenticationFailure) -> Result<(), EncodeError> {
        check_chars("authenticationFailure", &failure.code)?;
        check_chars("authenticationFailure", &failure.message)?;

        let mut start = BytesStart::new("authenticationFailure");
        start.push_attribute(("code", failure.code.as_str()));
        self.write(Event::Start(start))?;
        self.write(Event::Text(BytesText::from_escaped(failure.message.as_str())))?;
        self.end("authenticationFailure")
    }

    fn success(&mut self, success: &AuthenticationSuccess) -> Result<(), EncodeError> {
        self.start("authenticationSuccess")?;
        self.text_element("user", &success.user)?;

        if let Some(pgt) = success
            .proxy_granting_ticket
            .as_deref()
            .filter(|pgt| !pgt.is_empty())
        {
            self.text_element("proxyGrantingTicket", pgt)?;
        }

        if let Some(proxies) = &success.proxies {
            self.start("proxies")?;
            for proxy in proxies {
                self.text_element("proxy", proxy)?;
            }
            self.end("proxies")?;
        }

        if let Some(attributes) = &success.attributes {
            self.attributes(attributes)?;
        }

        self.extensions(&success.extra_attributes)?;
        self.end("authenticationSuccess")
    }

    fn attributes(&mut self, attributes: &Attributes) -> Result<(), EncodeError> {
        self.start("attributes")?;

        if let Some(date) = &attributes.authentication_date {
            if !timestamp::is_rfc3339_year(date) {
                return Err(EncodeError::DateOutOfRange(*date));
            }
            self.text_element("authenticationDate", &timestamp::format(date))?;
        }
        self.text_element(
            "longTermAuthenticationRequestTokenUsed",
            bool_str(attributes.long_term_authentication_request_token_used),
        )?;
        self.text_element("isFromNewLogin", bool_str(attributes.is_from_new_login))?;
        for group in &attributes.member_of {
            self.text_element("memberOf", group)?;
        }
        if let Some(user_attributes) = &attributes.user_attributes {
            self.user_attributes(user_attributes)?;
        }

        self.extensions(&attributes.extra_attributes)?;
        self.end("attributes")
    }

    fn user_attributes(&mut self, user_attributes: &UserAttributes) -> Result<(), EncodeError> {
        self.start("userAttributes")?;

        for attribute in &user_attributes.attributes {
            let mut start = BytesStart::new("attribute");
            if let Some(name) = &attribute.name {
                check_chars("attribute", name)?;
                start.push_attribute(("name", name.as_str()));
            }
            check_chars("attribute", &attribute.value)?;
            self.write(Event::Start(start))?;
            self.write(Event::Text(BytesText::from_escaped(attribute.value.as_str())))?;
            self.end("attribute")?;
        }

        self.extensions(&user_attributes.any_attributes)?;
        self.end("userAttributes")
    }

    fn extensions(&mut self, extensions: &[AnyAttribute]) -> Result<(), EncodeError> {
        for extension in extensions {
            if !is_xml_name(&extension.name) {
                return Err(EncodeError::InvalidName(extension.name.clone()));
            }
            self.text_element(&extension.name, &extension.value)?;
        }
        Ok(())
    }

    // Start, text and end are written even for empty text so that indentation
    // never puts whitespace inside a leaf element.
    fn text_element(&mut self, name: &str, text: &str) -> Result<(), EncodeError> {
        check_chars(name, text)?;
        self.start(name)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn start(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EncodeError> {
        self.writer
            .write_event(event)
            .map_err(|e| EncodeError::Io(e.to_string()))
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Reject characters outside the XML 1.0 `Char` production.
fn check_chars(element: &str, text: &str) -> Result<(), EncodeError> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(EncodeError::InvalidCharacter {
            element: element.to_owned(),
            code: c as u32,
        }),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Extension elements are written unprefixed into the CAS default namespace,
/// so their names must be colon-free (`NCName`).
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
