//! The CAS `serviceResponse` value tree.
//!
//! A [`ServiceResponse`] is either a success or a failure, never both. Each
//! nested block is owned by its parent; the tree holds no references into the
//! document it was decoded from.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError, FailureCode};

/// Root of a CAS validation response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceResponse {
    #[serde(rename = "authenticationFailure")]
    Failure(AuthenticationFailure),
    #[serde(rename = "authenticationSuccess")]
    Success(AuthenticationSuccess),
}

impl ServiceResponse {
    /// Create a failure response.
    pub fn failure<C, M>(code: C, message: M) -> Self
    where
        C: Into<String>,
        M: Into<String>,
    {
        ServiceResponse::Failure(AuthenticationFailure {
            code: code.into(),
            message: message.into(),
        })
    }

    /// Create a success response for `user`.
    ///
    /// An empty `proxy_granting_ticket` means no ticket is issued. Proxies and
    /// attributes are left unset; fill them in through [`success_mut`](Self::success_mut).
    pub fn success<U, P>(user: U, proxy_granting_ticket: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        let pgt = proxy_granting_ticket.into();
        ServiceResponse::Success(AuthenticationSuccess {
            user: user.into(),
            proxy_granting_ticket: (!pgt.is_empty()).then_some(pgt),
            ..Default::default()
        })
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResponse::Success(_))
    }

    /// Get the success branch, if this is a success.
    pub fn success_ref(&self) -> Option<&AuthenticationSuccess> {
        match self {
            ServiceResponse::Success(success) => Some(success),
            ServiceResponse::Failure(_) => None,
        }
    }

    /// Get the success branch mutably, if this is a success.
    pub fn success_mut(&mut self) -> Option<&mut AuthenticationSuccess> {
        match self {
            ServiceResponse::Success(success) => Some(success),
            ServiceResponse::Failure(_) => None,
        }
    }

    /// Get the failure branch, if this is a failure.
    pub fn failure_ref(&self) -> Option<&AuthenticationFailure> {
        match self {
            ServiceResponse::Failure(failure) => Some(failure),
            ServiceResponse::Success(_) => None,
        }
    }

    /// The authenticated user of a success response.
    pub fn user(&self) -> Option<&str> {
        self.success_ref().map(|success| success.user.as_str())
    }

    /// Encode this response, see [`encode`](crate::encode::encode).
    pub fn to_xml(&self, indent: usize) -> Result<Bytes, EncodeError> {
        crate::encode::encode(self, indent)
    }

    /// Decode a response with default limits, see [`decode`](crate::decode::decode).
    pub fn from_xml(bytes: &[u8]) -> Result<Self, DecodeError> {
        crate::decode::decode(bytes)
    }
}

/// `authenticationFailure`: a CAS error code and its message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationFailure {
    /// Code such as `INVALID_TICKET`.
    pub code: String,
    /// Inner content of the element, kept verbatim including any markup.
    pub message: String,
}

impl AuthenticationFailure {
    /// Parse the stored code, `None` if it is not one the protocol defines.
    pub fn failure_code(&self) -> Option<FailureCode> {
        self.code.parse().ok()
    }
}

/// `authenticationSuccess`: the validated principal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSuccess {
    pub user: String,
    /// Never written when `None` or empty.
    pub proxy_granting_ticket: Option<String>,
    /// Proxy chain, most recent first.
    pub proxies: Option<Vec<String>>,
    pub attributes: Option<Attributes>,
    /// Unrecognized child elements in document order.
    pub extra_attributes: Vec<AnyAttribute>,
}

impl AuthenticationSuccess {
    /// Append a proxy to the chain, creating the list on first use.
    pub fn add_proxy<S: Into<String>>(&mut self, proxy: S) {
        self.proxies.get_or_insert_with(Vec::new).push(proxy.into());
    }
}

/// `attributes` block of a success response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub authentication_date: Option<DateTime<Utc>>,
    pub long_term_authentication_request_token_used: bool,
    pub is_from_new_login: bool,
    pub member_of: Vec<String>,
    pub user_attributes: Option<UserAttributes>,
    /// Unrecognized child elements in document order.
    pub extra_attributes: Vec<AnyAttribute>,
}

/// `userAttributes` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAttributes {
    pub attributes: Vec<NamedAttribute>,
    /// Unrecognized child elements in document order.
    pub any_attributes: Vec<AnyAttribute>,
}

impl UserAttributes {
    /// Append an `<attribute name="..">` entry.
    pub fn add_attribute<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.attributes.push(NamedAttribute {
            name: Some(name.into()),
            value: value.into(),
        });
    }
}

/// An `<attribute>` element. `value` is raw inner content and is written unescaped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAttribute {
    pub name: Option<String>,
    pub value: String,
}

/// A child element no typed field claims: its tag and text content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyAttribute {
    pub name: String,
    pub value: String,
}

impl AnyAttribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_constructor() {
        let response = ServiceResponse::failure(FailureCode::InvalidTicket, "not recognized");
        let failure = response.failure_ref().unwrap();
        assert_eq!(failure.code, "INVALID_TICKET");
        assert_eq!(failure.message, "not recognized");
        assert_eq!(failure.failure_code(), Some(FailureCode::InvalidTicket));
        assert!(response.success_ref().is_none());
        assert!(!response.is_success());
    }

    #[test]
    fn test_failure_unknown_code() {
        let response = ServiceResponse::failure("SOMETHING_NEW", "");
        assert_eq!(response.failure_ref().unwrap().failure_code(), None);
    }

    #[test]
    fn test_success_constructor() {
        let response = ServiceResponse::success("jdoe", "PGT-1");
        let success = response.success_ref().unwrap();
        assert_eq!(success.user, "jdoe");
        assert_eq!(success.proxy_granting_ticket.as_deref(), Some("PGT-1"));
        assert!(success.proxies.is_none());
        assert!(success.attributes.is_none());
        assert!(success.extra_attributes.is_empty());
        assert_eq!(response.user(), Some("jdoe"));
        assert!(response.failure_ref().is_none());
    }

    #[test]
    fn test_success_empty_pgt_is_unset() {
        let response = ServiceResponse::success("jdoe", "");
        assert!(response.success_ref().unwrap().proxy_granting_ticket.is_none());
    }

    #[test]
    fn test_add_proxy_creates_list_and_keeps_order() {
        let mut response = ServiceResponse::success("jdoe", "");
        let success = response.success_mut().unwrap();
        success.add_proxy("https://a.example.org");
        success.add_proxy("https://b.example.org");
        assert_eq!(
            success.proxies.as_deref(),
            Some(&["https://a.example.org".to_string(), "https://b.example.org".to_string()][..])
        );
    }

    #[test]
    fn test_success_mut_on_failure() {
        let mut response = ServiceResponse::failure("INVALID_REQUEST", "");
        assert!(response.success_mut().is_none());
        assert_eq!(response.user(), None);
    }

    #[test]
    fn test_serde_shape() {
        let response = ServiceResponse::success("jdoe", "PGT-1");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["authenticationSuccess"]["user"], "jdoe");
        assert_eq!(json["authenticationSuccess"]["proxyGrantingTicket"], "PGT-1");

        let back: ServiceResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }
}
