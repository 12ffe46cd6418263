//! CAS protocol authentication responses.
//!
//! This crate converts the outcome of a CAS ticket validation into the
//! `serviceResponse` XML document defined by the protocol, and parses such
//! documents back into typed values. Transport, ticket issuance and ticket
//! storage live elsewhere; this crate only transforms data.
//!
//! ## Modules
//!
//! - [`model`]: The response value tree and its constructors
//! - [`encode`]: Serializing a response to XML bytes
//! - [`decode`]: Parsing XML bytes into a response
//! - [`timestamp`]: The CAS variant of RFC3339 timestamps
//! - [`error`]: Error types and CAS failure codes
//! - [`limits`]: Size limits for inbound documents
//!
//! ## Example
//!
//! ```
//! use cas_response::{FailureCode, ServiceResponse};
//!
//! let mut response = ServiceResponse::success("jdoe", "PGT-1");
//! if let Some(success) = response.success_mut() {
//!     success.add_proxy("https://proxy.example.org/callback");
//! }
//! let xml = response.to_xml(0).unwrap();
//! assert_eq!(ServiceResponse::from_xml(&xml).unwrap(), response);
//!
//! let failure = ServiceResponse::failure(FailureCode::InvalidTicket, "ST-1 not recognized");
//! assert!(!failure.is_success());
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod limits;
pub mod model;
pub mod timestamp;

pub use decode::{decode, decode_with_limits};
pub use encode::{CAS_NAMESPACE, encode};
pub use error::*;
pub use limits::*;
pub use model::*;
