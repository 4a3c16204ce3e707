//! Wire format types for the payment-gated request protocol.
//!
//! These types define the JSON shapes exchanged with a gated API: the
//! payment terms a server offers in a 402 response and the signed
//! authorization a client attaches to the retried request.
//!
//! # Wire Format
//!
//! All types serialize to JSON with camelCase field names. Servers are
//! free to add fields the client does not know about; every unknown field
//! is captured verbatim in `extra` and echoed back in the authorization,
//! so new scheme parameters round-trip through old clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::timestamp::UnixTimestamp;

/// Protocol version carried in the 402 envelope.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on an authorization's validity window, in seconds.
///
/// A server-provided `maxTimeoutSeconds` above this value is clamped so a
/// hostile server cannot stretch how long a signed authorization stays
/// replayable.
pub const MAX_AUTHORIZATION_WINDOW_SECS: u64 = 120;

/// Human-readable network identifier (e.g., `"base"`, `"base-sepolia"`).
pub type Network = String;

/// Errors that can occur when decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The response carried no recognizable payment requirements.
    #[error("no payment requirements found in response")]
    MissingRequirements,

    /// JSON deserialization failed, including any missing required field.
    #[error("malformed payment requirements: {0}")]
    Json(#[from] serde_json::Error),
}

/// One set of payment terms offered by a server for a gated resource.
///
/// Immutable once parsed. `scheme`, `network`, `payTo` and
/// `maxAmountRequired` are required for signing; everything else is
/// optional metadata.
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "base",
///   "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
///   "maxAmountRequired": "20000",
///   "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
///   "resource": "/api/v1/swap-quote",
///   "maxTimeoutSeconds": 60
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g., `"exact"`).
    pub scheme: String,

    /// Network the payment must settle on.
    pub network: Network,

    /// Recipient address.
    pub pay_to: String,

    /// Amount in smallest unit, as a decimal string.
    pub max_amount_required: String,

    /// Asset contract address, when the scheme needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    /// Resource path the terms apply to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Human-readable description of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Maximum validity of an authorization, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,

    /// Scheme-specific data (e.g., EIP-712 domain parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,

    /// Every field the client does not recognize, preserved verbatim.
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

impl PaymentRequirements {
    /// Returns the required payment amount.
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.max_amount_required
    }

    /// Returns the validity window to use for an authorization, clamped
    /// to [`MAX_AUTHORIZATION_WINDOW_SECS`].
    #[must_use]
    pub fn validity_window(&self) -> u64 {
        self.max_timeout_seconds
            .unwrap_or(MAX_AUTHORIZATION_WINDOW_SECS)
            .min(MAX_AUTHORIZATION_WINDOW_SECS)
    }
}

/// The 402 response envelope: zero or more payment terms for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (defaults to [`PROTOCOL_VERSION`]).
    #[serde(default = "default_version")]
    pub x402_version: u32,

    /// Optional server-provided error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The payment terms the server accepts.
    pub accepts: Vec<PaymentRequirements>,
}

/// Accepted encodings of payment terms: the full envelope, a bare array
/// of terms, or a single bare term object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequiredRepr {
    Envelope(PaymentRequired),
    Many(Vec<PaymentRequirements>),
    One(PaymentRequirements),
}

impl PaymentRequired {
    /// Decodes payment terms from a JSON value.
    ///
    /// Servers encode terms either as the versioned envelope, as a bare
    /// array of term objects, or as a single term object; all three
    /// normalize to the envelope form.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if the value matches none of the
    /// accepted encodings or a signing-critical field is missing.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let repr: RequiredRepr = serde_json::from_value(value)?;
        Ok(match repr {
            RequiredRepr::Envelope(required) => required,
            RequiredRepr::Many(accepts) => Self {
                x402_version: PROTOCOL_VERSION,
                error: None,
                accepts,
            },
            RequiredRepr::One(one) => Self {
                x402_version: PROTOCOL_VERSION,
                error: None,
                accepts: vec![one],
            },
        })
    }
}

/// A signed, single-use proof of payment attached to a retried request.
///
/// Created fresh for every retried request and never reused: the nonce is
/// random per signature and the validity window is bounded by
/// [`MAX_AUTHORIZATION_WINDOW_SECS`]. `amount` is byte-for-byte equal to
/// the selected term's `maxAmountRequired` and `resource` is the exact
/// path of the original request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuthorization {
    /// Payment scheme identifier, echoed from the selected term.
    pub scheme: String,

    /// Network the payment settles on, echoed from the selected term.
    pub network: Network,

    /// Signer (payer) address.
    pub from: String,

    /// Recipient address, echoed from the selected term.
    pub pay_to: String,

    /// Asset contract address, echoed from the selected term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    /// Authorized amount in smallest unit, as a decimal string.
    pub amount: String,

    /// Resource path of the original request.
    pub resource: String,

    /// Single-use random nonce, 0x-prefixed hex.
    pub nonce: String,

    /// Earliest time the authorization is valid.
    pub valid_after: UnixTimestamp,

    /// Time the authorization expires.
    pub valid_before: UnixTimestamp,

    /// ECDSA signature over the canonical encoding, 0x-prefixed hex.
    pub signature: String,

    /// Scheme-specific data echoed from the selected term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,

    /// Unknown term fields echoed back for server-side consumption.
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

const fn default_version() -> u32 {
    PROTOCOL_VERSION
}
