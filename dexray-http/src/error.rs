//! Error types for the HTTP transport layer.
//!
//! The negotiator never swallows a failure: every terminal outcome is
//! either a success body or exactly one [`NegotiationError`] variant.
//! None of the variants is retried by this layer; extra retries would
//! multiply real monetary cost.

use dexray::proto::ProtocolError;
use dexray::signer::SignError;

/// Errors while decoding a 402 response's payment terms.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Neither the `Payment-Required` header nor the body carried terms.
    #[error("402 response carries no payment requirements")]
    Missing,

    /// The header value is not valid Base64.
    #[error("invalid base64 in Payment-Required header: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Terms were present but structurally invalid.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Terminal outcomes of a payment negotiation.
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    /// The server asked for payment and no payment credential is
    /// configured. Surfaced before any parsing or signing work.
    #[error("payment required but no payment credential is configured")]
    PaymentNotConfigured,

    /// The server's payment terms could not be decoded.
    #[error("malformed payment requirements: {0}")]
    MalformedRequirements(#[from] ParseError),

    /// No offered term settles on the configured network.
    #[error("no payment requirement matches configured network {configured} (offered: {offered:?})")]
    UnsupportedNetwork {
        /// The client's configured network.
        configured: String,
        /// Networks the server offered, in offer order.
        offered: Vec<String>,
    },

    /// The retried request was still answered with 402. Never retried
    /// again: one signed authorization per logical call is the bound.
    #[error("payment rejected: {resource} still requires payment after authorization")]
    PaymentRejected {
        /// Resource path of the rejected call.
        resource: String,
    },

    /// Any non-success, non-402 status on either attempt. Carries the
    /// server's error payload verbatim.
    #[error("request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Server-provided error body, verbatim.
        body: String,
    },

    /// Producing the payment authorization failed.
    #[error("signing failed: {0}")]
    Signing(#[from] SignError),

    /// Encoding the authorization header failed.
    #[error("failed to encode payment header: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection, timeout, or protocol error from the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from the bearer-authenticated discovery transport.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The discovery API answered with a non-success status.
    #[error("discovery request failed with status {status}: {body}")]
    Failed {
        /// HTTP status code.
        status: u16,
        /// Server-provided error body, verbatim.
        body: String,
    },

    /// Transport or middleware failure (includes token minting errors).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// The response body was not the expected JSON.
    #[error("invalid discovery response: {0}")]
    Decode(#[from] reqwest::Error),
}
