//! The signing seam between negotiation and key material.
//!
//! The HTTP negotiator does not hold keys. It asks an
//! [`AuthorizationSigner`] to turn a selected payment term into a signed
//! [`PaymentAuthorization`]; concrete signers live in `dexray-signer`.
//! Tests substitute counting or failing signers through the same trait.

use std::future::Future;
use std::pin::Pin;

use crate::proto::{PaymentAuthorization, PaymentRequirements};

/// A boxed future returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced while signing a payment authorization.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The selected term names a scheme this signer cannot produce.
    #[error("unsupported payment scheme: {0}")]
    UnsupportedScheme(String),

    /// The selected term names a network outside the known registry.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// An address field in the term could not be parsed.
    #[error("invalid {field} address: {reason}")]
    InvalidAddress {
        /// The term field that failed to parse.
        field: &'static str,
        /// Parser diagnostic.
        reason: String,
    },

    /// The term's amount is not a valid integer string.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The underlying cryptographic signing operation failed.
    #[error("signature operation failed: {0}")]
    Signature(String),
}

/// Produces signed payment authorizations for selected terms.
///
/// Implementations must be CPU-bound: no network I/O during signing. The
/// returned authorization's `amount` must equal the term's
/// `maxAmountRequired` byte for byte, and `resource` must be the exact
/// `resource` string passed in.
pub trait AuthorizationSigner: Send + Sync {
    /// Returns the payer address authorizations will be issued from.
    fn address(&self) -> &str;

    /// Signs an authorization satisfying `requirements` for `resource`.
    fn sign_authorization<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
        resource: &'a str,
    ) -> BoxFuture<'a, Result<PaymentAuthorization, SignError>>;
}
