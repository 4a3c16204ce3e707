#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport layer for the dexray pay-per-call client.
//!
//! Two transports with two trust models:
//!
//! - [`PaymentNegotiator`] drives the 402 payment flow against the gated
//!   API: send, detect `402 Payment Required`, parse the offered terms,
//!   sign an authorization for the matching network, retry exactly once.
//!   Every outcome is a tagged success or a [`NegotiationError`] variant,
//!   so callers can tell "needs payment but none configured" from
//!   "payment flow failed" from "unrelated request error" without string
//!   matching.
//! - [`DiscoveryClient`] calls the identity-authenticated discovery API
//!   with a fresh short-lived bearer token per request and no retry loop;
//!   that path is not payment-gated.
//!
//! The negotiator holds no cross-call state: each logical call is an
//! independent sequence of at most two network operations and at most one
//! signing operation, safe to run with unbounded caller-side parallelism.

pub mod constants;
pub mod discovery;
pub mod error;
pub mod headers;
pub mod negotiator;

pub use discovery::{BearerAuth, DiscoveryClient};
pub use error::{DiscoveryError, NegotiationError, ParseError};
pub use negotiator::{DEFAULT_ATTEMPT_TIMEOUT, PaymentNegotiator};
