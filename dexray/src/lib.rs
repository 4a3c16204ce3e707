#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the dexray pay-per-call client.
//!
//! This crate provides the foundational types shared across the dexray
//! stack: the wire format of payment terms and authorizations, the
//! requirement-selection policy, and the signing seam that chain-specific
//! crates plug into. It is transport-agnostic; the HTTP negotiation flow
//! lives in `dexray-http` and concrete signers live in `dexray-signer`.
//!
//! # Overview
//!
//! A gated API answers an unpaid request with `402 Payment Required` and a
//! machine-readable list of payment terms. The client picks the term that
//! matches its configured network, signs a one-shot authorization for the
//! exact amount the server asked for, and retries the request once with
//! the authorization attached.
//!
//! # Modules
//!
//! - [`encoding`] - Base64 wrapper used by the HTTP header codec
//! - [`networks`] - Registry of well-known EVM networks
//! - [`proto`] - Wire format types and tolerant decoding
//! - [`secret`] - Owned credential wrapper with redacted display
//! - [`select`] - Requirement selection by configured network
//! - [`signer`] - The [`AuthorizationSigner`] seam and its errors
//! - [`timestamp`] - Unix timestamps for authorization validity windows

pub mod encoding;
pub mod networks;
pub mod proto;
pub mod secret;
pub mod select;
pub mod signer;
pub mod timestamp;

pub use proto::{
    Network, PaymentAuthorization, PaymentRequired, PaymentRequirements, ProtocolError,
};
pub use secret::SecretString;
pub use signer::{AuthorizationSigner, BoxFuture, SignError};
pub use timestamp::UnixTimestamp;
