#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Credential-holding signers for the dexray pay-per-call client.
//!
//! Two distinct trust domains, two distinct credentials:
//!
//! - [`WalletSigner`] holds an EVM private key and produces EIP-712
//!   signed payment authorizations for the 402 retry flow.
//! - [`ApiKeySigner`] holds an API key pair and mints short-lived ES256
//!   bearer tokens for the identity-authenticated discovery API.
//!
//! Both are CPU-bound: no signer performs network I/O. Key material
//! arrives wrapped in [`dexray::SecretString`] and never appears in
//! `Debug` output or error messages.

pub mod error;
pub mod token;
pub mod wallet;

pub use error::ConfigError;
pub use token::{ApiKeySigner, BearerClaims, TOKEN_LIFETIME_SECS};
pub use wallet::WalletSigner;
