//! Payment authorization signing with an EVM wallet key.
//!
//! A [`WalletSigner`] turns a selected payment term into a signed
//! [`PaymentAuthorization`]. The canonical encoding is the EIP-712 hash
//! of a [`TransferAuthorization`] struct under a domain derived from the
//! term (chain id from the network registry, verifying contract from the
//! asset, name/version from the term's `extra` data), so the payee's
//! settlement layer can reconstruct and verify the exact same message.

use alloy_primitives::{Address, B256, U256, hex};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain, sol};
use rand::{RngExt, rng};
use serde::Deserialize;

use dexray::proto::{PaymentAuthorization, PaymentRequirements};
use dexray::signer::{AuthorizationSigner, BoxFuture, SignError};
use dexray::timestamp::UnixTimestamp;
use dexray::{SecretString, networks};

use crate::error::ConfigError;

sol! {
    /// Canonical struct a payment authorization is signed over.
    ///
    /// Field order and types are part of the wire contract; the server
    /// rebuilds this struct from the authorization JSON to verify the
    /// signature.
    struct TransferAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// EIP-712 domain parameters a term may carry in its `extra` data.
#[derive(Debug, Clone, Default, Deserialize)]
struct DomainParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
}

/// Signs payment authorizations with a locally held private key.
///
/// The key is parsed once at construction; the signer is read-only
/// afterwards and safe to share across concurrent calls.
pub struct WalletSigner {
    signer: PrivateKeySigner,
    address: String,
}

impl std::fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl WalletSigner {
    /// Builds a signer from a hex-encoded private key (with or without a
    /// `0x` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] for an empty key and
    /// [`ConfigError::InvalidKey`] when the key does not parse.
    pub fn from_key(key: &SecretString) -> Result<Self, ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::MissingCredential("wallet private key"));
        }
        let signer: PrivateKeySigner =
            key.expose()
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidKey {
                    kind: "wallet",
                    reason: format!("{e}"),
                })?;
        let address = signer.address().to_string();
        Ok(Self { signer, address })
    }
}

impl AuthorizationSigner for WalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign_authorization<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
        resource: &'a str,
    ) -> BoxFuture<'a, Result<PaymentAuthorization, SignError>> {
        Box::pin(async move {
            if requirements.scheme != "exact" {
                return Err(SignError::UnsupportedScheme(requirements.scheme.clone()));
            }

            let chain_id = networks::chain_id(&requirements.network)
                .ok_or_else(|| SignError::UnknownNetwork(requirements.network.clone()))?;

            let to: Address =
                requirements
                    .pay_to
                    .parse()
                    .map_err(|e| SignError::InvalidAddress {
                        field: "payTo",
                        reason: format!("{e}"),
                    })?;

            let verifying_contract = match requirements.asset.as_deref() {
                Some(asset) => asset.parse().map_err(|e| SignError::InvalidAddress {
                    field: "asset",
                    reason: format!("{e}"),
                })?,
                None => Address::ZERO,
            };

            let value: U256 = requirements
                .max_amount_required
                .parse()
                .map_err(|_| SignError::InvalidAmount(requirements.max_amount_required.clone()))?;

            let params: DomainParams = requirements
                .extra
                .as_ref()
                .and_then(|extra| serde_json::from_value(extra.clone()).ok())
                .unwrap_or_default();
            let domain = eip712_domain! {
                name: params.name,
                version: params.version,
                chain_id: chain_id,
                verifying_contract: verifying_contract,
            };

            let valid_after = UnixTimestamp::now();
            let valid_before = valid_after + requirements.validity_window();
            let nonce: [u8; 32] = rng().random();
            let nonce = B256::from(nonce);

            // The signed struct and the emitted JSON must agree field for
            // field; the verifier reconstructs the struct from the JSON.
            let message = TransferAuthorization {
                from: self.signer.address(),
                to,
                value,
                validAfter: U256::from(valid_after.as_secs()),
                validBefore: U256::from(valid_before.as_secs()),
                nonce,
            };

            let digest = message.eip712_signing_hash(&domain);
            let signature = alloy_signer::Signer::sign_hash(&self.signer, &digest)
                .await
                .map_err(|e| SignError::Signature(format!("{e:?}")))?;

            Ok(PaymentAuthorization {
                scheme: requirements.scheme.clone(),
                network: requirements.network.clone(),
                from: self.address.clone(),
                pay_to: requirements.pay_to.clone(),
                asset: requirements.asset.clone(),
                amount: requirements.max_amount_required.clone(),
                resource: resource.to_owned(),
                nonce: format!("0x{}", hex::encode(nonce)),
                valid_after,
                valid_before,
                signature: format!("0x{}", hex::encode(signature.as_bytes())),
                extra: requirements.extra.clone(),
                unknown: requirements.unknown.clone(),
            })
        })
    }
}
