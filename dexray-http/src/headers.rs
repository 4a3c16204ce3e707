//! Payment header encoding and 402 term extraction.
//!
//! Payment terms arrive in the `Payment-Required` response header (raw or
//! Base64-encoded JSON) and/or the JSON response body; either location
//! may hold the versioned envelope, a bare array of terms, or a single
//! term object. Signed authorizations leave in the `Payment-Signature`
//! request header as Base64-encoded JSON.

use serde_json::Value;

use dexray::encoding::Base64Bytes;
use dexray::proto::{PaymentAuthorization, PaymentRequired, ProtocolError};

use crate::error::ParseError;

/// Encodes a signed authorization for the `Payment-Signature` header.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_payment_signature(
    authorization: &PaymentAuthorization,
) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(authorization)?;
    Ok(Base64Bytes::encode(&json).to_string())
}

/// Decodes a `Payment-Signature` header value back into an authorization.
///
/// # Errors
///
/// Returns [`ParseError`] on Base64 or JSON decode failure.
pub fn decode_payment_signature(value: &str) -> Result<PaymentAuthorization, ParseError> {
    let bytes = Base64Bytes::from(value.trim().as_bytes()).decode()?;
    let authorization =
        serde_json::from_slice(&bytes).map_err(|e| ParseError::Protocol(ProtocolError::Json(e)))?;
    Ok(authorization)
}

/// Extracts payment terms from a 402 response.
///
/// The header wins when both header and body decode; a malformed header
/// falls back to the body, and the more specific error is reported when
/// both fail.
///
/// # Errors
///
/// Returns [`ParseError::Missing`] when neither location carries JSON at
/// all, and a decode error when terms are present but invalid.
pub fn parse_payment_required(
    header: Option<&str>,
    body: &[u8],
) -> Result<PaymentRequired, ParseError> {
    let header_result = header.map(parse_header_value);
    if let Some(Ok(required)) = header_result {
        return Ok(required);
    }

    match parse_body(body) {
        Ok(required) => Ok(required),
        Err(body_error) => Err(match header_result {
            Some(Err(header_error)) => header_error,
            _ => body_error,
        }),
    }
}

fn parse_header_value(raw: &str) -> Result<PaymentRequired, ParseError> {
    let trimmed = raw.trim();
    let value: Value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(ProtocolError::Json)?
    } else {
        let bytes = Base64Bytes::from(trimmed.as_bytes()).decode()?;
        serde_json::from_slice(&bytes).map_err(ProtocolError::Json)?
    };
    Ok(PaymentRequired::from_value(value)?)
}

fn parse_body(body: &[u8]) -> Result<PaymentRequired, ParseError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ParseError::Missing)?;
    Ok(PaymentRequired::from_value(value)?)
}
