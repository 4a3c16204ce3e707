//! HTTP-level constants for the payment protocol.

/// Response header carrying the server's payment terms (JSON, raw or
/// Base64-encoded).
pub const PAYMENT_REQUIRED_HEADER: &str = "Payment-Required";

/// Request header carrying the signed payment authorization
/// (Base64-encoded JSON).
pub const PAYMENT_SIGNATURE_HEADER: &str = "Payment-Signature";

/// HTTP 402 Payment Required status code.
pub const HTTP_STATUS_PAYMENT_REQUIRED: u16 = 402;

/// Default discovery API endpoint.
pub const DEFAULT_DISCOVERY_URL: &str = "https://api.dexray.io/discovery/resources";
