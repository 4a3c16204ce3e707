//! Configuration errors for signer construction.

/// Errors raised when a signer cannot be built from its credential.
///
/// Construction is the only place credential material is validated; a
/// successfully built signer cannot later fail for configuration
/// reasons. Messages name the credential kind, never its contents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The credential is absent or empty.
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),

    /// The credential is present but not parseable key material.
    #[error("invalid {kind} key material: {reason}")]
    InvalidKey {
        /// Which credential failed to parse.
        kind: &'static str,
        /// Parser diagnostic (never includes the key itself).
        reason: String,
    },
}
