//! Environment-driven agent configuration.
//!
//! The agent is deployed with environment variables only (a local `.env`
//! file is honored via `dotenvy` in the binary). Missing credentials are
//! not load-time errors: the corresponding capability simply fails when
//! exercised, with its own configuration error. Secrets land in
//! [`SecretString`] immediately and never echo in logs.
//!
//! # Environment Variables
//!
//! - `DEXRAY_API_URL` — Base URL of the gated analytics API (required)
//! - `DEXRAY_NETWORK` — Settlement network (default: `base`)
//! - `DEXRAY_WALLET_KEY` — Hex private key for payment signing
//! - `DEXRAY_API_KEY_ID` / `DEXRAY_API_KEY_SECRET` — Discovery API pair
//! - `DEXRAY_SOCIAL_URL` / `DEXRAY_SOCIAL_TOKEN` — Posting endpoint
//! - `DEXRAY_ATTEMPT_TIMEOUT_SECS` — Per-attempt timeout (default: 30)

use url::Url;

use dexray::SecretString;

/// Fully resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the gated analytics API.
    pub api_base: Url,
    /// Settlement network payments are made on.
    pub network: String,
    /// Payment signing key, when configured.
    pub wallet_key: Option<SecretString>,
    /// Discovery API key id, when configured.
    pub api_key_id: Option<String>,
    /// Discovery API key secret, when configured.
    pub api_key_secret: Option<SecretString>,
    /// Social posting endpoint, when configured.
    pub social_endpoint: Option<Url>,
    /// Social posting bearer token, when configured.
    pub social_token: Option<SecretString>,
    /// Per-attempt network timeout in seconds.
    pub attempt_timeout_secs: u64,
}

/// Errors while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is present but unparseable.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending variable name.
        var: &'static str,
        /// Parser diagnostic.
        reason: String,
    },
}

impl AgentConfig {
    /// Resolves configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// present variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Same contract as [`AgentConfig::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_base = get("DEXRAY_API_URL")
            .ok_or(ConfigError::MissingVar("DEXRAY_API_URL"))?
            .parse::<Url>()
            .map_err(|e| ConfigError::Invalid {
                var: "DEXRAY_API_URL",
                reason: e.to_string(),
            })?;

        let social_endpoint = get("DEXRAY_SOCIAL_URL")
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
                    var: "DEXRAY_SOCIAL_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let attempt_timeout_secs = get("DEXRAY_ATTEMPT_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var: "DEXRAY_ATTEMPT_TIMEOUT_SECS",
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(30);

        Ok(Self {
            api_base,
            network: get("DEXRAY_NETWORK").unwrap_or_else(|| "base".to_owned()),
            wallet_key: get("DEXRAY_WALLET_KEY").map(SecretString::from),
            api_key_id: get("DEXRAY_API_KEY_ID"),
            api_key_secret: get("DEXRAY_API_KEY_SECRET").map(SecretString::from),
            social_endpoint,
            social_token: get("DEXRAY_SOCIAL_TOKEN").map(SecretString::from),
            attempt_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            AgentConfig::from_lookup(env(&[("DEXRAY_API_URL", "https://api.dexray.io")])).unwrap();
        assert_eq!(config.network, "base");
        assert_eq!(config.attempt_timeout_secs, 30);
        assert!(config.wallet_key.is_none());
        assert!(config.social_endpoint.is_none());
    }

    #[test]
    fn missing_api_url_is_an_error() {
        let result = AgentConfig::from_lookup(env(&[]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingVar("DEXRAY_API_URL"))
        ));
    }

    #[test]
    fn empty_values_count_as_absent() {
        let result = AgentConfig::from_lookup(env(&[("DEXRAY_API_URL", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn invalid_timeout_is_reported_with_its_variable() {
        let result = AgentConfig::from_lookup(env(&[
            ("DEXRAY_API_URL", "https://api.dexray.io"),
            ("DEXRAY_ATTEMPT_TIMEOUT_SECS", "soon"),
        ]));
        match result {
            Err(ConfigError::Invalid { var, .. }) => {
                assert_eq!(var, "DEXRAY_ATTEMPT_TIMEOUT_SECS");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn secrets_are_wrapped_and_redacted() {
        let config = AgentConfig::from_lookup(env(&[
            ("DEXRAY_API_URL", "https://api.dexray.io"),
            ("DEXRAY_WALLET_KEY", "0xabc123"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("abc123"));
        assert_eq!(config.wallet_key.unwrap().expose(), "0xabc123");
    }
}
