//! Registry of well-known EVM networks.
//!
//! Payment terms name networks with human-readable identifiers
//! (`"base"`, `"base-sepolia"`); the EIP-712 domain of a signed
//! authorization needs the numeric chain id. This module is the single
//! source of truth for that mapping.

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., `"base"`).
    pub name: &'static str,
    /// EIP-155 chain id (e.g., `8453`).
    pub chain_id: u64,
}

/// Networks the client can sign payments for.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        chain_id: 8453,
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: 84532,
    },
    NetworkInfo {
        name: "ethereum",
        chain_id: 1,
    },
];

/// Looks up the EIP-155 chain id for a network name.
#[must_use]
pub fn chain_id(name: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|info| info.name == name)
        .map(|info| info.chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_networks() {
        assert_eq!(chain_id("base"), Some(8453));
        assert_eq!(chain_id("base-sepolia"), Some(84532));
    }

    #[test]
    fn unknown_network_is_none() {
        assert_eq!(chain_id("hyperion"), None);
    }
}
