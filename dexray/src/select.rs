//! Requirement selection by configured network.
//!
//! A server may offer several payment terms for one resource. The client
//! holds exactly one configured network and pays only on it: the first
//! offered term whose network matches is selected, and when none matches
//! the call fails rather than guessing across networks.

use crate::proto::{PaymentRequired, PaymentRequirements};

/// Returns the first offered term whose network equals `network`.
#[must_use]
pub fn by_network<'a>(
    required: &'a PaymentRequired,
    network: &str,
) -> Option<&'a PaymentRequirements> {
    required
        .accepts
        .iter()
        .find(|term| term.network == network)
}

/// Returns the distinct networks present in an offer, in offer order.
///
/// Used to build actionable error messages when no term matches.
#[must_use]
pub fn offered_networks(required: &PaymentRequired) -> Vec<String> {
    let mut networks: Vec<String> = Vec::with_capacity(required.accepts.len());
    for term in &required.accepts {
        if !networks.contains(&term.network) {
            networks.push(term.network.clone());
        }
    }
    networks
}
