//! dexray posting agent binary.
//!
//! Runs one publish cycle: pick a template category, fetch the data it
//! needs through the pay-per-call client, render the post, and hand it
//! to the social sink. Scheduling cycles is the deployment's job (cron
//! or a supervisor), not this binary's.
//!
//! # Usage
//!
//! ```bash
//! DEXRAY_API_URL=https://api.dexray.io \
//! DEXRAY_WALLET_KEY=0x... \
//! RUST_LOG=info cargo run -p dexray-agent
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use dexray::AuthorizationSigner;
use dexray_agent::api::{ApiClient, ApiError};
use dexray_agent::config::AgentConfig;
use dexray_agent::social::{HttpSocialSink, SocialSink};
use dexray_agent::templates::{self, DataNeed};
use dexray_http::{DiscoveryClient, PaymentNegotiator};
use dexray_signer::{ApiKeySigner, WalletSigner};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("agent cycle failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::from_env()?;
    tracing::info!(
        api = %config.api_base,
        network = %config.network,
        wallet = config.wallet_key.is_some(),
        social = config.social_endpoint.is_some(),
        "loaded configuration"
    );

    let mut negotiator = PaymentNegotiator::new(config.network.clone())
        .with_attempt_timeout(Duration::from_secs(config.attempt_timeout_secs));
    if let Some(key) = &config.wallet_key {
        let signer = WalletSigner::from_key(key)?;
        tracing::info!(address = signer.address(), "payment signer ready");
        negotiator = negotiator.with_signer(Arc::new(signer));
    } else {
        tracing::warn!("no wallet key configured; only free endpoints will succeed");
    }
    let api = ApiClient::new(negotiator, config.api_base.clone());

    // Identity-authenticated side channel; its failure never blocks the
    // publish cycle.
    if let (Some(id), Some(secret)) = (&config.api_key_id, &config.api_key_secret) {
        let discovery = DiscoveryClient::new(ApiKeySigner::new(id.clone(), secret)?);
        match discovery.resources(Some(5), None).await {
            Ok(listing) => {
                let count = listing
                    .get("items")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                tracing::info!(resources = count, "discovery catalog reachable");
            }
            Err(e) => tracing::warn!("discovery query failed: {e}"),
        }
    }

    let (category, template) = {
        let mut rng = rand::rng();
        let category = templates::pick_category(&mut rng);
        (category, templates::pick_template(&mut rng, category))
    };
    tracing::info!(category = category.name, "selected template");

    let mut values: Vec<(&str, String)> = Vec::new();
    for need in template.needs {
        gather(&api, *need, &mut values).await?;
    }

    let text = templates::clamp_to_post_limit(&templates::render(template, &values));

    match (&config.social_endpoint, &config.social_token) {
        (Some(endpoint), Some(token)) => {
            let sink = HttpSocialSink::new(endpoint.clone(), token.clone());
            sink.post(&text).await?;
            tracing::info!(category = category.name, "posted update");
        }
        _ => {
            tracing::info!(post = %text, "social sink not configured; rendered post only");
        }
    }

    Ok(())
}

/// Fetches the data one [`DataNeed`] covers and pushes its placeholder
/// values.
async fn gather(
    api: &ApiClient,
    need: DataNeed,
    values: &mut Vec<(&str, String)>,
) -> Result<(), ApiError> {
    match need {
        DataNeed::Price => {
            let price = api.price("ETH").await?;
            values.push(("price", text_at(&price, &["priceUsd"])));
            values.push(("change", text_at(&price, &["change24h"])));
        }
        DataNeed::TechnicalAnalysis => {
            let ta = api.technical_analysis("ETH", "1d").await?;
            values.push(("trend", text_at(&ta, &["trend"])));
            values.push(("rsi", text_at(&ta, &["rsi"])));
            values.push(("signal", text_at(&ta, &["signal"])));
        }
        DataNeed::TopPools => {
            let pools = api.top_pools(3).await?;
            let first = first_in(&pools, "pools");
            values.push(("pool", text_at(&first, &["name"])));
            values.push(("poolApr", text_at(&first, &["apr"])));
        }
        DataNeed::TopCoins => {
            let coins = api.top_coins(3).await?;
            let first = first_in(&coins, "coins");
            values.push(("topCoin", text_at(&first, &["symbol"])));
            values.push(("topCoinChange", text_at(&first, &["change24h"])));
        }
        DataNeed::YieldOpportunities => {
            let yields = api.yield_opportunities(None).await?;
            let first = first_in(&yields, "opportunities");
            values.push(("yieldProtocol", text_at(&first, &["protocol"])));
            values.push(("yieldApy", text_at(&first, &["apy"])));
        }
        DataNeed::Metrics => {
            let metrics = api.metrics().await?;
            values.push(("txCount", text_at(&metrics, &["txCount24h"])));
            values.push(("tvl", text_at(&metrics, &["tvlUsd"])));
        }
    }
    Ok(())
}

/// Walks a key path, rendering the leaf as display text or `n/a`.
fn text_at(value: &Value, path: &[&str]) -> String {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return "n/a".to_owned(),
        }
    }
    match current {
        Value::String(s) => s.clone(),
        Value::Null => "n/a".to_owned(),
        other => other.to_string(),
    }
}

/// First element of a named array field, or null.
fn first_in(value: &Value, key: &str) -> Value {
    value
        .get(key)
        .and_then(|list| list.get(0))
        .cloned()
        .unwrap_or(Value::Null)
}
