//! Typed facade over the payment negotiator.
//!
//! One method per catalog operation, mapped to one HTTP path each. The
//! facade only shapes requests: GET filters become query strings, POST
//! bodies are JSON, and responses stay opaque [`Value`]s. Whether an
//! endpoint is free or payment-gated is the server's business; the
//! negotiator handles either transparently.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use dexray_http::{NegotiationError, PaymentNegotiator};

/// Errors from facade calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The payment negotiation failed; see [`NegotiationError`].
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// The response body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// An endpoint path did not join onto the base URL.
    #[error("invalid endpoint path: {0}")]
    Url(#[from] url::ParseError),
}

/// Parameters for a swap quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteRequest {
    /// Token to sell (symbol or address).
    pub token_in: String,
    /// Token to buy (symbol or address).
    pub token_out: String,
    /// Amount of `token_in` to sell, human units.
    pub amount_in: String,
}

/// Parameters for executing a quoted swap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSwapRequest {
    /// The quote being executed.
    #[serde(flatten)]
    pub quote: SwapQuoteRequest,
    /// Maximum slippage in basis points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u32>,
}

/// Parameters for a strategy backtest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    /// Strategy identifier (e.g., `"sma-cross"`).
    pub strategy: String,
    /// Token the strategy trades.
    pub token: String,
    /// Lookback window in days.
    pub days: u32,
}

/// Parameters for a liquidity-position analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LpAnalysisRequest {
    /// Pool identifier or address.
    pub pool: String,
    /// Deposit size in human units.
    pub deposit: String,
}

/// Client for the gated DeFi analytics API.
#[derive(Debug)]
pub struct ApiClient {
    negotiator: PaymentNegotiator,
    base: Url,
}

impl ApiClient {
    /// Wraps a negotiator and an API base URL.
    #[must_use]
    pub fn new(negotiator: PaymentNegotiator, base: Url) -> Self {
        Self { negotiator, base }
    }

    /// Spot price for a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn price(&self, token: &str) -> Result<Value, ApiError> {
        self.get_json("/api/v1/price", &[("token", token.to_owned())])
            .await
    }

    /// Quote for a token swap.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn swap_quote(&self, request: &SwapQuoteRequest) -> Result<Value, ApiError> {
        self.post_json("/api/v1/swap-quote", serde_json::to_value(request)?)
            .await
    }

    /// Executes a quoted swap.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn execute_swap(&self, request: &ExecuteSwapRequest) -> Result<Value, ApiError> {
        self.post_json("/api/v1/execute-swap", serde_json::to_value(request)?)
            .await
    }

    /// Technical indicator summary for a token at an interval.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn technical_analysis(
        &self,
        token: &str,
        interval: &str,
    ) -> Result<Value, ApiError> {
        self.get_json(
            "/api/v1/technical-analysis",
            &[("token", token.to_owned()), ("interval", interval.to_owned())],
        )
        .await
    }

    /// Backtests a strategy over historical data.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn backtest(&self, request: &BacktestRequest) -> Result<Value, ApiError> {
        self.post_json("/api/v1/backtest", serde_json::to_value(request)?)
            .await
    }

    /// Health and flow metrics for one pool.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn pool_analysis(&self, pool: &str) -> Result<Value, ApiError> {
        self.get_json("/api/v1/pool-analysis", &[("pool", pool.to_owned())])
            .await
    }

    /// Current yield opportunities, optionally filtered by minimum TVL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn yield_opportunities(&self, min_tvl: Option<u64>) -> Result<Value, ApiError> {
        let mut query = Vec::new();
        if let Some(min_tvl) = min_tvl {
            query.push(("minTvl", min_tvl.to_string()));
        }
        self.get_json("/api/v1/yield", &query).await
    }

    /// Impermanent-loss and fee projection for a liquidity position.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn lp_analysis(&self, request: &LpAnalysisRequest) -> Result<Value, ApiError> {
        self.post_json("/api/v1/lp-analysis", serde_json::to_value(request)?)
            .await
    }

    /// Top pools by volume.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn top_pools(&self, limit: u32) -> Result<Value, ApiError> {
        self.get_json("/api/v1/top-pools", &[("limit", limit.to_string())])
            .await
    }

    /// Top protocols by TVL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn top_protocols(&self, limit: u32) -> Result<Value, ApiError> {
        self.get_json("/api/v1/top-protocols", &[("limit", limit.to_string())])
            .await
    }

    /// Top coins by 24h performance.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn top_coins(&self, limit: u32) -> Result<Value, ApiError> {
        self.get_json("/api/v1/top-coins", &[("limit", limit.to_string())])
            .await
    }

    /// Chain-wide activity metrics.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call or decode fails.
    pub async fn metrics(&self) -> Result<Value, ApiError> {
        self.get_json("/api/v1/metrics", &[]).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let body = self.negotiator.get(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let url = self.base.join(path)?;
        let bytes = self.negotiator.post(url, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
