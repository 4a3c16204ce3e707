//! The payment negotiation state machine.
//!
//! One logical call moves through
//! `Idle → Sent(1) → {Success | PaymentRequired → Authorizing → Sent(2)
//! → {Success | Failed}}`. Side effects are exactly 1 or 2 network
//! requests and 0 or 1 signing operations per call; the second attempt
//! is only dispatched after the first response is fully observed, and a
//! second 402 is terminal. There is no backoff, jitter, or further retry
//! anywhere in this flow.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use dexray::proto::Network;
use dexray::select;
use dexray::signer::AuthorizationSigner;

use crate::constants::{PAYMENT_REQUIRED_HEADER, PAYMENT_SIGNATURE_HEADER};
use crate::error::NegotiationError;
use crate::headers::{encode_payment_signature, parse_payment_required};

/// Default bound on each individual network attempt.
///
/// Applied per attempt: a timeout on attempt 1 surfaces as a transport
/// error and never triggers attempt 2.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// One dispatch of a logical call. Created per attempt, discarded after
/// the response is observed.
struct RequestAttempt<'a> {
    method: &'a Method,
    url: &'a Url,
    body: Option<&'a Value>,
    payment: Option<&'a str>,
    attempt: u8,
}

/// Drives the two-phase payment flow against a gated API.
///
/// The negotiator is configured once (HTTP client, network, optional
/// signer, per-attempt timeout) and then shared freely: it holds no
/// per-call state, so concurrent calls need no coordination. Dropping a
/// call's future cancels whichever network operation is in flight.
pub struct PaymentNegotiator {
    http: Client,
    network: Network,
    signer: Option<Arc<dyn AuthorizationSigner>>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for PaymentNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentNegotiator")
            .field("network", &self.network)
            .field("signer", &self.signer.as_ref().map(|s| s.address()))
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl PaymentNegotiator {
    /// Creates a negotiator for the given settlement network with a
    /// default HTTP client and no payment credential.
    #[must_use]
    pub fn new(network: impl Into<Network>) -> Self {
        Self::with_client(Client::new(), network)
    }

    /// Creates a negotiator around an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(http: Client, network: impl Into<Network>) -> Self {
        Self {
            http,
            network: network.into(),
            signer: None,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Attaches the payment signer. Without one, any 402 response is a
    /// [`NegotiationError::PaymentNotConfigured`].
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn AuthorizationSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Returns `true` if a payment credential is configured.
    #[must_use]
    pub const fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Returns the configured settlement network.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Performs a GET call through the payment flow.
    ///
    /// # Errors
    ///
    /// See [`NegotiationError`] for the terminal failure taxonomy.
    pub async fn get(&self, url: Url) -> Result<Vec<u8>, NegotiationError> {
        self.execute(Method::GET, url, None).await
    }

    /// Performs a POST call with a JSON body through the payment flow.
    ///
    /// # Errors
    ///
    /// See [`NegotiationError`] for the terminal failure taxonomy.
    pub async fn post(&self, url: Url, body: Value) -> Result<Vec<u8>, NegotiationError> {
        self.execute(Method::POST, url, Some(body)).await
    }

    /// Runs one logical call through the state machine.
    ///
    /// # Errors
    ///
    /// Returns the first terminal [`NegotiationError`]; nothing is
    /// retried beyond the single paid attempt.
    pub async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Vec<u8>, NegotiationError> {
        let first = self
            .dispatch(&RequestAttempt {
                method: &method,
                url: &url,
                body: body.as_ref(),
                payment: None,
                attempt: 1,
            })
            .await?;

        let status = first.status();
        if status.is_success() {
            trace!(%status, "request served without payment");
            return Ok(first.bytes().await?.to_vec());
        }
        if status != StatusCode::PAYMENT_REQUIRED {
            return Err(request_failed(first).await);
        }

        // Cheapest exit first: with no credential there is nothing to
        // parse or sign.
        let Some(signer) = self.signer.as_ref() else {
            return Err(NegotiationError::PaymentNotConfigured);
        };

        let header = first
            .headers()
            .get(PAYMENT_REQUIRED_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let terms_body = first.bytes().await?;
        let required = parse_payment_required(header.as_deref(), &terms_body)?;

        let Some(term) = select::by_network(&required, &self.network) else {
            return Err(NegotiationError::UnsupportedNetwork {
                configured: self.network.clone(),
                offered: select::offered_networks(&required),
            });
        };

        debug!(
            network = %term.network,
            amount = %term.max_amount_required,
            resource = url.path(),
            "payment required, signing authorization"
        );

        let authorization = signer.sign_authorization(term, url.path()).await?;
        let payment =
            encode_payment_signature(&authorization).map_err(NegotiationError::Encode)?;

        let second = self
            .dispatch(&RequestAttempt {
                method: &method,
                url: &url,
                body: body.as_ref(),
                payment: Some(&payment),
                attempt: 2,
            })
            .await?;

        let status = second.status();
        if status.is_success() {
            debug!(%status, "paid retry accepted");
            return Ok(second.bytes().await?.to_vec());
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(NegotiationError::PaymentRejected {
                resource: url.path().to_owned(),
            });
        }
        Err(request_failed(second).await)
    }

    async fn dispatch(&self, attempt: &RequestAttempt<'_>) -> Result<Response, reqwest::Error> {
        trace!(
            attempt = attempt.attempt,
            method = %attempt.method,
            url = %attempt.url,
            paid = attempt.payment.is_some(),
            "dispatching"
        );
        let mut request = self
            .http
            .request(attempt.method.clone(), attempt.url.clone())
            .timeout(self.attempt_timeout);
        if let Some(body) = attempt.body {
            request = request.json(body);
        }
        if let Some(payment) = attempt.payment {
            request = request.header(PAYMENT_SIGNATURE_HEADER, payment);
        }
        request.send().await
    }
}

async fn request_failed(response: Response) -> NegotiationError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    NegotiationError::RequestFailed { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::decode_payment_signature;
    use dexray::proto::{PaymentAuthorization, PaymentRequirements};
    use dexray::signer::{BoxFuture, SignError};
    use dexray::timestamp::UnixTimestamp;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Deterministic signer that counts signing operations.
    struct TestSigner {
        signatures: AtomicUsize,
    }

    impl TestSigner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                signatures: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.signatures.load(Ordering::SeqCst)
        }
    }

    impl AuthorizationSigner for TestSigner {
        fn address(&self) -> &str {
            "0x00000000000000000000000000000000000000aa"
        }

        fn sign_authorization<'a>(
            &'a self,
            requirements: &'a PaymentRequirements,
            resource: &'a str,
        ) -> BoxFuture<'a, Result<PaymentAuthorization, SignError>> {
            Box::pin(async move {
                self.signatures.fetch_add(1, Ordering::SeqCst);
                Ok(PaymentAuthorization {
                    scheme: requirements.scheme.clone(),
                    network: requirements.network.clone(),
                    from: self.address().to_owned(),
                    pay_to: requirements.pay_to.clone(),
                    asset: requirements.asset.clone(),
                    amount: requirements.max_amount_required.clone(),
                    resource: resource.to_owned(),
                    nonce: "0x0101".to_owned(),
                    valid_after: UnixTimestamp::from_secs(1_000),
                    valid_before: UnixTimestamp::from_secs(1_060),
                    signature: "0xfeed".to_owned(),
                    extra: requirements.extra.clone(),
                    unknown: requirements.unknown.clone(),
                })
            })
        }
    }

    fn terms_body(networks: &[(&str, &str)]) -> serde_json::Value {
        let accepts: Vec<_> = networks
            .iter()
            .map(|(network, amount)| {
                json!({
                    "scheme": "exact",
                    "network": network,
                    "payTo": "0x00000000000000000000000000000000000000b2",
                    "maxAmountRequired": amount
                })
            })
            .collect();
        json!({ "x402Version": 1, "error": "payment required", "accepts": accepts })
    }

    fn negotiator(server: &MockServer, signer: Option<Arc<TestSigner>>) -> (PaymentNegotiator, Url) {
        let mut negotiator = PaymentNegotiator::new("base");
        if let Some(signer) = signer {
            negotiator = negotiator.with_signer(signer);
        }
        let url = server.uri().parse::<Url>().unwrap();
        (negotiator, url)
    }

    fn quote_body() -> serde_json::Value {
        json!({"tokenIn": "WETH", "tokenOut": "USDC", "amountIn": "1.0"})
    }

    #[tokio::test]
    async fn free_endpoint_is_one_call_and_zero_signing() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/api/v1/swap-quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quote": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        let url = base.join("/api/v1/swap-quote").unwrap();

        let body = negotiator.post(url, quote_body()).await.unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded, json!({"quote": "ok"}));
        assert_eq!(signer.count(), 0);
    }

    #[tokio::test]
    async fn payment_flow_signs_once_and_carries_exact_amount() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/api/v1/swap-quote"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(terms_body(&[("base", "20000")])),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(http_method("POST"))
            .and(path("/api/v1/swap-quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quote": "paid"})))
            .expect(1)
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        let url = base.join("/api/v1/swap-quote").unwrap();

        let body = negotiator.post(url, quote_body()).await.unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded, json!({"quote": "paid"}));
        assert_eq!(signer.count(), 1);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].headers.get(PAYMENT_SIGNATURE_HEADER).is_none());

        let header = requests[1]
            .headers
            .get(PAYMENT_SIGNATURE_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        let authorization = decode_payment_signature(header).unwrap();
        assert_eq!(authorization.amount, "20000");
        assert_eq!(authorization.resource, "/api/v1/swap-quote");
        assert_eq!(authorization.network, "base");
    }

    #[tokio::test]
    async fn selects_the_configured_network_among_offers() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(402).set_body_json(terms_body(&[
                ("ethereum", "90000"),
                ("base", "1000"),
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": "1.0"})))
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        negotiator.get(base.join("/api/v1/price").unwrap()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let header = requests[1]
            .headers
            .get(PAYMENT_SIGNATURE_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        let authorization = decode_payment_signature(header).unwrap();
        assert_eq!(authorization.network, "base");
        assert_eq!(authorization.amount, "1000");
    }

    #[tokio::test]
    async fn unsupported_network_fails_without_signing() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(terms_body(&[("polygon", "1000")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        match result {
            Err(NegotiationError::UnsupportedNetwork {
                configured,
                offered,
            }) => {
                assert_eq!(configured, "base");
                assert_eq!(offered, vec!["polygon"]);
            }
            other => panic!("expected UnsupportedNetwork, got {other:?}"),
        }
        assert_eq!(signer.count(), 0);
    }

    #[tokio::test]
    async fn second_402_is_rejected_with_no_third_call() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(terms_body(&[("base", "1000")])),
            )
            .expect(2)
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        assert!(matches!(
            result,
            Err(NegotiationError::PaymentRejected { .. })
        ));
        assert_eq!(signer.count(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_credential_stops_after_the_first_call() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(terms_body(&[("base", "1000")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (negotiator, base) = negotiator(&server, None);
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        assert!(matches!(
            result,
            Err(NegotiationError::PaymentNotConfigured)
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_terms_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(402).set_body_string("upgrade required"))
            .expect(1)
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        assert!(matches!(
            result,
            Err(NegotiationError::MalformedRequirements(_))
        ));
        assert_eq!(signer.count(), 0);
    }

    #[tokio::test]
    async fn terms_from_header_only_drive_the_flow() {
        let server = MockServer::start().await;
        let header_value = dexray::encoding::Base64Bytes::encode(
            serde_json::to_vec(&terms_body(&[("base", "777")])).unwrap(),
        )
        .to_string();
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(
                ResponseTemplate::new(402)
                    .insert_header(PAYMENT_REQUIRED_HEADER, header_value.as_str()),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": "1"})))
            .mount(&server)
            .await;

        let signer = TestSigner::new();
        let (negotiator, base) = negotiator(&server, Some(Arc::clone(&signer)));
        negotiator.get(base.join("/api/v1/price").unwrap()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let header = requests[1]
            .headers
            .get(PAYMENT_SIGNATURE_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(decode_payment_signature(header).unwrap().amount, "777");
    }

    #[tokio::test]
    async fn other_errors_are_request_failed_verbatim() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let (negotiator, base) = negotiator(&server, Some(TestSigner::new()));
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        match result {
            Err(NegotiationError::RequestFailed { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_on_the_paid_retry_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(terms_body(&[("base", "1000")])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(http_method("GET"))
            .and(path("/api/v1/price"))
            .respond_with(ResponseTemplate::new(500).set_body_string("settlement down"))
            .mount(&server)
            .await;

        let (negotiator, base) = negotiator(&server, Some(TestSigner::new()));
        let result = negotiator.get(base.join("/api/v1/price").unwrap()).await;

        assert!(matches!(
            result,
            Err(NegotiationError::RequestFailed { status: 500, .. })
        ));
    }
}
