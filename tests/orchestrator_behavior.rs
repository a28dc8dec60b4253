//! Behavior-driven tests for quote source orchestration.
//!
//! Real provider adapters run against a scripted transport, so every
//! scenario goes through decoding, retries, the breaker and the cache.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quoteward_core::{
    AwesomeApiAdapter, BcbAdapter, CircuitBreakerConfig, CircuitState, FxRate, HgBrasilAdapter,
    HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, IndexRates, OrchestratorConfig,
    ProviderId, QuoteOrigin, RetryConfig, SourceOrchestrator,
};
use rust_decimal_macros::dec;

const HG_URL: &str = "https://hg.test/finance?format=json-cors&";
const AWESOME_URL: &str = "https://awesome.test/json/last/USD-BRL";
const BCB_TEMPLATE: &str = "https://bcb.test/sgs.{code}/last";
const CDI_URL: &str = "https://bcb.test/sgs.12/";
const SELIC_URL: &str = "https://bcb.test/sgs.11/";
const IPCA_URL: &str = "https://bcb.test/sgs.433/";

/// Replies in order per URL prefix; an unscripted call is a transport error.
#[derive(Default)]
struct ScriptedTransport {
    routes: Mutex<Vec<(&'static str, VecDeque<HttpResponse>)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn route(self, prefix: &'static str, replies: Vec<HttpResponse>) -> Self {
        self.routes
            .lock()
            .expect("routes lock")
            .push((prefix, replies.into()));
        self
    }

    fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

impl HttpClient for ScriptedTransport {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.calls.lock().expect("calls lock").push(request.url.clone());
        let reply = self
            .routes
            .lock()
            .expect("routes lock")
            .iter_mut()
            .find(|(prefix, _)| request.url.starts_with(prefix))
            .and_then(|(_, replies)| replies.pop_front())
            .ok_or_else(|| HttpError::new(format!("no scripted reply for {}", request.url)));
        Box::pin(async move { reply })
    }
}

fn hg_rate(buy: &str) -> HttpResponse {
    HttpResponse::ok_json(format!(
        r#"{{"results":{{"currencies":{{"source":"BRL","USD":{{"name":"Dollar","buy":{buy}}}}}}}}}"#
    ))
}

fn awesome_rate(bid: &str) -> HttpResponse {
    HttpResponse::ok_json(format!(r#"{{"USDBRL":{{"code":"USD","bid":"{bid}"}}}}"#))
}

fn sgs_value(valor: &str) -> HttpResponse {
    HttpResponse::ok_json(format!(r#"[{{"data":"14/10/2026","valor":"{valor}"}}]"#))
}

fn server_error() -> HttpResponse {
    HttpResponse::with_status(503, "service unavailable")
}

fn fx_source(transport: &Arc<ScriptedTransport>, retry: RetryConfig) -> SourceOrchestrator<FxRate> {
    let http: Arc<dyn HttpClient> = transport.clone();
    let config = OrchestratorConfig {
        freshness: Duration::from_secs(35 * 60),
        breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60 * 60),
        },
        retry,
        call_timeout: Duration::from_secs(30),
    };

    SourceOrchestrator::<FxRate>::new(
        "fx",
        config,
        Arc::new(HgBrasilAdapter::new(Arc::clone(&http), "key").with_base_url(HG_URL)),
        FxRate::last_resort(),
    )
    .with_secondary(Arc::new(AwesomeApiAdapter::new(http).with_url(AWESOME_URL)))
}

// =============================================================================
// Fallback chain and circuit breaker
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_primary_keeps_failing_breaker_opens_and_secondary_takes_over() {
    // Given: HG Brasil answers once and then fails; AwesomeAPI fails three
    // times before answering
    let transport = Arc::new(
        ScriptedTransport::default()
            .route(
                HG_URL,
                vec![hg_rate("5.42"), server_error(), server_error(), server_error(), hg_rate("5.45")],
            )
            .route(
                AWESOME_URL,
                vec![server_error(), server_error(), server_error(), awesome_rate("5.40")],
            ),
    );
    let fx = fx_source(&transport, RetryConfig::no_retry());

    // When: the first read goes to the primary
    let first = fx.latest().await;

    // Then: the cache holds the primary's rate
    assert_eq!(first.origin, QuoteOrigin::Primary);
    assert_eq!(first.data.usd_brl, dec!(5.42));
    assert_eq!(first.provider, Some(ProviderId::Hgbrasil));

    // When: three refresh cycles fail on both providers
    for _ in 0..3 {
        let read = fx.refresh().await;
        assert_eq!(read.origin, QuoteOrigin::Stale);
        assert_eq!(read.data.usd_brl, dec!(5.42));
    }

    // Then: the breaker is open
    assert_eq!(fx.breaker().state(), CircuitState::Open);
    assert_eq!(transport.calls_to(HG_URL), 4);

    // When: the next refresh runs
    let recovered = fx.refresh().await;

    // Then: only the secondary is called and its rate is cached
    assert_eq!(recovered.origin, QuoteOrigin::Secondary);
    assert_eq!(recovered.data.usd_brl, dec!(5.40));
    assert_eq!(transport.calls_to(HG_URL), 4);
    assert_eq!(transport.calls_to(AWESOME_URL), 4);

    let cached = fx.latest().await;
    assert_eq!(cached.origin, QuoteOrigin::Cache);
    assert_eq!(cached.data.usd_brl, dec!(5.40));
    assert_eq!(cached.provider, Some(ProviderId::Awesomeapi));

    // When: a refresh runs late in the cooldown
    tokio::time::advance(Duration::from_secs(59 * 60)).await;
    assert_eq!(fx.breaker().state(), CircuitState::Open);
    let during_cooldown = fx.refresh().await;

    // Then: the primary is still skipped and the snapshot is served stale
    assert_eq!(during_cooldown.origin, QuoteOrigin::Stale);
    assert_eq!(during_cooldown.data.usd_brl, dec!(5.40));
    assert_eq!(transport.calls_to(HG_URL), 4);

    // When: the cooldown has elapsed and the next refresh runs
    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(fx.breaker().state(), CircuitState::Closed);
    let after_cooldown = fx.refresh().await;

    // Then: the primary is attempted again and answers
    assert_eq!(after_cooldown.origin, QuoteOrigin::Primary);
    assert_eq!(after_cooldown.data.usd_brl, dec!(5.45));
    assert_eq!(after_cooldown.provider, Some(ProviderId::Hgbrasil));
    assert_eq!(transport.calls_to(HG_URL), 5);
}

#[tokio::test(start_paused = true)]
async fn when_cache_is_fresh_reads_never_reach_providers() {
    // Given: a rate published a few minutes ago
    let transport = Arc::new(ScriptedTransport::default().route(HG_URL, vec![hg_rate("5.10")]));
    let fx = fx_source(&transport, RetryConfig::no_retry());
    fx.latest().await;
    tokio::time::advance(Duration::from_secs(10 * 60)).await;

    // When: callers read repeatedly inside the freshness window
    let mut origins = Vec::new();
    for _ in 0..5 {
        origins.push(fx.latest().await.origin);
    }

    // Then: every read is served from the cache
    assert!(origins.iter().all(|origin| *origin == QuoteOrigin::Cache));
    assert_eq!(transport.calls_to(HG_URL), 1);
    assert_eq!(transport.calls_to(AWESOME_URL), 0);
}

#[tokio::test(start_paused = true)]
async fn when_primary_recovers_within_retries_no_fallback_happens() {
    // Given: a primary that fails twice, then answers, with three attempts allowed
    let transport = Arc::new(
        ScriptedTransport::default()
            .route(HG_URL, vec![server_error(), server_error(), hg_rate("5.41")]),
    );
    let fx = fx_source(&transport, RetryConfig::attempts(3));
    let started = tokio::time::Instant::now();

    // When: the cache is cold
    let read = fx.latest().await;

    // Then: the third attempt wins after 2 s and 4 s of backoff
    assert_eq!(read.origin, QuoteOrigin::Primary);
    assert_eq!(read.data.usd_brl, dec!(5.41));
    assert_eq!(transport.calls_to(HG_URL), 3);
    assert_eq!(transport.calls_to(AWESOME_URL), 0);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
    assert_eq!(fx.breaker().consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn when_everything_fails_on_a_cold_cache_last_resort_is_served_but_not_cached() {
    // Given: both providers down and nothing ever published
    let transport = Arc::new(ScriptedTransport::default());
    let fx = fx_source(&transport, RetryConfig::no_retry());

    // When: a caller reads
    let read = fx.latest().await;

    // Then: the fixed fallback rate is returned and the cache stays empty
    assert_eq!(read.origin, QuoteOrigin::LastResort);
    assert_eq!(read.data.usd_brl, dec!(5.50));
    assert_eq!(read.provider, None);
    assert!(fx.snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn when_primary_payload_is_malformed_secondary_answers() {
    // Given: HG Brasil returns a body without the USD block
    let transport = Arc::new(
        ScriptedTransport::default()
            .route(HG_URL, vec![HttpResponse::ok_json(r#"{"results":{}}"#)])
            .route(AWESOME_URL, vec![awesome_rate("5.3987")]),
    );
    let fx = fx_source(&transport, RetryConfig::no_retry());

    // When: the cache is cold
    let read = fx.latest().await;

    // Then: the secondary's rate is served and the failure is counted
    assert_eq!(read.origin, QuoteOrigin::Secondary);
    assert_eq!(read.data.usd_brl, dec!(5.3987));
    assert_eq!(fx.breaker().consecutive_failures(), 1);
}

// =============================================================================
// Index rates
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_one_index_series_fails_its_last_published_value_is_kept() {
    // Given: BCB answers every series once, then only CDI
    let transport = Arc::new(
        ScriptedTransport::default()
            .route(CDI_URL, vec![sgs_value("0.0550"), sgs_value("0.0551")])
            .route(SELIC_URL, vec![sgs_value("0.0560"), server_error()])
            .route(IPCA_URL, vec![sgs_value("0.56")]),
    );
    let http: Arc<dyn HttpClient> = transport.clone();
    let config = OrchestratorConfig {
        freshness: Duration::from_secs(12 * 60 * 60),
        retry: RetryConfig::no_retry(),
        ..OrchestratorConfig::default()
    };
    let indices = SourceOrchestrator::<IndexRates>::new(
        "indices",
        config,
        Arc::new(BcbAdapter::new(http).with_url_template(BCB_TEMPLATE)),
        IndexRates::last_resort(),
    );

    let first = indices.latest().await;
    assert_eq!(first.origin, QuoteOrigin::Primary);
    assert_eq!(first.data.selic, dec!(0.0560));

    // When: the next refresh only gets CDI back
    let second = indices.refresh().await;

    // Then: SELIC and IPCA keep the real values instead of the fallback constants
    assert_eq!(second.origin, QuoteOrigin::Primary);
    assert_eq!(second.data.cdi, dec!(0.0551));
    assert_eq!(second.data.selic, dec!(0.0560));
    assert_eq!(second.data.ipca, dec!(0.56));

    let cached = indices.latest().await;
    assert_eq!(cached.origin, QuoteOrigin::Cache);
    assert_eq!(cached.data, second.data);
    assert_eq!(transport.calls_to(CDI_URL), 2);
}
