//! Behavior-driven tests for price alerts.
//!
//! The engine runs against the in-memory repository, a recording notifier and
//! a quote board the test moves by hand.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quoteward_core::alerts::{
    Alert, AlertCondition, AlertEngine, AlertError, AlertOwner, AlertPolicy, AlertRepository,
    InMemoryAlertRepository, NewAlert, Notifier, NotifyError, NotifyFuture,
};
use quoteward_core::{
    Currency, DualQuote, FxRate, QuoteBoard, QuoteBoardSource, Ticker, UtcDateTime,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct MovableBoard {
    board: Mutex<QuoteBoard>,
}

impl MovableBoard {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            board: Mutex::new(QuoteBoard::empty(FxRate::new(dec!(5.00)))),
        })
    }

    fn set_brl(&self, ticker: &str, brl: Decimal) {
        let ticker = Ticker::parse(ticker).expect("valid ticker");
        self.board
            .lock()
            .expect("board lock")
            .insert(ticker, DualQuote::new(brl, brl / dec!(5.00)));
    }
}

impl QuoteBoardSource for MovableBoard {
    fn quote_board<'a>(&'a self) -> Pin<Box<dyn Future<Output = QuoteBoard> + Send + 'a>> {
        let board = self.board.lock().expect("board lock").clone();
        Box::pin(async move { board })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
    failing: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send_html_notification<'a>(
        &'a self,
        address: &'a str,
        subject: &'a str,
        body: &'a str,
    ) -> NotifyFuture<'a> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((address.to_owned(), subject.to_owned(), body.to_owned()));
        let failing = self.failing;
        Box::pin(async move {
            if failing {
                Err(NotifyError {
                    address: address.to_owned(),
                    message: String::from("smtp relay refused"),
                })
            } else {
                Ok(())
            }
        })
    }
}

struct Harness {
    engine: AlertEngine,
    repository: Arc<InMemoryAlertRepository>,
    notifier: Arc<RecordingNotifier>,
    board: Arc<MovableBoard>,
}

fn harness_with(notifier: RecordingNotifier) -> Harness {
    let repository = Arc::new(InMemoryAlertRepository::new());
    let notifier = Arc::new(notifier);
    let board = MovableBoard::new();
    let engine = AlertEngine::new(
        repository.clone(),
        notifier.clone(),
        board.clone(),
        AlertPolicy::default(),
    );
    Harness {
        engine,
        repository,
        notifier,
        board,
    }
}

fn harness() -> Harness {
    harness_with(RecordingNotifier::default())
}

fn owner() -> AlertOwner {
    AlertOwner {
        id: 42,
        email: String::from("investor@example.com"),
    }
}

fn request(ticker: &str, target_price: i64, currency: Currency) -> NewAlert {
    NewAlert {
        ticker: ticker.to_owned(),
        target_price,
        currency,
    }
}

fn seeded_alert(owner: &AlertOwner, ticker: &str, age: Duration) -> Alert {
    Alert {
        id: None,
        owner_id: owner.id,
        owner_email: owner.email.clone(),
        ticker: Ticker::parse(ticker).expect("valid ticker"),
        target_price: 10_000,
        currency: Currency::Brl,
        condition: AlertCondition::Above,
        fired: false,
        created_at: UtcDateTime::now().minus(age),
        fired_at: None,
    }
}

// =============================================================================
// Alert lifecycle
// =============================================================================

#[tokio::test]
async fn when_quote_rises_to_target_alert_fires_exactly_once() {
    // Given: PETR4 at R$ 35.00 and a R$ 40.00 target
    let h = harness();
    h.board.set_brl("PETR4", dec!(35.00));

    // When: the alert is created
    let view = h
        .engine
        .create_alert(request("petr4", 4000, Currency::Brl), &owner())
        .await
        .expect("alert should be created");

    // Then: it waits for a rise and is active
    assert_eq!(view.condition, AlertCondition::Above);
    assert_eq!(view.ticker.as_str(), "PETR4");
    assert_eq!(h.engine.list_active_alerts(&owner()).await.expect("list").len(), 1);

    // When: a sweep runs while the quote is still below target
    let quiet = h.engine.sweep().await.expect("sweep");

    // Then: nothing fires
    assert_eq!(quiet.evaluated, 1);
    assert_eq!(quiet.fired, 0);
    assert!(h.notifier.sent().is_empty());

    // When: the quote reaches R$ 40.50 and the next sweep runs
    h.board.set_brl("PETR4", dec!(40.50));
    let report = h.engine.sweep().await.expect("sweep");

    // Then: the alert fires, is persisted as fired and one message goes out
    assert_eq!(report.fired, 1);
    let stored = h.repository.all();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].fired);
    assert!(stored[0].fired_at.is_some());

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "investor@example.com");
    assert_eq!(sent[0].1, "Alert: PETR4 reached R$ 40.50");
    assert!(sent[0].2.contains("Your target was: R$ 40.00"));

    // When: later sweeps run with the quote still above target
    let again = h.engine.sweep().await.expect("sweep");

    // Then: the fired alert is never evaluated or notified again
    assert_eq!(again.evaluated, 0);
    assert_eq!(h.notifier.sent().len(), 1);
    assert!(h.engine.list_active_alerts(&owner()).await.expect("list").is_empty());
}

#[tokio::test]
async fn when_target_is_already_met_at_creation_alert_fires_immediately() {
    // Given: VALE3 at R$ 62.10
    let h = harness();
    h.board.set_brl("VALE3", dec!(62.10));

    // When: the owner asks to be told when it drops to R$ 62.10
    let view = h
        .engine
        .create_alert(request("VALE3", 6210, Currency::Brl), &owner())
        .await
        .expect("alert should be created");

    // Then: it is stored fired and notified right away
    assert_eq!(view.condition, AlertCondition::Below);
    let stored = h.repository.all();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].fired);
    assert_eq!(h.notifier.sent().len(), 1);

    // Then: a sweep has nothing left to do
    assert_eq!(h.engine.sweep().await.expect("sweep").fired, 0);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn when_alert_is_in_dollars_the_usd_leg_is_compared() {
    // Given: BBAS3 at R$ 50.00, i.e. US$ 10.00 at 5.00
    let h = harness();
    h.board.set_brl("BBAS3", dec!(50.00));

    // When: the owner sets a US$ 9.00 target
    let view = h
        .engine
        .create_alert(request("BBAS3", 900, Currency::Usd), &owner())
        .await
        .expect("alert should be created");
    assert_eq!(view.condition, AlertCondition::Below);

    // When: the quote falls to R$ 44.00 (US$ 8.80)
    h.board.set_brl("BBAS3", dec!(44.00));
    let report = h.engine.sweep().await.expect("sweep");

    // Then: the alert fires and the message uses dollars
    assert_eq!(report.fired, 1);
    assert_eq!(h.notifier.sent()[0].1, "Alert: BBAS3 reached US$ 8.80");
}

// =============================================================================
// Creation guards
// =============================================================================

#[tokio::test]
async fn when_three_alerts_are_active_a_fourth_is_rejected_and_not_persisted() {
    // Given: an owner with three active alerts created long ago
    let h = harness();
    h.board.set_brl("ITUB4", dec!(33.00));
    for ticker in ["PETR4", "VALE3", "WEGE3"] {
        h.repository
            .save(seeded_alert(&owner(), ticker, Duration::from_secs(24 * 60 * 60)))
            .await
            .expect("seeded");
    }

    // When: a fourth alert is requested
    let error = h
        .engine
        .create_alert(request("ITUB4", 3500, Currency::Brl), &owner())
        .await
        .expect_err("quota must reject");

    // Then: the quota error is returned and nothing new is stored
    assert!(matches!(error, AlertError::QuotaExceeded { max: 3 }));
    assert_eq!(error.code(), "alert.quota_exceeded");
    assert_eq!(h.repository.len(), 3);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn when_an_alert_was_created_recently_creation_is_throttled() {
    // Given: an alert created 30 minutes ago
    let h = harness();
    h.board.set_brl("ITUB4", dec!(33.00));
    h.repository
        .save(seeded_alert(&owner(), "PETR4", Duration::from_secs(30 * 60)))
        .await
        .expect("seeded");

    // When: another alert is requested
    let error = h
        .engine
        .create_alert(request("ITUB4", 3500, Currency::Brl), &owner())
        .await
        .expect_err("throttle must reject");

    // Then: the caller is told to wait out the rest of the two hours
    match error {
        AlertError::Throttled { retry_after } => {
            assert!(retry_after > Duration::from_secs(85 * 60));
            assert!(retry_after <= Duration::from_secs(90 * 60));
        }
        other => panic!("expected throttling, got {other:?}"),
    }
    assert_eq!(h.repository.len(), 1);
}

#[tokio::test]
async fn when_ticker_has_no_cached_quote_creation_fails_without_persisting() {
    // Given: an empty quote board
    let h = harness();

    // When: an alert is requested for an unquoted ticker
    let error = h
        .engine
        .create_alert(request("XPTO3", 1000, Currency::Brl), &owner())
        .await
        .expect_err("unknown ticker");

    // Then: nothing is stored
    assert!(matches!(error, AlertError::UnknownTicker { ref ticker } if ticker == "XPTO3"));
    assert!(h.repository.is_empty());
}

#[tokio::test]
async fn when_input_is_invalid_creation_is_rejected() {
    let h = harness();
    h.board.set_brl("PETR4", dec!(35.00));

    for bad in [
        request("", 4000, Currency::Brl),
        request("PETR-4", 4000, Currency::Brl),
        request("PETR4", 0, Currency::Brl),
        request("PETR4", -100, Currency::Usd),
    ] {
        let error = h.engine.create_alert(bad, &owner()).await.expect_err("invalid");
        assert_eq!(error.code(), "alert.invalid_input");
    }
    assert!(h.repository.is_empty());
}

// =============================================================================
// Sweep resilience
// =============================================================================

#[tokio::test]
async fn when_notification_fails_alert_stays_fired() {
    // Given: a failing delivery channel and an alert about to trigger
    let h = harness_with(RecordingNotifier::failing());
    h.board.set_brl("PETR4", dec!(35.00));
    h.engine
        .create_alert(request("PETR4", 4000, Currency::Brl), &owner())
        .await
        .expect("alert should be created");

    // When: the quote crosses the target
    h.board.set_brl("PETR4", dec!(41.00));
    let report = h.engine.sweep().await.expect("sweep");

    // Then: the failure is counted, the alert is not re-armed
    assert_eq!(report.fired, 1);
    assert_eq!(report.notify_failures, 1);
    assert!(h.repository.all()[0].fired);
    assert_eq!(h.engine.sweep().await.expect("sweep").evaluated, 0);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn when_ticker_leaves_the_board_its_alert_waits() {
    // Given: an active alert whose ticker is no longer quoted
    let h = harness();
    h.repository
        .save(seeded_alert(&owner(), "OIBR3", Duration::from_secs(60)))
        .await
        .expect("seeded");

    // When: a sweep runs
    let report = h.engine.sweep().await.expect("sweep");

    // Then: the alert is skipped and stays active
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.unquoted, 1);
    assert_eq!(report.fired, 0);
    assert!(h.repository.all()[0].is_active());
}
