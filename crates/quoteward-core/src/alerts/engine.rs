use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    Alert, AlertCondition, AlertError, AlertMessage, AlertOwner, AlertRepository, AlertView,
    NewAlert, Notifier,
};
use crate::board::QuoteBoardSource;
use crate::{Ticker, UtcDateTime};

/// Creation guards and sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Active alerts allowed per owner.
    pub max_active: usize,
    /// Minimum time between two alerts of the same owner.
    pub creation_throttle: Duration,
    /// Alerts evaluated per sweep.
    pub sweep_batch: usize,
    pub sweep_period: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            max_active: 3,
            creation_throttle: Duration::from_secs(120 * 60),
            sweep_batch: 100,
            sweep_period: Duration::from_secs(2 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SweepReport {
    pub evaluated: usize,
    pub fired: usize,
    /// Alerts whose ticker is not on the quote board.
    pub unquoted: usize,
    pub save_failures: usize,
    pub notify_failures: usize,
}

/// Evaluates price alerts against cached quotes. Never calls providers.
pub struct AlertEngine {
    repository: Arc<dyn AlertRepository>,
    notifier: Arc<dyn Notifier>,
    quotes: Arc<dyn QuoteBoardSource>,
    policy: AlertPolicy,
}

impl AlertEngine {
    pub fn new(
        repository: Arc<dyn AlertRepository>,
        notifier: Arc<dyn Notifier>,
        quotes: Arc<dyn QuoteBoardSource>,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            repository,
            notifier,
            quotes,
            policy,
        }
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Validate, guard and store a new alert. An alert whose condition already
    /// holds is stored fired and notified right away.
    pub async fn create_alert(&self, request: NewAlert, owner: &AlertOwner) -> Result<AlertView, AlertError> {
        let ticker = validate(&request)?;

        let active = self.repository.count_active_by_owner(owner.id).await?;
        if active >= self.policy.max_active {
            return Err(AlertError::QuotaExceeded {
                max: self.policy.max_active,
            });
        }

        let now = UtcDateTime::now();
        if let Some(latest) = self.repository.latest_created_at_by_owner(owner.id).await? {
            let elapsed = Duration::from_secs(u64::try_from(now.seconds_since(latest)).unwrap_or(0));
            if elapsed < self.policy.creation_throttle {
                return Err(AlertError::Throttled {
                    retry_after: self.policy.creation_throttle - elapsed,
                });
            }
        }

        let board = self.quotes.quote_board().await;
        let current = board
            .get(&ticker)
            .map(|quote| quote.price_in(request.currency))
            .ok_or_else(|| AlertError::UnknownTicker {
                ticker: ticker.to_string(),
            })?;

        let target = Decimal::new(request.target_price, 2);
        let condition = AlertCondition::derive(target, current);
        let mut alert = Alert {
            id: None,
            owner_id: owner.id,
            owner_email: owner.email.clone(),
            ticker,
            target_price: request.target_price,
            currency: request.currency,
            condition,
            fired: false,
            created_at: now,
            fired_at: None,
        };

        let fire_now = condition.is_met(current, target);
        if fire_now {
            alert.mark_fired(now);
        }
        let saved = self.repository.save(alert).await?;

        tracing::info!(
            owner = owner.id,
            ticker = %saved.ticker,
            currency = %saved.currency,
            target = %target,
            current = %current,
            condition = ?saved.condition,
            fired = saved.fired,
            "alert created"
        );

        if fire_now {
            self.notify(&saved, current).await;
        }
        Ok(AlertView::from(&saved))
    }

    pub async fn list_active_alerts(&self, owner: &AlertOwner) -> Result<Vec<AlertView>, AlertError> {
        let alerts = self.repository.find_active_by_owner(owner.id).await?;
        Ok(alerts.iter().map(AlertView::from).collect())
    }

    /// Evaluate up to one batch of active alerts against the cached board.
    ///
    /// A matching alert is persisted as fired before its notification is
    /// sent; delivery failures are logged and never revert it.
    pub async fn sweep(&self) -> Result<SweepReport, AlertError> {
        let alerts = self.repository.find_active(self.policy.sweep_batch).await?;
        let mut report = SweepReport::default();
        if alerts.is_empty() {
            return Ok(report);
        }

        tracing::info!(alerts = alerts.len(), "evaluating active alerts");
        let board = self.quotes.quote_board().await;

        for mut alert in alerts {
            report.evaluated += 1;
            let Some(quote) = board.get(&alert.ticker) else {
                report.unquoted += 1;
                continue;
            };
            let current = quote.price_in(alert.currency);
            if !alert.condition.is_met(current, alert.target_amount()) {
                continue;
            }

            alert.mark_fired(UtcDateTime::now());
            let saved = match self.repository.save(alert).await {
                Ok(saved) => saved,
                Err(error) => {
                    tracing::error!(%error, "failed to persist fired alert");
                    report.save_failures += 1;
                    continue;
                }
            };

            report.fired += 1;
            if !self.notify(&saved, current).await {
                report.notify_failures += 1;
            }
        }

        tracing::info!(
            evaluated = report.evaluated,
            fired = report.fired,
            unquoted = report.unquoted,
            "alert sweep finished"
        );
        Ok(report)
    }

    async fn notify(&self, alert: &Alert, reached: Decimal) -> bool {
        let message = AlertMessage::fired(alert, reached);
        match self
            .notifier
            .send_html_notification(&message.address, &message.subject, &message.body)
            .await
        {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(alert = ?alert.id, %error, "alert notification failed");
                false
            }
        }
    }
}

fn validate(request: &NewAlert) -> Result<Ticker, AlertError> {
    if request.target_price <= 0 {
        return Err(AlertError::InvalidInput(String::from(
            "target price must be greater than zero",
        )));
    }
    Ticker::parse(&request.ticker).map_err(|error| AlertError::InvalidInput(error.to_string()))
}
