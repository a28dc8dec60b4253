use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, Ticker, UtcDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl Display for AlertId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction fixed when the alert is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertCondition {
    /// Fire once the quote reaches the target from below.
    Above,
    /// Fire once the quote drops to the target.
    Below,
}

impl AlertCondition {
    /// Target strictly above the current quote means the user waits for a rise.
    pub fn derive(target: Decimal, current: Decimal) -> Self {
        if target > current {
            Self::Above
        } else {
            Self::Below
        }
    }

    pub fn is_met(self, current: Decimal, target: Decimal) -> bool {
        match self {
            Self::Above => current >= target,
            Self::Below => current <= target,
        }
    }
}

/// A user's one-shot price alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Assigned by the repository on first save.
    pub id: Option<AlertId>,
    pub owner_id: u64,
    pub owner_email: String,
    pub ticker: Ticker,
    /// Target in minor units (cents) of `currency`.
    pub target_price: i64,
    pub currency: Currency,
    pub condition: AlertCondition,
    pub fired: bool,
    pub created_at: UtcDateTime,
    pub fired_at: Option<UtcDateTime>,
}

impl Alert {
    pub fn target_amount(&self) -> Decimal {
        Decimal::new(self.target_price, 2)
    }

    pub fn is_active(&self) -> bool {
        !self.fired
    }

    pub(crate) fn mark_fired(&mut self, at: UtcDateTime) {
        self.fired = true;
        self.fired_at = Some(at);
    }
}

/// Alert creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlert {
    pub ticker: String,
    /// Minor units (cents).
    pub target_price: i64,
    pub currency: Currency,
}

/// Authenticated user the alert belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOwner {
    pub id: u64,
    pub email: String,
}

/// Active alert as listed back to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertView {
    pub id: Option<AlertId>,
    pub ticker: Ticker,
    pub target_price: i64,
    pub currency: Currency,
    pub condition: AlertCondition,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            ticker: alert.ticker.clone(),
            target_price: alert.target_price,
            currency: alert.currency,
            condition: alert.condition,
        }
    }
}

/// Rendered HTML notification for a fired alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub address: String,
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    pub fn fired(alert: &Alert, reached: Decimal) -> Self {
        let symbol = alert.currency.symbol();
        let subject = format!("Alert: {} reached {symbol} {reached:.2}", alert.ticker);
        let body = format!(
            "<h2>Price alert triggered!</h2>\n\
             <p><b>{ticker}</b> reached <b>{symbol} {reached:.2}</b>.</p>\n\
             <p>Your target was: {symbol} {target:.2}</p>\n\
             <hr/>\n\
             <p><small>This alert has been deactivated automatically.</small></p>\n",
            ticker = alert.ticker,
            target = alert.target_amount(),
        );

        Self {
            address: alert.owner_email.clone(),
            subject,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn condition_is_derived_from_target_side() {
        assert_eq!(AlertCondition::derive(dec!(40.00), dec!(35.00)), AlertCondition::Above);
        assert_eq!(AlertCondition::derive(dec!(30.00), dec!(35.00)), AlertCondition::Below);
        assert_eq!(AlertCondition::derive(dec!(35.00), dec!(35.00)), AlertCondition::Below);
    }

    #[test]
    fn conditions_include_the_target_itself() {
        assert!(AlertCondition::Above.is_met(dec!(40.00), dec!(40.00)));
        assert!(!AlertCondition::Above.is_met(dec!(39.99), dec!(40.00)));
        assert!(AlertCondition::Below.is_met(dec!(29.50), dec!(30.00)));
    }

    #[test]
    fn fired_message_shows_reached_price_and_target() {
        let alert = Alert {
            id: Some(AlertId(7)),
            owner_id: 1,
            owner_email: String::from("ana@example.com"),
            ticker: Ticker::parse("PETR4").expect("ticker"),
            target_price: 4000,
            currency: Currency::Brl,
            condition: AlertCondition::Above,
            fired: true,
            created_at: UtcDateTime::now(),
            fired_at: None,
        };

        let message = AlertMessage::fired(&alert, dec!(40.5));

        assert_eq!(message.address, "ana@example.com");
        assert_eq!(message.subject, "Alert: PETR4 reached R$ 40.50");
        assert!(message.body.contains("<b>R$ 40.50</b>"));
        assert!(message.body.contains("Your target was: R$ 40.00"));
    }
}
