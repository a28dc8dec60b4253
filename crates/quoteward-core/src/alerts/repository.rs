use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};

use super::{Alert, AlertId, RepositoryError};
use crate::UtcDateTime;

pub type RepositoryFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Alert persistence used by the engine.
pub trait AlertRepository: Send + Sync {
    /// Up to `limit` unfired alerts, oldest first.
    fn find_active<'a>(&'a self, limit: usize) -> RepositoryFuture<'a, Vec<Alert>>;

    fn find_active_by_owner<'a>(&'a self, owner_id: u64) -> RepositoryFuture<'a, Vec<Alert>>;

    fn count_active_by_owner<'a>(&'a self, owner_id: u64) -> RepositoryFuture<'a, usize>;

    /// Creation time of the owner's newest alert, fired or not.
    fn latest_created_at_by_owner<'a>(
        &'a self,
        owner_id: u64,
    ) -> RepositoryFuture<'a, Option<UtcDateTime>>;

    /// Insert (assigning an id) or overwrite by id.
    fn save<'a>(&'a self, alert: Alert) -> RepositoryFuture<'a, Alert>;
}

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    alerts: BTreeMap<AlertId, Alert>,
}

/// Process-local repository for the CLI daemon and tests.
#[derive(Debug, Default)]
pub struct InMemoryAlertRepository {
    table: Mutex<Table>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn all(&self) -> Vec<Alert> {
        self.lock().alerts.values().cloned().collect()
    }

    pub fn get(&self, id: AlertId) -> Option<Alert> {
        self.lock().alerts.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    fn save_now(&self, mut alert: Alert) -> Result<Alert, RepositoryError> {
        let mut table = self.lock();
        let id = match alert.id {
            Some(id) if table.alerts.contains_key(&id) => id,
            Some(id) => return Err(RepositoryError::NotFound(id)),
            None => {
                table.next_id += 1;
                AlertId(table.next_id)
            }
        };
        alert.id = Some(id);
        table.alerts.insert(id, alert.clone());
        Ok(alert)
    }
}

impl AlertRepository for InMemoryAlertRepository {
    fn find_active<'a>(&'a self, limit: usize) -> RepositoryFuture<'a, Vec<Alert>> {
        let alerts: Vec<Alert> = self
            .lock()
            .alerts
            .values()
            .filter(|alert| alert.is_active())
            .take(limit)
            .cloned()
            .collect();
        Box::pin(async move { Ok(alerts) })
    }

    fn find_active_by_owner<'a>(&'a self, owner_id: u64) -> RepositoryFuture<'a, Vec<Alert>> {
        let alerts: Vec<Alert> = self
            .lock()
            .alerts
            .values()
            .filter(|alert| alert.owner_id == owner_id && alert.is_active())
            .cloned()
            .collect();
        Box::pin(async move { Ok(alerts) })
    }

    fn count_active_by_owner<'a>(&'a self, owner_id: u64) -> RepositoryFuture<'a, usize> {
        let count = self
            .lock()
            .alerts
            .values()
            .filter(|alert| alert.owner_id == owner_id && alert.is_active())
            .count();
        Box::pin(async move { Ok(count) })
    }

    fn latest_created_at_by_owner<'a>(
        &'a self,
        owner_id: u64,
    ) -> RepositoryFuture<'a, Option<UtcDateTime>> {
        let latest = self
            .lock()
            .alerts
            .values()
            .filter(|alert| alert.owner_id == owner_id)
            .map(|alert| alert.created_at)
            .max();
        Box::pin(async move { Ok(latest) })
    }

    fn save<'a>(&'a self, alert: Alert) -> RepositoryFuture<'a, Alert> {
        let saved = self.save_now(alert);
        Box::pin(async move { saved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertCondition;
    use crate::{Currency, Ticker};
    use std::time::Duration;

    fn alert(owner_id: u64, fired: bool, created_at: UtcDateTime) -> Alert {
        Alert {
            id: None,
            owner_id,
            owner_email: format!("user{owner_id}@example.com"),
            ticker: Ticker::parse("VALE3").expect("ticker"),
            target_price: 6_000,
            currency: Currency::Brl,
            condition: AlertCondition::Above,
            fired,
            created_at,
            fired_at: None,
        }
    }

    #[tokio::test]
    async fn assigns_ids_and_filters_active_alerts() {
        let repository = InMemoryAlertRepository::new();
        let now = UtcDateTime::now();

        let first = repository.save(alert(1, false, now)).await.expect("saved");
        repository.save(alert(1, true, now)).await.expect("saved");
        repository.save(alert(2, false, now)).await.expect("saved");

        assert_eq!(first.id, Some(AlertId(1)));
        assert_eq!(repository.count_active_by_owner(1).await.expect("count"), 1);
        assert_eq!(repository.find_active(10).await.expect("active").len(), 2);
        assert_eq!(repository.find_active(1).await.expect("active")[0].id, Some(AlertId(1)));
    }

    #[tokio::test]
    async fn latest_creation_includes_fired_alerts() {
        let repository = InMemoryAlertRepository::new();
        let now = UtcDateTime::now();
        let earlier = now.minus(Duration::from_secs(3600));

        repository.save(alert(3, false, earlier)).await.expect("saved");
        repository.save(alert(3, true, now)).await.expect("saved");

        let latest = repository.latest_created_at_by_owner(3).await.expect("query");
        assert_eq!(latest, Some(now));
        assert_eq!(repository.latest_created_at_by_owner(4).await.expect("query"), None);
    }

    #[tokio::test]
    async fn saving_unknown_id_fails() {
        let repository = InMemoryAlertRepository::new();
        let mut stray = alert(1, false, UtcDateTime::now());
        stray.id = Some(AlertId(99));

        let error = repository.save(stray).await.expect_err("id was never assigned");
        assert_eq!(error, RepositoryError::NotFound(AlertId(99)));
    }
}
