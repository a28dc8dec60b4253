use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the recurring background tasks (source refreshes, alert sweep,
/// limiter cleanup) and stops them deterministically.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<String, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` now and then every `period`. A cycle that overruns delays
    /// the next one instead of bursting; a cycle never overlaps itself.
    pub fn spawn_every<F, Fut>(&mut self, name: impl Into<String>, period: Duration, mut job: F) -> &mut Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!(task = %task_name, "scheduled cycle starting");
                job().await;
            }
        });

        tracing::info!(task = %name, period_secs = period.as_secs(), "scheduled background task");
        if let Some(previous) = self.tasks.insert(name, handle) {
            previous.abort();
        }
        self
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.values().filter(|handle| !handle.is_finished()).count()
    }

    /// Names of tasks that stopped on their own (a panicking job).
    pub fn finished_tasks(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Abort every task and wait until each one has stopped.
    pub async fn shutdown(&mut self) {
        tracing::info!(tasks = self.tasks.len(), "stopping background tasks");
        for (name, handle) in std::mem::take(&mut self.tasks) {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(error) if error.is_cancelled() => {}
                Err(error) => tracing::error!(task = %name, %error, "background task failed"),
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}
