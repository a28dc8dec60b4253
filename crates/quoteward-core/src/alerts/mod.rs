//! One-shot price alerts evaluated against cached quotes.
//!
//! Lifecycle: an alert is created `ACTIVE` with a condition derived from the
//! quote at creation time, is re-evaluated by periodic sweeps and becomes
//! `FIRED` at most once. A fired alert is never evaluated again.

mod engine;
mod error;
mod model;
mod notifier;
mod repository;

pub use engine::{AlertEngine, AlertPolicy, SweepReport};
pub use error::{AlertError, NotifyError, RepositoryError};
pub use model::{Alert, AlertCondition, AlertId, AlertMessage, AlertOwner, AlertView, NewAlert};
pub use notifier::{LogNotifier, Notifier, NotifyFuture};
pub use repository::{AlertRepository, InMemoryAlertRepository, RepositoryFuture};
