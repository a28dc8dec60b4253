use std::future::Future;
use std::pin::Pin;

use super::NotifyError;

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Outbound delivery channel for fired alerts (email in production).
pub trait Notifier: Send + Sync {
    fn send_html_notification<'a>(
        &'a self,
        address: &'a str,
        subject: &'a str,
        body: &'a str,
    ) -> NotifyFuture<'a>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_html_notification<'a>(
        &'a self,
        address: &'a str,
        subject: &'a str,
        body: &'a str,
    ) -> NotifyFuture<'a> {
        Box::pin(async move {
            tracing::info!(address, subject, body_len = body.len(), "alert notification");
            Ok(())
        })
    }
}
