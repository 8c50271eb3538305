use crate::api::Notifier;

/// Sends notifications to the `tracing` subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "pulseboard::notify", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "pulseboard::notify", "{message}");
    }
}
