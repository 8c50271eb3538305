mod changelog;
pub use changelog::ChangelogService;

mod config;
pub use config::StoreConfig;

mod feedback;
pub use feedback::FeedbackService;

mod fields;

mod http;
pub use http::HttpRecordStore;

mod notify;
pub use notify::LogNotifier;

mod roadmap;
pub use roadmap::RoadmapService;

pub mod api {
    pub use pulseboard_api::*;
}

use api::{Error, Notifier, RecordStore};

/// Entry point to the changelog, feedback and roadmap services
///
/// The store and notifier are injected, nothing here is process-global.
pub struct Client<S, N> {
    store: S,
    notifier: N,
}

impl<S: RecordStore, N: Notifier> Client<S, N> {
    pub fn new(store: S, notifier: N) -> Client<S, N> {
        Client { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn changelog(&self) -> ChangelogService<'_, S, N> {
        ChangelogService::new(self)
    }

    pub fn feedback(&self) -> FeedbackService<'_, S, N> {
        FeedbackService::new(self)
    }

    pub fn roadmap(&self) -> RoadmapService<'_, S, N> {
        RoadmapService::new(self)
    }

    /// Logs and notifies a failure before handing it back unchanged
    pub(crate) fn reported<T>(&self, what: &str, res: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &res {
            tracing::error!(?err, "failed {what}");
            match err {
                Error::Validation { message, fields } => {
                    for f in fields {
                        self.notifier
                            .error(&format!("{}: {}", f.field_label, f.message));
                    }
                    self.notifier.error(message);
                }
                err => self.notifier.error(&format!("Failed {what}: {err}")),
            }
        }
        res
    }

    pub(crate) fn succeeded(&self, message: &str) {
        tracing::debug!("{message}");
        self.notifier.success(message);
    }
}
