/// Side channel surfacing human-readable outcomes to whoever drives the
/// services, e.g. toasts in a UI or lines on a terminal
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn success(&self, message: &str) {
        (**self).success(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}
