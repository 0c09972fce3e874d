//! [`Navigator`] definitions.

use tokio::sync::mpsc;

/// Performer of navigation side effects, triggered on session changes.
pub trait Navigator {
    /// Navigates to the provided route `path`.
    fn navigate(&self, path: &str);
}

/// No navigation at all.
impl Navigator for () {
    fn navigate(&self, _: &str) {}
}

/// Forwards route paths to the receiving side (usually, a UI loop).
impl Navigator for mpsc::UnboundedSender<String> {
    fn navigate(&self, path: &str) {
        // Receiver being gone means there is no UI to navigate anymore.
        _ = self.send(path.to_owned());
    }
}
