//! Collaborators the manager talks to but does not implement: the toast/notify
//! surface and the page navigation primitive.

use std::fmt;
use std::sync::Arc;

/// Optional action attached to a notification
#[derive(Clone)]
pub struct NotifyAction {
    pub label: String,
    on_invoke: Arc<dyn Fn() + Send + Sync>,
}

impl NotifyAction {
    pub fn new(label: impl Into<String>, on_invoke: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            on_invoke: Arc::new(on_invoke),
        }
    }

    /// Run the action, as if the user clicked it
    pub fn invoke(&self) {
        (self.on_invoke)();
    }
}

impl fmt::Debug for NotifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyAction")
            .field("label", &self.label)
            .field("on_invoke", &"<Fn()>")
            .finish()
    }
}

/// User-facing notification surface
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, action: Option<NotifyAction>);
}

/// Hosting page navigation
pub trait Navigator: Send + Sync {
    fn reload_page(&self);
}
