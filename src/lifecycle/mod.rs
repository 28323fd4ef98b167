//! Update detection and controller handover for one registration.

pub mod consent;
pub mod coordinator;
pub mod watcher;

pub use consent::{ConsentHandle, ConsentRequest};
pub use coordinator::{ControllerChangeOutcome, HandoverCoordinator, HandoverError};
pub use watcher::{UpdateWatcher, WatcherOutput};
