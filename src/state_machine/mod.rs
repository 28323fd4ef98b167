// State machine module for worker lifecycle tracking
//
// A candidate worker walks installing -> installed -> activating -> activated
// -> redundant. The machine validates each observed step and hands typed
// events to the owner's hooks.

pub mod errors;
pub mod events;
pub mod hooks;
pub mod states;
pub mod worker_state_machine;

// Re-export main types for convenient access
pub use errors::{HookError, HookResult, LifecycleError, LifecycleResult};
pub use events::{LifecycleEvent, UpdateNotice};
pub use hooks::{dispatch_lifecycle_hook, guard_hook, LifecycleHooks, NoopHooks};
pub use states::WorkerState;
pub use worker_state_machine::WorkerStateMachine;
