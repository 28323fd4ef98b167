#![allow(clippy::doc_markdown)] // Allow technical terms like skipWaiting in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Service Worker Core
//!
//! Lifecycle manager for a web application's background worker.
//!
//! ## Overview
//!
//! The manager registers a worker script with the hosting environment,
//! follows every worker that registration produces through
//! `Installing → Installed → Activating → Activated → Redundant`, tells a
//! first install apart from an update, and, once the user agrees, hands
//! control to the new version and reloads the page exactly once.
//!
//! The hosting environment is only ever reached through the
//! [`platform::ServiceWorkerContainer`] trait, and the page through the
//! [`presentation::Notifier`] and [`presentation::Navigator`] traits, so the
//! whole lifecycle runs (and is tested) without a browser.
//!
//! ## Module Organization
//!
//! - [`registration`] - Scope resolution and the idempotent registration gateway
//! - [`state_machine`] - Worker states, transition rules and lifecycle hooks
//! - [`lifecycle`] - Update watcher, consent and handover coordination
//! - [`manager`] - Event loop owning all lifecycle state, default hooks
//! - [`platform`] - Boundary to the hosting environment
//! - [`presentation`] - Notification and navigation collaborators
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and domain log macros
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serviceworker_core::ServiceWorkerManager;
//! use serviceworker_core::test_helpers::{RecordingNavigator, RecordingNotifier, SimulatedContainer};
//!
//! # async fn example() -> serviceworker_core::Result<()> {
//! serviceworker_core::logging::init_structured_logging();
//!
//! let handle = ServiceWorkerManager::default_manager(
//!     "/app/sw.js",
//!     Arc::new(SimulatedContainer::new()),
//!     Arc::new(RecordingNotifier::default()),
//!     Arc::new(RecordingNavigator::default()),
//! )
//! .load()
//! .await?;
//!
//! println!("registered scope {}", handle.registration().scope());
//! handle.teardown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod manager;
pub mod platform;
pub mod presentation;
pub mod registration;
pub mod state_machine;
pub mod test_helpers;

pub use crate::config::{ConfigLoader, ManagerConfig};
pub use error::{Result, ServiceWorkerError};
pub use lifecycle::{ConsentHandle, HandoverError};
pub use manager::{
    DefaultLifecycleHooks, LifecycleSummary, ManagerEvent, ManagerHandle, ServiceWorkerManager,
};
pub use platform::{PlatformSignal, ServiceWorkerContainer, WorkerId};
pub use presentation::{Navigator, Notifier, NotifyAction};
pub use registration::{RegistrationError, RegistrationGateway, RegistrationHandle};
pub use state_machine::{LifecycleError, LifecycleEvent, LifecycleHooks, UpdateNotice, WorkerState};
