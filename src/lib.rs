//! Settings synchronization core for an admin theming toolkit
//!
//! The crate is organized leaf-first: `events` and `settings` have no
//! internal dependencies, `state` builds on both, `api` is the HTTP
//! boundary, `preview` derives CSS from snapshots, and `session` wires
//! everything into one context object.

#![forbid(unsafe_code)]

pub mod api;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod palette;
pub mod preview;
pub mod session;
pub mod settings;
pub mod state;
pub mod template;

pub use error::SyncError;
pub use session::Session;
pub use settings::{SettingValue, Snapshot};
