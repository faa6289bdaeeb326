//! elvn-core library.
//!
//! Every local mutation of a note, list or the timer is captured as a
//! [`event::SyncEvent`], written to the device journal as one raw line, and
//! later merged against a remote journal with the pairwise precedence rule
//! in [`sync`].
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums in the library, `anyhow::Result` at the edges.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod event;
pub mod item;
pub mod journal;
pub mod lock;
pub mod sync;
