//! Shot persistence.
//!
//! The launcher hands finished [`ShotResult`]s to a [`ShotSink`]. The sink is
//! injected into the controller; when none is configured the record is
//! dropped with a warning.

#[cfg(feature = "persistence")]
pub mod store;

#[cfg(feature = "persistence")]
pub use store::{ShotStore, StoreError};

use crate::report::ShotResult;

/// Receiver for finished shot records.
///
/// `submit` must not block: implementations hand the record off and return.
pub trait ShotSink: Send + Sync {
    fn submit(&self, shot: ShotResult);
}
