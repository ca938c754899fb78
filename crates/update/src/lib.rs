//! Checks whether a newer release has been published.
//!
//! The check is informational: it feeds the tray tooltip and the about
//! window and never touches device state.

mod checker;
mod error;
mod schedule;
mod version;

pub use checker::{DESCRIPTOR_URL, DOWNLOAD_URL, UpdateChecker, UpdateInfo, UpdateState};
pub use error::UpdateError;
pub use schedule::{CHECK_INTERVAL, INITIAL_DELAY, spawn_periodic};
pub use version::is_newer_version;
