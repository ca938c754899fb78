//! Event names shared with the configuration and about windows.
//!
//! Requests from the windows are Tauri commands (`save_config`,
//! `check_for_update`, `open_external`, ...); these are the pushes back.

/// Current configuration, sent when the configuration window is shown.
pub const CONFIG_DATA: &str = "config-data";
/// Version string, sent when the about window is shown.
pub const ABOUT_DATA: &str = "about-data";
pub const UPDATE_AVAILABLE: &str = "update-available";
pub const UPDATE_CHECK_FAILED: &str = "update-check-failed";
