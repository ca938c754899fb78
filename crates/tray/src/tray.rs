//! Channel-backed tray presenter.
//!
//! The refresh logic pushes [`TrayUpdate`]s through a [`TrayHandle`]; the
//! desktop shell owns the receiving end and applies them to the native tray
//! on its own thread.

use std::sync::mpsc;

use tracing::debug;

use crate::menu::MenuNode;

/// Icon variants the tray can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayIcon {
    #[default]
    Default,
    /// Shown while a manual refresh is in flight.
    Loading,
    /// Shown once a newer release has been detected.
    UpdateAvailable,
}

/// Updates from the application core to the tray.
#[derive(Debug, Clone, PartialEq)]
pub enum TrayUpdate {
    Menu(Vec<MenuNode>),
    Icon(TrayIcon),
    Tooltip(String),
    /// Stop processing updates.
    Shutdown,
}

/// Surface the refresh logic renders into.
///
/// Implementations must tolerate being called from any task.
pub trait TrayPresenter: Send + Sync {
    fn set_menu(&self, menu: Vec<MenuNode>);
    fn set_icon(&self, icon: TrayIcon);
    fn set_tooltip(&self, tooltip: &str);
}

/// Tray configuration.
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Application name, the tooltip when no update is pending.
    pub app_name: String,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            app_name: "Tuya Smart Tray".into(),
        }
    }
}

/// Sending side of the tray channel.
pub struct TrayHandle {
    config: TrayConfig,
    tx: mpsc::Sender<TrayUpdate>,
}

impl TrayHandle {
    /// Creates a handle and the receiver the shell drains.
    pub fn new(config: TrayConfig) -> (Self, mpsc::Receiver<TrayUpdate>) {
        let (tx, rx) = mpsc::channel();
        (Self { config, tx }, rx)
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    /// Asks the receiving side to stop.
    pub fn shutdown(&self) {
        self.send(TrayUpdate::Shutdown);
    }

    fn send(&self, update: TrayUpdate) {
        if self.tx.send(update).is_err() {
            debug!("tray receiver dropped, update discarded");
        }
    }
}

impl TrayPresenter for TrayHandle {
    fn set_menu(&self, menu: Vec<MenuNode>) {
        self.send(TrayUpdate::Menu(menu));
    }

    fn set_icon(&self, icon: TrayIcon) {
        self.send(TrayUpdate::Icon(icon));
    }

    fn set_tooltip(&self, tooltip: &str) {
        self.send(TrayUpdate::Tooltip(tooltip.to_string()));
    }
}

/// Tooltip text, mentioning a pending update when there is one.
pub fn tooltip(app_name: &str, latest_version: Option<&str>) -> String {
    match latest_version {
        Some(v) => format!("{app_name} (update available: v{v})"),
        None => app_name.to_string(),
    }
}
