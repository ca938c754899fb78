//! Test doubles for the gateway and tray.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tuyatray_cloud::{Device, DeviceGateway, GatewayFuture, StatusEntry, StatusValue};
use tuyatray_config::AppConfig;
use tuyatray_tray::{MenuNode, TrayIcon, TrayPresenter, TrayUpdate};

pub(crate) fn usable_config() -> AppConfig {
    AppConfig {
        base_url: "https://openapi.tuyaeu.com".into(),
        access_key: "ak".into(),
        secret_key: "sk".into(),
        user_id: "uid".into(),
        run_on_startup: true,
    }
}

/// In-memory gateway recording every call as `op:args`.
#[derive(Default)]
pub(crate) struct MockGateway {
    usable: bool,
    devices: Vec<Device>,
    status: Mutex<HashMap<String, Vec<StatusEntry>>>,
    fetch_delay: Duration,
    accept_commands: bool,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub(crate) fn new(devices: Vec<Device>) -> Arc<Self> {
        Arc::new(Self::builder(devices))
    }

    pub(crate) fn builder(devices: Vec<Device>) -> Self {
        Self {
            usable: true,
            devices,
            accept_commands: true,
            ..Self::default()
        }
    }

    pub(crate) fn unusable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_status(self, device_id: &str, status: Vec<StatusEntry>) -> Self {
        if let Ok(mut map) = self.status.lock() {
            map.insert(device_id.to_string(), status);
        }
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub(crate) fn rejecting_commands(mut self) -> Self {
        self.accept_commands = false;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&format!("{op}:")))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DeviceGateway for MockGateway {
    fn is_usable(&self) -> bool {
        self.usable
    }

    fn list_devices<'a>(&'a self, account_id: &'a str) -> GatewayFuture<'a, Vec<Device>> {
        Box::pin(async move {
            self.record(format!("list:{account_id}"));
            self.devices.clone()
        })
    }

    fn fetch_status<'a>(&'a self, device_id: &'a str) -> GatewayFuture<'a, Vec<StatusEntry>> {
        Box::pin(async move {
            self.record(format!("status:{device_id}"));
            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            self.status
                .lock()
                .unwrap()
                .get(device_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    fn send_command<'a>(
        &'a self,
        device_id: &'a str,
        code: &'a str,
        value: StatusValue,
    ) -> GatewayFuture<'a, bool> {
        Box::pin(async move {
            self.record(format!("send:{device_id}:{code}:{value}"));
            if self.accept_commands {
                let mut status = self.status.lock().unwrap();
                let entry = status
                    .get_mut(device_id)
                    .and_then(|entries| entries.iter_mut().find(|e| e.code == code));
                if let Some(entry) = entry {
                    entry.value = value;
                }
            }
            self.accept_commands
        })
    }
}

/// Tray presenter that keeps every update it receives.
#[derive(Default)]
pub(crate) struct RecordingTray {
    updates: Mutex<Vec<TrayUpdate>>,
}

impl RecordingTray {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn updates(&self) -> Vec<TrayUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn menus(&self) -> Vec<Vec<MenuNode>> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                TrayUpdate::Menu(menu) => Some(menu),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_menu(&self) -> Vec<MenuNode> {
        self.menus().pop().unwrap_or_default()
    }

    pub(crate) fn icons(&self) -> Vec<TrayIcon> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                TrayUpdate::Icon(icon) => Some(icon),
                _ => None,
            })
            .collect()
    }
}

impl TrayPresenter for RecordingTray {
    fn set_menu(&self, menu: Vec<MenuNode>) {
        self.updates.lock().unwrap().push(TrayUpdate::Menu(menu));
    }

    fn set_icon(&self, icon: TrayIcon) {
        self.updates.lock().unwrap().push(TrayUpdate::Icon(icon));
    }

    fn set_tooltip(&self, tooltip: &str) {
        self.updates
            .lock()
            .unwrap()
            .push(TrayUpdate::Tooltip(tooltip.to_string()));
    }
}
