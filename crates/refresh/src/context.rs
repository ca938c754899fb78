//! Process-scoped application state.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};
use tuyatray_cloud::{CloudGateway, DeviceGateway};
use tuyatray_config::{AppConfig, ConfigError, ConfigStore};
use tuyatray_tray::{TrayIcon, TrayPresenter, tooltip};

/// Builds the gateway for a configuration. Incomplete credentials give an
/// unconfigured gateway that never touches the network.
pub fn gateway_for(config: &AppConfig) -> Arc<dyn DeviceGateway> {
    if !config.is_usable() {
        return Arc::new(CloudGateway::unconfigured());
    }
    Arc::new(CloudGateway::new(
        &config.base_url,
        &config.access_key,
        &config.secret_key,
    ))
}

/// Owns the configuration store, the current gateway and the tray.
pub struct AppContext {
    config: ConfigStore,
    gateway: RwLock<Arc<dyn DeviceGateway>>,
    tray: Arc<dyn TrayPresenter>,
    app_name: String,
    latest_version: RwLock<Option<String>>,
}

impl AppContext {
    /// Creates the context with a gateway built from the stored configuration.
    pub fn init(
        config: ConfigStore,
        tray: Arc<dyn TrayPresenter>,
        app_name: impl Into<String>,
    ) -> Arc<Self> {
        let gateway = gateway_for(&config.get());
        info!(usable = gateway.is_usable(), "application context initialized");
        Self::with_gateway(config, gateway, tray, app_name)
    }

    /// Creates the context around an explicit gateway.
    pub fn with_gateway(
        config: ConfigStore,
        gateway: Arc<dyn DeviceGateway>,
        tray: Arc<dyn TrayPresenter>,
        app_name: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            gateway: RwLock::new(gateway),
            tray,
            app_name: app_name.into(),
            latest_version: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn tray(&self) -> &Arc<dyn TrayPresenter> {
        &self.tray
    }

    /// The gateway in use right now. Callers keep the returned handle for a
    /// whole refresh, so a concurrent replacement never splits one pass.
    pub fn gateway(&self) -> Arc<dyn DeviceGateway> {
        match self.gateway.read() {
            Ok(gateway) => Arc::clone(&gateway),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace_gateway(&self, gateway: Arc<dyn DeviceGateway>) {
        debug!(usable = gateway.is_usable(), "gateway replaced");
        match self.gateway.write() {
            Ok(mut current) => *current = gateway,
            Err(poisoned) => *poisoned.into_inner() = gateway,
        }
    }

    /// Persists `config` and rebuilds the gateway from it.
    pub fn save_config(&self, config: AppConfig) -> Result<(), ConfigError> {
        let gateway = gateway_for(&config);
        self.config.save(config)?;
        self.replace_gateway(gateway);
        Ok(())
    }

    /// Records the newest release seen, or `None` when up to date, and
    /// updates the tooltip and icon accordingly.
    pub fn set_latest_version(&self, version: Option<String>) {
        self.tray
            .set_tooltip(&tooltip(&self.app_name, version.as_deref()));
        if let Ok(mut latest) = self.latest_version.write() {
            *latest = version;
        }
        self.tray.set_icon(self.idle_icon());
    }

    pub fn latest_version(&self) -> Option<String> {
        self.latest_version
            .read()
            .ok()
            .and_then(|v| v.clone())
    }

    /// Icon shown when no manual refresh is running.
    pub fn idle_icon(&self) -> TrayIcon {
        if self.latest_version().is_some() {
            TrayIcon::UpdateAvailable
        } else {
            TrayIcon::Default
        }
    }

    /// Drops the live gateway; later refreshes see an unconfigured one.
    pub fn teardown(&self) {
        self.replace_gateway(Arc::new(CloudGateway::unconfigured()));
        info!("application context torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGateway, RecordingTray, usable_config};
    use tuyatray_tray::TrayUpdate;

    #[test]
    fn gateway_follows_configuration() {
        assert!(!gateway_for(&AppConfig::default()).is_usable());
        assert!(gateway_for(&usable_config()).is_usable());

        let mut missing_account = usable_config();
        missing_account.user_id.clear();
        assert!(!gateway_for(&missing_account).is_usable());
    }

    #[test]
    fn init_reads_stored_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        ConfigStore::open(&path).save(usable_config()).unwrap();

        let ctx = AppContext::init(ConfigStore::open(&path), RecordingTray::new(), "Tray");
        assert!(ctx.gateway().is_usable());
    }

    #[test]
    fn save_rebuilds_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config.json"));
        let ctx = AppContext::with_gateway(
            store,
            MockGateway::unusable(),
            RecordingTray::new(),
            "Tray",
        );
        assert!(!ctx.gateway().is_usable());

        ctx.save_config(usable_config()).unwrap();
        assert!(ctx.gateway().is_usable());
        assert_eq!(ctx.config().get(), usable_config());
    }

    #[test]
    fn teardown_leaves_unconfigured_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::with_gateway(
            ConfigStore::open(dir.path().join("config.json")),
            MockGateway::new(vec![]),
            RecordingTray::new(),
            "Tray",
        );
        assert!(ctx.gateway().is_usable());
        ctx.teardown();
        assert!(!ctx.gateway().is_usable());
    }

    #[test]
    fn latest_version_drives_tooltip_and_icon() {
        let dir = tempfile::tempdir().unwrap();
        let tray = RecordingTray::new();
        let ctx = AppContext::with_gateway(
            ConfigStore::open(dir.path().join("config.json")),
            MockGateway::unusable(),
            tray.clone(),
            "Tray",
        );

        ctx.set_latest_version(Some("3.0.0".into()));
        assert_eq!(ctx.idle_icon(), TrayIcon::UpdateAvailable);
        ctx.set_latest_version(None);
        assert_eq!(ctx.idle_icon(), TrayIcon::Default);

        assert_eq!(
            tray.updates(),
            vec![
                TrayUpdate::Tooltip("Tray (update available: v3.0.0)".into()),
                TrayUpdate::Icon(TrayIcon::UpdateAvailable),
                TrayUpdate::Tooltip("Tray".into()),
                TrayUpdate::Icon(TrayIcon::Default),
            ]
        );
    }
}
