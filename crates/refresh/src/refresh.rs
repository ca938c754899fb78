//! Menu refresh: one pass from the cloud to the tray, plus the timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tuyatray_cloud::Device;
use tuyatray_config::{AppConfig, ConfigError};
use tuyatray_tray::{DeviceSnapshot, MenuNode, MenuState, TrayIcon};

use crate::context::AppContext;

/// Period of the background refresh.
pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// What triggered a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// User action; shows the loading icon while it runs.
    Manual,
    /// Background timer; silent.
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Rebuilds the tray menu from the current gateway.
///
/// Overlapping refreshes are allowed and not de-duplicated; the tray shows
/// whichever finishes last.
#[derive(Clone)]
pub struct Refresher {
    ctx: Arc<AppContext>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Refresher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn state(&self) -> RefreshState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Runs one refresh pass and returns the menu it applied.
    pub async fn refresh(&self, kind: RefreshKind) -> Vec<MenuNode> {
        let _guard = InFlight::enter(&self.in_flight);
        let tray = self.ctx.tray();

        if kind == RefreshKind::Manual {
            tray.set_icon(TrayIcon::Loading);
        }

        let menu = self.collect().await.build_menu();
        tray.set_menu(menu.clone());

        if kind == RefreshKind::Manual {
            tray.set_icon(self.ctx.idle_icon());
        }
        debug!(?kind, items = menu.len(), "tray menu refreshed");
        menu
    }

    /// Saves a new configuration, swaps the gateway and refreshes.
    pub async fn apply_config(&self, config: AppConfig) -> Result<(), ConfigError> {
        self.ctx.save_config(config)?;
        self.refresh(RefreshKind::Manual).await;
        Ok(())
    }

    async fn collect(&self) -> MenuState {
        let gateway = self.ctx.gateway();
        if !gateway.is_usable() {
            return MenuState::Unconfigured;
        }

        let account = self.ctx.config().get().user_id;
        let online: Vec<Device> = gateway
            .list_devices(&account)
            .await
            .into_iter()
            .filter(|d| d.online)
            .collect();

        let statuses = join_all(online.iter().map(|d| gateway.fetch_status(&d.id))).await;

        MenuState::Devices(
            online
                .into_iter()
                .zip(statuses)
                .map(|(device, status)| DeviceSnapshot { device, status })
                .collect(),
        )
    }
}

/// Spawns the background refresh loop. The first pass runs one interval
/// after spawning.
pub fn spawn_auto_refresh(
    refresher: Refresher,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // Skip immediate first tick.

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    refresher.refresh(RefreshKind::Automatic).await;
                }
            }
        }
        debug!("auto refresh stopped");
    })
}
