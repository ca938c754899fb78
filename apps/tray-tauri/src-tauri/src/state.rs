use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tuyatray_refresh::{AppContext, Refresher};
use tuyatray_tray::TrayHandle;
use tuyatray_update::{UpdateChecker, UpdateState};

/// Shared application state managed by Tauri.
pub struct TrayState {
    pub ctx: Arc<AppContext>,
    pub refresher: Refresher,
    pub tray: Arc<TrayHandle>,
    pub checker: Option<Arc<UpdateChecker>>,
    pub updates: Arc<UpdateState>,
    pub shutdown: CancellationToken,
}
