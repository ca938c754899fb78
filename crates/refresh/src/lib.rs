//! Keeps the tray menu in sync with the cloud.
//!
//! - [`AppContext`]: process-scoped state (configuration, gateway, tray)
//! - [`Refresher`]: one refresh pass plus the periodic timer
//! - [`Dispatcher`]: performs the [`MenuAction`](tuyatray_tray::MenuAction)s
//!   the menu hands back

mod context;
mod dispatch;
mod refresh;

#[cfg(test)]
mod mock;

pub use context::{AppContext, gateway_for};
pub use dispatch::{Dispatcher, ShellActions};
pub use refresh::{AUTO_REFRESH_INTERVAL, RefreshKind, RefreshState, Refresher, spawn_auto_refresh};
