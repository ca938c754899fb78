//! Tray menu synthesis for Tuya devices.
//!
//! Turns device status vectors into a declarative menu tree and carries
//! menu, icon and tooltip updates to the desktop shell:
//! - [`MenuState::build_menu`]: pure menu construction
//! - [`TrayPresenter`]: the surface the refresh logic renders into
//! - [`TrayHandle`]: channel-backed presenter drained by the shell
//!
//! Menu actions are data ([`MenuAction`]) so the same tree can be rendered
//! by any native toolkit and tested without one.

mod menu;
mod tray;

pub use menu::{
    CommandDescriptor, DeviceSnapshot, MenuAction, MenuItem, MenuNode, MenuState, device_menu,
    format_label, status_node,
};
pub use tray::{TrayConfig, TrayHandle, TrayIcon, TrayPresenter, TrayUpdate, tooltip};
