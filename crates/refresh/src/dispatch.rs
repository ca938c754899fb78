//! Performs the actions the tray menu hands back.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tuyatray_tray::{CommandDescriptor, MenuAction};

use crate::refresh::{RefreshKind, Refresher};

/// Window and lifecycle operations owned by the desktop shell.
pub trait ShellActions: Send + Sync {
    fn open_configuration(&self);
    fn open_about(&self);
    fn quit(&self);
}

/// Routes [`MenuAction`]s to the gateway or the shell.
#[derive(Clone)]
pub struct Dispatcher {
    refresher: Refresher,
    shell: Arc<dyn ShellActions>,
}

impl Dispatcher {
    pub fn new(refresher: Refresher, shell: Arc<dyn ShellActions>) -> Self {
        Self { refresher, shell }
    }

    pub async fn dispatch(&self, action: MenuAction) {
        match action {
            MenuAction::Command(command) => self.run_command(command).await,
            MenuAction::OpenConfiguration => self.shell.open_configuration(),
            MenuAction::About => self.shell.open_about(),
            MenuAction::Quit => {
                info!("quit requested from tray");
                self.shell.quit();
            }
        }
    }

    /// Dispatches by native menu id; unknown ids are ignored.
    pub async fn dispatch_id(&self, id: &str) {
        match MenuAction::from_id(id) {
            Some(action) => self.dispatch(action).await,
            None => debug!(%id, "ignoring menu event without action"),
        }
    }

    /// Sends the command, then refreshes whatever the outcome. A rejected
    /// command shows up as the control staying unchanged.
    async fn run_command(&self, command: CommandDescriptor) {
        let gateway = self.refresher.context().gateway();
        let accepted = gateway
            .send_command(&command.device_id, &command.code, command.value)
            .await;
        if !accepted {
            warn!(device = %command.device_id, code = %command.code, "command was not accepted");
        }
        self.refresher.refresh(RefreshKind::Manual).await;
    }
}
