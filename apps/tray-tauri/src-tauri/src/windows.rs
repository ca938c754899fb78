//! Configuration and about windows, created on demand and hidden on close.

use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder};
use tuyatray_refresh::ShellActions;

use crate::state::TrayState;
use crate::{APP_NAME, ipc};

pub const CONFIG_WINDOW: &str = "config";
pub const ABOUT_WINDOW: &str = "about";

struct WindowSpec {
    label: &'static str,
    page: &'static str,
    title: String,
    height: f64,
}

fn show(app: &AppHandle, spec: WindowSpec) {
    if let Some(window) = app.get_webview_window(spec.label) {
        let _ = window.show();
        let _ = window.set_focus();
        return;
    }

    let built = WebviewWindowBuilder::new(app, spec.label, WebviewUrl::App(spec.page.into()))
        .title(&spec.title)
        .inner_size(400.0, spec.height)
        .resizable(false)
        .center()
        .visible(true)
        .build();

    if let Err(e) = built {
        tracing::error!(window = spec.label, "failed to create window: {e}");
    }
}

pub fn open_config(app: &AppHandle) {
    show(
        app,
        WindowSpec {
            label: CONFIG_WINDOW,
            page: "config.html",
            title: format!("{APP_NAME} - Configuration"),
            height: 660.0,
        },
    );
    if let Some(state) = app.try_state::<TrayState>() {
        let _ = app.emit_to(CONFIG_WINDOW, ipc::CONFIG_DATA, state.ctx.config().get());
    }
}

pub fn open_about(app: &AppHandle) {
    show(
        app,
        WindowSpec {
            label: ABOUT_WINDOW,
            page: "about.html",
            title: format!("About {APP_NAME}"),
            height: 590.0,
        },
    );
    let _ = app.emit_to(ABOUT_WINDOW, ipc::ABOUT_DATA, crate::VERSION);
}

/// Window and lifecycle actions the tray menu can trigger.
pub struct TauriShell {
    app: AppHandle,
}

impl TauriShell {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShellActions for TauriShell {
    fn open_configuration(&self) {
        open_config(&self.app);
    }

    fn open_about(&self) {
        open_about(&self.app);
    }

    fn quit(&self) {
        self.app.exit(0);
    }
}
