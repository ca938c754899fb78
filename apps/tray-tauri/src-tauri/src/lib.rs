mod autostart;
mod bridge;
mod commands;
mod ipc;
mod state;
mod windows;

use std::sync::Arc;

use tauri::tray::TrayIconBuilder;
use tauri::{Manager, RunEvent, WindowEvent};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tuyatray_config::ConfigStore;
use tuyatray_refresh::{
    AUTO_REFRESH_INTERVAL, AppContext, Dispatcher, RefreshKind, Refresher, spawn_auto_refresh,
};
use tuyatray_tray::{MenuState, TrayConfig, TrayHandle, TrayIcon};
use tuyatray_update::{CHECK_INTERVAL, INITIAL_DELAY, UpdateChecker, UpdateState};

use state::TrayState;

pub const APP_NAME: &str = "Tuya Smart Tray";
pub const VERSION: &str = env!("TUYATRAY_VERSION");

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tuyatray=debug")),
        )
        .init();

    tracing::info!(version = VERSION, "starting {APP_NAME}");

    let store = ConfigStore::load();
    tracing::info!(path = %store.path().display(), "configuration loaded");
    if let Err(e) = autostart::apply(store.get().run_on_startup) {
        tracing::warn!("failed to apply launch at startup: {e:#}");
    }

    let (tray, tray_rx) = TrayHandle::new(TrayConfig {
        app_name: APP_NAME.into(),
    });
    let tray = Arc::new(tray);
    let ctx = AppContext::init(store, tray.clone(), APP_NAME);
    let refresher = Refresher::new(ctx.clone());

    let checker = UpdateChecker::new()
        .map_err(|e| tracing::warn!("update checks disabled: {e}"))
        .ok()
        .map(Arc::new);

    let shutdown = CancellationToken::new();
    let tray_state = TrayState {
        ctx: ctx.clone(),
        refresher: refresher.clone(),
        tray: tray.clone(),
        checker,
        updates: Arc::new(UpdateState::new()),
        shutdown: shutdown.clone(),
    };

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            tracing::info!("second instance started, showing configuration");
            windows::open_config(app);
        }))
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_notification::init())
        .manage(tray_state)
        .setup(move |app| {
            let handle = app.handle().clone();
            let initial = bridge::build_menu(&handle, &MenuState::Unconfigured.build_menu())?;
            let tray_tooltip = tray.config().app_name.clone();
            let dispatcher = Dispatcher::new(
                refresher.clone(),
                Arc::new(windows::TauriShell::new(handle.clone())),
            );

            TrayIconBuilder::with_id(bridge::TRAY_ID)
                .icon(bridge::icon_image(TrayIcon::Default)?)
                .tooltip(&tray_tooltip)
                .menu(&initial)
                .on_menu_event(move |_app, event| {
                    let id = event.id().as_ref().to_string();
                    let dispatcher = dispatcher.clone();
                    tauri::async_runtime::spawn(async move {
                        dispatcher.dispatch_id(&id).await;
                    });
                })
                .build(app)?;

            // Native tray calls happen on a dedicated thread.
            let bridge_handle = handle.clone();
            std::thread::spawn(move || bridge::run(bridge_handle, tray_rx));

            let refresh_cancel = shutdown.clone();
            tauri::async_runtime::spawn(async move {
                refresher.refresh(RefreshKind::Manual).await;
                spawn_auto_refresh(refresher, AUTO_REFRESH_INTERVAL, refresh_cancel);
            });

            let update_handle = handle.clone();
            let update_cancel = shutdown.clone();
            tauri::async_runtime::spawn(async move {
                tuyatray_update::spawn_periodic(
                    INITIAL_DELAY,
                    CHECK_INTERVAL,
                    update_cancel,
                    move || {
                        let app = update_handle.clone();
                        async move {
                            let state = app.state::<TrayState>();
                            if let Err(e) = commands::app::run_update_check(&app, &state).await {
                                tracing::debug!("update check failed: {e}");
                            }
                        }
                    },
                );
            });

            tracing::info!("application setup complete");
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                let _ = window.hide();
                api.prevent_close();
            }
        })
        .invoke_handler(tauri::generate_handler![
            // Configuration
            commands::config::save_config,
            commands::config::get_config,
            commands::config::get_regions,
            // About
            commands::app::get_version,
            commands::app::check_for_update,
            commands::app::open_external,
        ])
        .build(tauri::generate_context!())
        .expect("error building tauri application");

    app.run(move |handle, event| match event {
        // The tray keeps the app alive with no windows open.
        RunEvent::ExitRequested { api, code, .. } if code.is_none() => api.prevent_exit(),
        RunEvent::Exit => {
            tracing::info!("shutting down");
            let state = handle.state::<TrayState>();
            state.shutdown.cancel();
            state.ctx.teardown();
            state.tray.shutdown();
        }
        _ => {}
    });
}
