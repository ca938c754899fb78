//! Version, update and link commands for the about window.

use tauri::{AppHandle, Emitter, State};
use tauri_plugin_notification::NotificationExt;
use tuyatray_update::UpdateInfo;

use crate::state::TrayState;
use crate::{APP_NAME, VERSION, ipc};

#[tauri::command]
pub async fn get_version() -> Result<String, String> {
    Ok(VERSION.into())
}

/// Checks for a newer release and pushes the outcome to the windows.
#[tauri::command]
pub async fn check_for_update(
    app: AppHandle,
    state: State<'_, TrayState>,
) -> Result<UpdateInfo, String> {
    match run_update_check(&app, &state).await {
        Ok(info) => {
            let _ = app.emit(ipc::UPDATE_AVAILABLE, &info);
            Ok(info)
        }
        Err(e) => {
            let _ = app.emit(ipc::UPDATE_CHECK_FAILED, &e);
            Err(e)
        }
    }
}

/// Opens an http(s) link in the default browser.
#[tauri::command]
pub async fn open_external(url: String) -> Result<(), String> {
    let parsed = reqwest::Url::parse(&url).map_err(|e| format!("invalid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("only http(s) links can be opened".into());
    }
    open::that(parsed.as_str()).map_err(|e| e.to_string())
}

/// One release check; records the result and updates tooltip and icon when
/// the pending version changes. The first detection of a run also raises a
/// desktop notification.
pub async fn run_update_check(app: &AppHandle, state: &TrayState) -> Result<UpdateInfo, String> {
    let checker = state
        .checker
        .as_ref()
        .ok_or_else(|| "update checker unavailable".to_string())?;
    let info = checker.check(VERSION).await.map_err(|e| e.to_string())?;

    let newly = state.updates.record(&info);
    if newly {
        tracing::info!(latest = %info.latest_version, "update available");
    }
    if state.updates.claim_notification() {
        notify_update(app, &info.latest_version);
    }
    let pending = state.updates.pending();
    if pending != state.ctx.latest_version() {
        state.ctx.set_latest_version(pending);
    }
    Ok(info)
}

fn notify_update(app: &AppHandle, latest: &str) {
    let shown = app
        .notification()
        .builder()
        .title(format!("{APP_NAME} update available"))
        .body(format!(
            "Version {latest} is now available. Open About from the tray menu to download it."
        ))
        .show();
    if let Err(e) = shown {
        tracing::warn!("failed to show update notification: {e}");
    }
}
