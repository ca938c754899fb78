//! Configuration window commands.

use serde::Serialize;
use tauri::State;
use tuyatray_cloud::Region;
use tuyatray_config::AppConfig;

use crate::autostart;
use crate::state::TrayState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDto {
    pub id: Region,
    pub name: &'static str,
    pub base_url: &'static str,
}

/// Persists the configuration, rebuilds the gateway and refreshes the menu.
#[tauri::command]
pub async fn save_config(
    state: State<'_, TrayState>,
    mut config: AppConfig,
) -> Result<(), String> {
    if let Some(region) = Region::from_url(&config.base_url) {
        config.base_url = region.base_url().to_string();
    }
    let run_on_startup = config.run_on_startup;
    state
        .refresher
        .apply_config(config)
        .await
        .map_err(|e| e.to_string())?;

    if let Err(e) = autostart::apply(run_on_startup) {
        tracing::warn!("failed to update launch at startup: {e:#}");
    }
    tracing::info!("configuration saved from window");
    Ok(())
}

#[tauri::command]
pub async fn get_config(state: State<'_, TrayState>) -> Result<AppConfig, String> {
    Ok(state.ctx.config().get())
}

#[tauri::command]
pub async fn get_regions() -> Result<Vec<RegionDto>, String> {
    Ok(Region::ALL
        .iter()
        .map(|r| RegionDto {
            id: *r,
            name: r.display_name(),
            base_url: r.base_url(),
        })
        .collect())
}
