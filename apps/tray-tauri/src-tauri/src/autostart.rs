//! Launch-at-startup registration.

use anyhow::Context;
use auto_launch::AutoLaunchBuilder;

use crate::APP_NAME;

/// Registers or unregisters the running executable at login.
pub fn apply(enabled: bool) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("locating executable")?;
    let launcher = AutoLaunchBuilder::new()
        .set_app_name(APP_NAME)
        .set_app_path(&exe.to_string_lossy())
        .build()
        .context("building auto-launch entry")?;

    if enabled {
        launcher.enable().context("enabling auto-launch")?;
        tracing::info!("launch at startup enabled");
    } else if launcher.is_enabled().unwrap_or(false) {
        launcher.disable().context("disabling auto-launch")?;
        tracing::info!("launch at startup disabled");
    }
    Ok(())
}
