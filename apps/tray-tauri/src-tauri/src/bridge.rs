//! Applies [`TrayUpdate`]s to the native tray icon.
//!
//! Runs on its own thread, draining the channel fed by the refresh logic.

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

use tauri::image::Image;
use tauri::menu::{CheckMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu};
use tauri::{AppHandle, Runtime};
use tuyatray_tray::{MenuAction, MenuNode, TrayIcon, TrayUpdate};

pub const TRAY_ID: &str = "main";

const NO_CONTROLS_ID: &str = "no_controls";
const NOOP_ID: &str = "noop";

const DEFAULT_ICON: &[u8] = include_bytes!("../icons/tray.png");
const LOADING_ICON: &[u8] = include_bytes!("../icons/loading.png");
const UPDATE_ICON: &[u8] = include_bytes!("../icons/update.png");

pub fn icon_image(icon: TrayIcon) -> tauri::Result<Image<'static>> {
    let bytes = match icon {
        TrayIcon::Default => DEFAULT_ICON,
        TrayIcon::Loading => LOADING_ICON,
        TrayIcon::UpdateAvailable => UPDATE_ICON,
    };
    Image::from_bytes(bytes)
}

enum Native<R: Runtime> {
    Item(MenuItem<R>),
    Check(CheckMenuItem<R>),
    Sub(Submenu<R>),
    Separator(PredefinedMenuItem<R>),
}

impl<R: Runtime> Native<R> {
    fn as_dyn(&self) -> &dyn IsMenuItem<R> {
        match self {
            Native::Item(i) => i,
            Native::Check(c) => c,
            Native::Sub(s) => s,
            Native::Separator(s) => s,
        }
    }
}

fn native<R: Runtime>(app: &AppHandle<R>, node: &MenuNode) -> tauri::Result<Native<R>> {
    match node {
        MenuNode::Separator => Ok(Native::Separator(PredefinedMenuItem::separator(app)?)),
        MenuNode::Item(item) => {
            let id = item
                .action
                .as_ref()
                .map(MenuAction::id)
                .unwrap_or_else(|| NOOP_ID.into());
            Ok(match item.checked {
                Some(checked) => Native::Check(CheckMenuItem::with_id(
                    app,
                    id,
                    &item.label,
                    item.enabled,
                    checked,
                    None::<&str>,
                )?),
                None => Native::Item(MenuItem::with_id(
                    app,
                    id,
                    &item.label,
                    item.enabled,
                    None::<&str>,
                )?),
            })
        }
        MenuNode::Submenu { label, children } => {
            let children = if children.is_empty() {
                vec![Native::Item(MenuItem::with_id(
                    app,
                    NO_CONTROLS_ID,
                    "No controls",
                    false,
                    None::<&str>,
                )?)]
            } else {
                children
                    .iter()
                    .map(|c| native(app, c))
                    .collect::<tauri::Result<Vec<_>>>()?
            };
            let items: Vec<&dyn IsMenuItem<R>> = children.iter().map(Native::as_dyn).collect();
            Ok(Native::Sub(Submenu::with_items(app, label, true, &items)?))
        }
    }
}

/// Builds the native menu for a node tree.
pub fn build_menu<R: Runtime>(app: &AppHandle<R>, nodes: &[MenuNode]) -> tauri::Result<Menu<R>> {
    let natives = nodes
        .iter()
        .map(|n| native(app, n))
        .collect::<tauri::Result<Vec<_>>>()?;
    let items: Vec<&dyn IsMenuItem<R>> = natives.iter().map(Native::as_dyn).collect();
    Menu::with_items(app, &items)
}

/// Drains `rx` until [`TrayUpdate::Shutdown`] or until every sender is gone.
pub fn run<R: Runtime>(app: AppHandle<R>, rx: Receiver<TrayUpdate>) {
    // The menu being replaced may still be open; keep it one update longer.
    let mut retained: VecDeque<Menu<R>> = VecDeque::with_capacity(2);

    for update in rx {
        let Some(tray) = app.tray_by_id(TRAY_ID) else {
            tracing::warn!("tray icon missing, update dropped");
            continue;
        };
        let result = match update {
            TrayUpdate::Menu(nodes) => build_menu(&app, &nodes).and_then(|menu| {
                tray.set_menu(Some(menu.clone()))?;
                retained.push_back(menu);
                if retained.len() > 2 {
                    retained.pop_front();
                }
                Ok(())
            }),
            TrayUpdate::Icon(icon) => icon_image(icon).and_then(|img| tray.set_icon(Some(img))),
            TrayUpdate::Tooltip(text) => tray.set_tooltip(Some(&text)),
            TrayUpdate::Shutdown => break,
        };
        if let Err(e) = result {
            tracing::warn!("failed to update tray: {e}");
        }
    }

    tracing::debug!("tray bridge stopped");
}
