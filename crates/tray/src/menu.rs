//! Dynamic context menu for the system tray.
//!
//! Pure functions from device status to a declarative menu tree. Actions are
//! plain data ([`MenuAction`]); the refresh crate's dispatcher performs them.

use serde::{Deserialize, Serialize};
use tuyatray_cloud::{Device, StatusEntry, StatusValue};

pub const FAN_SPEED_CODE: &str = "fan_speed_percent";
pub const TEMPERATURE_CODE: &str = "temp_set";
pub const AC_FAN_SPEED_CODE: &str = "windspeed";
pub const AC_MODE_CODE: &str = "mode";

pub const FAN_SPEED_LEVELS: i64 = 5;
pub const AC_FAN_SPEED_LEVELS: i64 = 4;
pub const TEMP_MIN: i64 = 16;
pub const TEMP_MAX: i64 = 30;
pub const AC_MODES: [&str; 4] = ["auto", "cold", "dry", "wind"];

const COMMAND_ID_PREFIX: &str = "cmd:";

/// One data point write triggered from the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub device_id: String,
    pub code: String,
    pub value: StatusValue,
}

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Send a command, then rebuild the menu.
    Command(CommandDescriptor),
    /// Show the configuration window.
    OpenConfiguration,
    /// Show the about window.
    About,
    /// User requested to quit the application.
    Quit,
}

impl MenuAction {
    /// Stable id for native menus. Commands embed their descriptor as JSON
    /// so the value type survives the trip through the OS menu.
    pub fn id(&self) -> String {
        match self {
            MenuAction::OpenConfiguration => "open_config".into(),
            MenuAction::About => "open_about".into(),
            MenuAction::Quit => "quit".into(),
            MenuAction::Command(cmd) => match serde_json::to_string(cmd) {
                Ok(json) => format!("{COMMAND_ID_PREFIX}{json}"),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode command id");
                    String::new()
                }
            },
        }
    }

    /// Inverse of [`MenuAction::id`].
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "open_config" => Some(MenuAction::OpenConfiguration),
            "open_about" => Some(MenuAction::About),
            "quit" => Some(MenuAction::Quit),
            _ => {
                let json = id.strip_prefix(COMMAND_ID_PREFIX)?;
                serde_json::from_str(json).ok().map(MenuAction::Command)
            }
        }
    }
}

/// A single menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// `Some` renders a checkbox in that state.
    pub checked: Option<bool>,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    fn action(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            checked: None,
            action: Some(action),
        }
    }

    fn checkbox(label: impl Into<String>, checked: bool, command: CommandDescriptor) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            checked: Some(checked),
            action: Some(MenuAction::Command(command)),
        }
    }
}

/// Node of the menu tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Item(MenuItem),
    Submenu { label: String, children: Vec<MenuNode> },
    Separator,
}

impl MenuNode {
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuNode::Item(item) => Some(&item.label),
            MenuNode::Submenu { label, .. } => Some(label),
            MenuNode::Separator => None,
        }
    }

    pub fn children(&self) -> &[MenuNode] {
        match self {
            MenuNode::Submenu { children, .. } => children,
            _ => &[],
        }
    }

    pub fn as_item(&self) -> Option<&MenuItem> {
        match self {
            MenuNode::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// A device together with its freshly fetched status vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub device: Device,
    pub status: Vec<StatusEntry>,
}

/// Current state used to build the context menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuState {
    /// Credentials are incomplete; devices are never enumerated.
    Unconfigured,
    /// Devices in account order.
    Devices(Vec<DeviceSnapshot>),
}

impl MenuState {
    /// Builds the top-level menu from the current state.
    pub fn build_menu(&self) -> Vec<MenuNode> {
        let snapshots = match self {
            MenuState::Unconfigured => {
                return vec![
                    MenuNode::Item(MenuItem::action(
                        "Open Configuration",
                        MenuAction::OpenConfiguration,
                    )),
                    MenuNode::Separator,
                    MenuNode::Item(MenuItem::action("Quit", MenuAction::Quit)),
                ];
            }
            MenuState::Devices(snapshots) => snapshots,
        };

        let mut items: Vec<MenuNode> = snapshots
            .iter()
            .filter(|s| s.device.online)
            .map(|s| device_menu(&s.device, &s.status))
            .collect();

        if !items.is_empty() {
            items.push(MenuNode::Separator);
        }

        items.push(MenuNode::Item(MenuItem::action(
            "Open Configuration",
            MenuAction::OpenConfiguration,
        )));
        items.push(MenuNode::Item(MenuItem::action("About", MenuAction::About)));
        items.push(MenuNode::Separator);
        items.push(MenuNode::Item(MenuItem::action("Quit", MenuAction::Quit)));

        items
    }
}

/// One submenu per device; unrecognized entries are dropped, order kept.
pub fn device_menu(device: &Device, status: &[StatusEntry]) -> MenuNode {
    MenuNode::Submenu {
        label: device.name.clone(),
        children: status
            .iter()
            .filter_map(|entry| status_node(&device.id, entry))
            .collect(),
    }
}

/// Renders one status entry, or `None` when it has no menu representation.
///
/// Booleans win over the code table, so a boolean `mode` is still a toggle.
pub fn status_node(device_id: &str, entry: &StatusEntry) -> Option<MenuNode> {
    let command = |value: StatusValue| CommandDescriptor {
        device_id: device_id.to_string(),
        code: entry.code.clone(),
        value,
    };

    if let StatusValue::Bool(current) = entry.value {
        return Some(MenuNode::Item(MenuItem::checkbox(
            format_label(&entry.code),
            current,
            command(StatusValue::Bool(!current)),
        )));
    }

    let (label, children) = match entry.code.as_str() {
        FAN_SPEED_CODE => ("Fan Speed", level_items(entry, FAN_SPEED_LEVELS, command)),
        AC_FAN_SPEED_CODE => (
            "AC Fan Speed",
            level_items(entry, AC_FAN_SPEED_LEVELS, command),
        ),
        TEMPERATURE_CODE => {
            let current = entry.value.as_integer();
            let items = (TEMP_MIN..=TEMP_MAX)
                .map(|t| {
                    MenuNode::Item(MenuItem::checkbox(
                        format!("{t}°C"),
                        current == Some(t),
                        command(StatusValue::from(t)),
                    ))
                })
                .collect();
            ("Temperature", items)
        }
        AC_MODE_CODE => {
            let current = entry.value.as_text();
            let items = AC_MODES
                .iter()
                .map(|mode| {
                    MenuNode::Item(MenuItem::checkbox(
                        format_label(mode),
                        current == Some(*mode),
                        command(StatusValue::text(*mode)),
                    ))
                })
                .collect();
            ("AC Mode", items)
        }
        _ => return None,
    };

    Some(MenuNode::Submenu {
        label: label.into(),
        children,
    })
}

/// Checkbox rows "1"..=`levels`; the level is sent back as text.
fn level_items(
    entry: &StatusEntry,
    levels: i64,
    command: impl Fn(StatusValue) -> CommandDescriptor,
) -> Vec<MenuNode> {
    let current = entry.value.as_level();
    (1..=levels)
        .map(|level| {
            MenuNode::Item(MenuItem::checkbox(
                level.to_string(),
                current == Some(level),
                command(StatusValue::Text(level.to_string())),
            ))
        })
        .collect()
}

/// `switch_led` → `Switch Led`.
pub fn format_label(code: &str) -> String {
    code.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
