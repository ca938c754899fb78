//! Tuya OpenAPI payload types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A device registered under the cloud account.
///
/// Only `id`, `name` and `online` drive the tray; the descriptive fields are
/// kept so the full listing deserializes without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub sub: bool,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
}

impl Device {
    /// Creates a device with only the fields the tray cares about.
    pub fn new(id: impl Into<String>, name: impl Into<String>, online: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            online,
            category: String::new(),
            product_id: String::new(),
            product_name: String::new(),
            sub: false,
            uuid: String::new(),
            ip: String::new(),
            time_zone: String::new(),
            icon: String::new(),
            create_time: 0,
            update_time: 0,
        }
    }
}

/// One controllable attribute of a device (a "data point").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub code: String,
    pub value: StatusValue,
}

impl StatusEntry {
    pub fn new(code: impl Into<String>, value: impl Into<StatusValue>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Runtime-typed status value. The API does not declare types statically,
/// so the JSON shape decides the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl StatusValue {
    pub fn text(value: impl Into<String>) -> Self {
        StatusValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StatusValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Exact integer reading: integral numbers, or text holding a whole
    /// number after trimming (`"24"` and `"24.0"` both read as 24).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StatusValue::Bool(_) => None,
            StatusValue::Number(n) => integral(n),
            StatusValue::Text(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
        }
    }

    /// Lenient integer reading used for speed levels: text yields its
    /// leading integer (`"3"`, `" 3 "`, `"3%"` all read as 3).
    pub fn as_level(&self) -> Option<i64> {
        match self {
            StatusValue::Bool(_) => None,
            StatusValue::Number(n) => integral(n),
            StatusValue::Text(s) => leading_integer(s),
        }
    }
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64().and_then(whole)
}

fn whole(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

impl From<bool> for StatusValue {
    fn from(v: bool) -> Self {
        StatusValue::Bool(v)
    }
}

impl From<i64> for StatusValue {
    fn from(v: i64) -> Self {
        StatusValue::Number(Number::from(v))
    }
}

impl From<&str> for StatusValue {
    fn from(v: &str) -> Self {
        StatusValue::Text(v.to_string())
    }
}

impl From<String> for StatusValue {
    fn from(v: String) -> Self {
        StatusValue::Text(v)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusValue::Bool(v) => write!(f, "{v}"),
            StatusValue::Number(v) => write!(f, "{v}"),
            StatusValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// A single data point write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub code: String,
    pub value: StatusValue,
}

/// Body of `POST /v1.0/devices/{id}/commands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub commands: Vec<Command>,
}

/// Response envelope shared by every OpenAPI endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    pub code: Option<i32>,
    pub msg: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub t: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds.
    pub expire_time: i64,
}

/// Cloud data centers and their OpenAPI endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    CentralEurope,
    WesternEurope,
    China,
    WesternAmerica,
    EasternAmerica,
    India,
    Singapore,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::CentralEurope,
        Region::WesternEurope,
        Region::China,
        Region::WesternAmerica,
        Region::EasternAmerica,
        Region::India,
        Region::Singapore,
    ];

    pub fn base_url(&self) -> &'static str {
        match self {
            Region::CentralEurope => "https://openapi.tuyaeu.com",
            Region::WesternEurope => "https://openapi-weaz.tuyaeu.com",
            Region::China => "https://openapi.tuyacn.com",
            Region::WesternAmerica => "https://openapi.tuyaus.com",
            Region::EasternAmerica => "https://openapi-ueaz.tuyaus.com",
            Region::India => "https://openapi.tuyain.com",
            Region::Singapore => "https://openapi-sg.iotbing.com",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Region::CentralEurope => "Central Europe",
            Region::WesternEurope => "Western Europe",
            Region::China => "China",
            Region::WesternAmerica => "Western America",
            Region::EasternAmerica => "Eastern America",
            Region::India => "India",
            Region::Singapore => "Singapore",
        }
    }

    /// Matches a configured endpoint back to its region, ignoring a
    /// trailing slash.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim_end_matches('/');
        Self::ALL.into_iter().find(|r| r.base_url() == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_value_untagged_shapes() {
        let entries: Vec<StatusEntry> = serde_json::from_str(
            r#"[{"code":"switch_led","value":true},
                {"code":"temp_set","value":24},
                {"code":"mode","value":"cold"}]"#,
        )
        .unwrap();

        assert_eq!(entries[0].value, StatusValue::Bool(true));
        assert_eq!(entries[1].value, StatusValue::from(24i64));
        assert_eq!(entries[2].value, StatusValue::text("cold"));
    }

    #[test]
    fn command_payload_keeps_value_types() {
        let payload = CommandPayload {
            commands: vec![
                Command {
                    code: "fan_speed_percent".into(),
                    value: StatusValue::text("3"),
                },
                Command {
                    code: "temp_set".into(),
                    value: StatusValue::from(22i64),
                },
            ],
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"commands":[{"code":"fan_speed_percent","value":"3"},{"code":"temp_set","value":22}]}"#
        );
    }

    #[test]
    fn level_parsing_is_lenient_for_text() {
        assert_eq!(StatusValue::text("3").as_level(), Some(3));
        assert_eq!(StatusValue::text(" 4 ").as_level(), Some(4));
        assert_eq!(StatusValue::text("2%").as_level(), Some(2));
        assert_eq!(StatusValue::text("-1").as_level(), Some(-1));
        assert_eq!(StatusValue::text("fast").as_level(), None);
        assert_eq!(StatusValue::from(5i64).as_level(), Some(5));
        assert_eq!(StatusValue::Bool(true).as_level(), None);
    }

    #[test]
    fn integer_parsing_requires_whole_numbers() {
        assert_eq!(StatusValue::text("24").as_integer(), Some(24));
        assert_eq!(StatusValue::text("24C").as_integer(), None);
        assert_eq!(StatusValue::text("24.0").as_integer(), Some(24));
        assert_eq!(StatusValue::text("24.5").as_integer(), None);
        assert_eq!(StatusValue::text("NaN").as_integer(), None);
        let fractional: StatusValue = serde_json::from_str("24.5").unwrap();
        assert_eq!(fractional.as_integer(), None);
        let whole: StatusValue = serde_json::from_str("24.0").unwrap();
        assert_eq!(whole.as_integer(), Some(24));
    }

    #[test]
    fn device_tolerates_missing_fields() {
        let device: Device =
            serde_json::from_str(r#"{"id":"d1","name":"Lamp","online":true}"#).unwrap();
        assert_eq!(device, Device::new("d1", "Lamp", true));
    }

    #[test]
    fn region_lookup() {
        assert_eq!(
            Region::from_url("https://openapi.tuyaus.com/"),
            Some(Region::WesternAmerica)
        );
        assert_eq!(Region::from_url("https://example.com"), None);
        assert_eq!(Region::default().base_url(), "https://openapi.tuyaeu.com");
    }
}
