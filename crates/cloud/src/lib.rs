//! Tuya OpenAPI client and the fail-soft device gateway the tray talks to.
//!
//! - [`CloudClient`]: signed HTTP calls (device list, status, commands)
//! - [`DeviceGateway`]: the contract used by the refresh loop, which never
//!   fails; [`CloudGateway`] implements it over [`CloudClient`]

pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
mod token;
pub mod types;

pub use client::CloudClient;
pub use error::CloudError;
pub use gateway::{CloudGateway, DeviceGateway, GatewayFuture};
pub use types::{Command, Device, Region, StatusEntry, StatusValue};
