//! Fail-soft device gateway.
//!
//! The tray never sees a [`CloudError`]: listing and status failures turn
//! into empty results and command failures into `false`, each with a log
//! line. An unconfigured gateway answers every call without touching the
//! network.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::client::CloudClient;
use crate::error::CloudError;
use crate::types::{Device, StatusEntry, StatusValue};

/// Boxed future returned by [`DeviceGateway`] methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstract access to the devices of one cloud account.
///
/// Implemented by [`CloudGateway`] in production and by in-memory mocks in
/// tests of the refresh logic.
pub trait DeviceGateway: Send + Sync {
    /// Whether the gateway was built from a complete credential set.
    fn is_usable(&self) -> bool;

    /// Lists the account's devices; empty on failure.
    fn list_devices<'a>(&'a self, account_id: &'a str) -> GatewayFuture<'a, Vec<Device>>;

    /// Fetches a device's status vector; empty on failure.
    fn fetch_status<'a>(&'a self, device_id: &'a str) -> GatewayFuture<'a, Vec<StatusEntry>>;

    /// Sends one command; `false` on failure.
    fn send_command<'a>(
        &'a self,
        device_id: &'a str,
        code: &'a str,
        value: StatusValue,
    ) -> GatewayFuture<'a, bool>;
}

/// Gateway backed by the Tuya OpenAPI.
pub struct CloudGateway {
    client: Option<CloudClient>,
}

impl CloudGateway {
    /// Builds a gateway from raw credentials. Any empty field, or a client
    /// that fails to build, yields an unusable gateway.
    pub fn new(base_url: &str, access_key: &str, secret_key: &str) -> Self {
        if base_url.is_empty() || access_key.is_empty() || secret_key.is_empty() {
            return Self::unconfigured();
        }
        match CloudClient::new(base_url, access_key, secret_key) {
            Ok(client) => Self {
                client: Some(client),
            },
            Err(e) => {
                warn!(error = %e, "failed to build OpenAPI client");
                Self::unconfigured()
            }
        }
    }

    /// A gateway that answers every call with an empty result.
    pub fn unconfigured() -> Self {
        Self { client: None }
    }
}

fn soften<T: Default>(op: &str, id: &str, result: Result<T, CloudError>) -> T {
    result.unwrap_or_else(|e| {
        warn!(%op, %id, error = %e, "gateway call failed");
        T::default()
    })
}

impl DeviceGateway for CloudGateway {
    fn is_usable(&self) -> bool {
        self.client.is_some()
    }

    fn list_devices<'a>(&'a self, account_id: &'a str) -> GatewayFuture<'a, Vec<Device>> {
        Box::pin(async move {
            let Some(client) = &self.client else {
                return Vec::new();
            };
            let devices = soften("list_devices", account_id, client.devices(account_id).await);
            debug!(count = devices.len(), "devices listed");
            devices
        })
    }

    fn fetch_status<'a>(&'a self, device_id: &'a str) -> GatewayFuture<'a, Vec<StatusEntry>> {
        Box::pin(async move {
            let Some(client) = &self.client else {
                return Vec::new();
            };
            soften(
                "fetch_status",
                device_id,
                client.device_status(device_id).await,
            )
        })
    }

    fn send_command<'a>(
        &'a self,
        device_id: &'a str,
        code: &'a str,
        value: StatusValue,
    ) -> GatewayFuture<'a, bool> {
        Box::pin(async move {
            let Some(client) = &self.client else {
                return false;
            };
            debug!(device = %device_id, %code, %value, "sending command");
            soften(
                "send_command",
                device_id,
                client.send_command(device_id, code, value).await,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_server;

    const TOKEN_OK: &str = r#"{"success":true,"t":1,"result":
        {"access_token":"tok","refresh_token":"ref","expire_time":7200}}"#;

    #[test]
    fn missing_credentials_make_it_unusable() {
        assert!(!CloudGateway::new("", "key", "secret").is_usable());
        assert!(!CloudGateway::new("https://x", "", "secret").is_usable());
        assert!(!CloudGateway::new("https://x", "key", "").is_usable());
        assert!(CloudGateway::new("https://x", "key", "secret").is_usable());
    }

    #[tokio::test]
    async fn unconfigured_gateway_is_a_noop() {
        let gw = CloudGateway::unconfigured();
        assert!(gw.list_devices("uid").await.is_empty());
        assert!(gw.fetch_status("d1").await.is_empty());
        assert!(!gw.send_command("d1", "switch", StatusValue::Bool(true)).await);
    }

    #[tokio::test]
    async fn transport_failure_lists_nothing() {
        // Nothing listens on the discard port.
        let gw = CloudGateway::new("http://127.0.0.1:9", "key", "secret");
        assert!(gw.list_devices("uid").await.is_empty());
        assert!(gw.fetch_status("d1").await.is_empty());
        assert!(!gw.send_command("d1", "switch", StatusValue::Bool(true)).await);
    }

    #[tokio::test]
    async fn parse_failure_lists_nothing() {
        let (url, _requests, handle) = mock_server(vec![TOKEN_OK, "not json"]).await;
        let gw = CloudGateway::new(&url, "key", "secret");

        assert!(gw.fetch_status("d1").await.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn successful_status_passes_through() {
        let status = r#"{"success":true,"t":1,"result":[{"code":"mode","value":"dry"}]}"#;
        let (url, _requests, handle) = mock_server(vec![TOKEN_OK, status]).await;
        let gw = CloudGateway::new(&url, "key", "secret");

        let entries = gw.fetch_status("d1").await;
        assert_eq!(entries, vec![StatusEntry::new("mode", "dry")]);

        handle.abort();
    }
}
