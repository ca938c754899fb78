//! Tuya OpenAPI client.
//!
//! Async HTTP client using `reqwest`; every call is signed with the project
//! credentials and the cached access token. Calls are not retried: the
//! tray's periodic refresh already is the retry loop.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{self, SignedHeaders};
use crate::error::CloudError;
use crate::token::TokenManager;
use crate::types::{ApiResponse, Command, CommandPayload, Device, StatusEntry, StatusValue};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenAPI client bound to one project (access key / secret pair).
pub struct CloudClient {
    http: reqwest::Client,
    tokens: TokenManager,
    base_url: String,
    client_id: String,
    secret: String,
}

impl CloudClient {
    /// Creates a client for the given endpoint and project credentials.
    pub fn new(base_url: &str, access_key: &str, secret_key: &str) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            tokens: TokenManager::new(
                http.clone(),
                base_url.clone(),
                access_key.to_string(),
                secret_key.to_string(),
            ),
            http,
            base_url,
            client_id: access_key.to_string(),
            secret: secret_key.to_string(),
        })
    }

    /// Lists the devices bound to an app account.
    pub async fn devices(&self, user_id: &str) -> Result<Vec<Device>, CloudError> {
        self.request("GET", &format!("/v1.0/users/{user_id}/devices"), None)
            .await
    }

    /// Returns the current data point values of a device.
    pub async fn device_status(&self, device_id: &str) -> Result<Vec<StatusEntry>, CloudError> {
        self.request("GET", &format!("/v1.0/devices/{device_id}/status"), None)
            .await
    }

    /// Writes a batch of data points.
    pub async fn send_commands(
        &self,
        device_id: &str,
        commands: Vec<Command>,
    ) -> Result<bool, CloudError> {
        let body = serde_json::to_vec(&CommandPayload { commands })?;
        self.request(
            "POST",
            &format!("/v1.0/devices/{device_id}/commands"),
            Some(body),
        )
        .await
    }

    /// Writes a single data point.
    pub async fn send_command(
        &self,
        device_id: &str,
        code: &str,
        value: StatusValue,
    ) -> Result<bool, CloudError> {
        self.send_commands(
            device_id,
            vec![Command {
                code: code.to_string(),
                value,
            }],
        )
        .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T, CloudError> {
        let access_token = self.tokens.access_token().await?;
        let canonical = auth::string_to_sign(method, path, &[], body.as_deref());
        let headers = SignedHeaders::for_api(
            &self.client_id,
            &access_token,
            &self.secret,
            &canonical,
            auth::timestamp_ms(),
            &auth::nonce(),
        )?;

        let url = format!("{}{}", self.base_url, path);
        let builder = match body {
            Some(bytes) => self
                .http
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes),
            None => self.http.get(&url),
        };

        debug!(%method, %path, "OpenAPI request");
        let resp = headers.apply(builder).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(%path, status = status.as_u16(), "OpenAPI response");

        let result = parse_envelope(&text);
        if let Err(e) = &result
            && e.is_token_invalid()
        {
            warn!("access token rejected, invalidating");
            self.tokens.invalidate().await;
        }
        result
    }
}

/// Unwraps the `{success, result, code, msg}` envelope.
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, CloudError> {
    let resp: ApiResponse<T> =
        serde_json::from_str(body).map_err(|e| CloudError::Parse(format!("{e}: {body}")))?;

    if !resp.success {
        return Err(CloudError::Api {
            code: resp.code.unwrap_or(-1),
            message: resp.msg.unwrap_or_else(|| "unknown error".into()),
        });
    }

    resp.result.ok_or(CloudError::Api {
        code: -1,
        message: "no result in response".into(),
    })
}
