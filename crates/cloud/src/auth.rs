//! OpenAPI request signing (HMAC-SHA256).
//!
//! Every request carries `client_id`, `t` (ms timestamp), `nonce`,
//! `sign_method` and `sign`; business requests add `access_token`.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::CloudError;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of the empty body.
pub const EMPTY_BODY_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const SIGN_METHOD: &str = "HMAC-SHA256";

/// Builds the canonical string: method, body hash, (empty) signed headers
/// and the path with its query parameters sorted by key.
pub fn string_to_sign(
    method: &str,
    path: &str,
    query: &[(&str, &str)],
    body: Option<&[u8]>,
) -> String {
    let content_hash = match body {
        Some(b) if !b.is_empty() => hex::encode(Sha256::digest(b)),
        _ => EMPTY_BODY_HASH.to_string(),
    };

    let url = if query.is_empty() {
        path.to_string()
    } else {
        let mut sorted = query.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let qs = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{qs}")
    };

    format!("{}\n{content_hash}\n\n{url}", method.to_uppercase())
}

/// Upper-case hex HMAC-SHA256 of `message` keyed by `secret`.
pub fn sign(secret: &str, message: &str) -> Result<String, CloudError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CloudError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Header set attached to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub client_id: String,
    pub access_token: Option<String>,
    pub sign: String,
    pub t: String,
    pub nonce: String,
}

impl SignedHeaders {
    /// Signs a token request (no access token in the message).
    pub fn for_token(
        client_id: &str,
        secret: &str,
        canonical: &str,
        timestamp_ms: i64,
        nonce: &str,
    ) -> Result<Self, CloudError> {
        let message = format!("{client_id}{timestamp_ms}{nonce}{canonical}");
        Ok(Self {
            client_id: client_id.to_string(),
            access_token: None,
            sign: sign(secret, &message)?,
            t: timestamp_ms.to_string(),
            nonce: nonce.to_string(),
        })
    }

    /// Signs a business request on behalf of `access_token`.
    pub fn for_api(
        client_id: &str,
        access_token: &str,
        secret: &str,
        canonical: &str,
        timestamp_ms: i64,
        nonce: &str,
    ) -> Result<Self, CloudError> {
        let message = format!("{client_id}{access_token}{timestamp_ms}{nonce}{canonical}");
        Ok(Self {
            client_id: client_id.to_string(),
            access_token: Some(access_token.to_string()),
            sign: sign(secret, &message)?,
            t: timestamp_ms.to_string(),
            nonce: nonce.to_string(),
        })
    }

    /// Applies the headers to a request builder.
    pub fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder
            .header("client_id", &self.client_id)
            .header("sign", &self.sign)
            .header("sign_method", SIGN_METHOD)
            .header("t", &self.t)
            .header("nonce", &self.nonce);
        if let Some(token) = &self.access_token {
            builder = builder.header("access_token", token);
        }
        builder
    }
}

/// Fresh nonce: a v4 UUID without dashes.
pub fn nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_hash_matches_sha256() {
        assert_eq!(hex::encode(Sha256::digest(b"")), EMPTY_BODY_HASH);
    }

    #[test]
    fn string_to_sign_sorts_query() {
        let s = string_to_sign("get", "/v1.0/token", &[("b", "2"), ("a", "1")], None);
        assert_eq!(s, format!("GET\n{EMPTY_BODY_HASH}\n\n/v1.0/token?a=1&b=2"));
    }

    #[test]
    fn string_to_sign_hashes_body() {
        let body = br#"{"commands":[]}"#;
        let s = string_to_sign("POST", "/v1.0/devices/d1/commands", &[], Some(body));
        let expected_hash = hex::encode(Sha256::digest(body));
        assert!(s.starts_with(&format!("POST\n{expected_hash}\n\n")));
        assert!(s.ends_with("/v1.0/devices/d1/commands"));
    }

    #[test]
    fn sign_is_upper_hex_hmac() {
        // RFC 4231 test case 2.
        let sig = sign("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5BDCC146BF60754E6A042426089575C75A003F089D2739839DEC58B964EC3843"
        );
    }

    #[test]
    fn api_signature_includes_access_token() {
        let canonical = string_to_sign("GET", "/v1.0/devices/d1/status", &[], None);
        let token = SignedHeaders::for_token("cid", "secret", &canonical, 1000, "n").unwrap();
        let api = SignedHeaders::for_api("cid", "tok", "secret", &canonical, 1000, "n").unwrap();

        assert_ne!(token.sign, api.sign);
        assert_eq!(api.access_token.as_deref(), Some("tok"));
        assert_eq!(token.t, "1000");
        assert_eq!(
            api.sign,
            sign("secret", &format!("cidtok1000n{canonical}")).unwrap()
        );
    }

    #[test]
    fn empty_secret_still_signs() {
        let sig = sign("", "message").unwrap();
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, sig.to_uppercase());
    }

    #[test]
    fn nonce_has_no_dashes() {
        let n = nonce();
        assert_eq!(n.len(), 32);
        assert!(!n.contains('-'));
    }
}
