use std::time::Duration;

use serde_json::{Value, json};

use crate::environment::CmrEnvironment;
use crate::error::{Result, SyncError};

const CLIENT_ID: &str = "umm-sync";
const TOKEN_TIMEOUT: Duration = Duration::from_secs(120);

/// Exchanges CMR credentials for a bearer token via the legacy token
/// service. Used only when the caller did not supply a ready-made token.
pub async fn request_token(
    environment: CmrEnvironment,
    username: &str,
    password: &str,
) -> Result<String> {
    request_token_at(environment.base_url(), username, password).await
}

/// Same exchange against an arbitrary base URL, for tests.
pub async fn request_token_at(base_url: &str, username: &str, password: &str) -> Result<String> {
    let url = format!(
        "{}/legacy-services/rest/tokens",
        base_url.trim_end_matches('/')
    );
    let payload = json!({
        "token": {
            "username": username,
            "password": password,
            "client_id": CLIENT_ID,
            "user_ip_address": local_ip(),
        }
    });

    tracing::debug!(%url, "requesting token");
    let client = reqwest::Client::builder().timeout(TOKEN_TIMEOUT).build()?;
    let resp = client
        .post(&url)
        .header("Accept", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(SyncError::TokenRequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: Value = serde_json::from_str(&body)?;
    parsed
        .get("token")
        .and_then(|t| t.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(SyncError::TokenRequestFailed {
            status: status.as_u16(),
            body,
        })
}

/// Local address reported to the token service; loopback when the hostname
/// cannot be resolved.
fn local_ip() -> String {
    use std::net::ToSocketAddrs;

    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .and_then(|h| (h.as_str(), 0u16).to_socket_addrs().ok())
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
