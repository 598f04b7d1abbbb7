// Token refresh call

use anyhow::{Context, Result};
use reqwest::Client;

use super::types::{RefreshRequest, RefreshResponse};

/// Exchange a refresh credential for a new access token
///
/// Issues `POST {base}/auth/refresh/` with `{"refresh": <token>}` and expects
/// `{"access": <token>}` back. The call bypasses the authenticated request
/// path: a stale bearer header must never ride along on a refresh.
pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<String> {
    tracing::info!("Refreshing access token...");

    let url = format!("{}/auth/refresh/", base_url);
    let request = RefreshRequest {
        refresh: refresh_token.to_string(),
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send token refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("Token refresh failed: {} - {}", status, error_text);
    }

    let data: RefreshResponse = response
        .json()
        .await
        .context("Failed to parse token refresh response")?;

    if data.access.is_empty() {
        anyhow::bail!("Token refresh response does not contain an access token");
    }

    tracing::debug!("Access token refreshed");
    Ok(data.access)
}
