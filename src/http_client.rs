use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth::{self, SessionStore};
use crate::error::ClientError;

/// Navigation boundary invoked when authentication cannot be recovered
///
/// The web frontend this client fronts for forces a full redirect to the
/// login entry point; embedders provide whatever the equivalent is in their
/// environment.
pub trait Navigator: Send + Sync {
    /// Send the user back to the login entry point
    fn redirect_to_login(&self);
}

/// Navigator that does nothing, for embedders that handle the propagated
/// error themselves
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}

/// HTTP client for the Healthtrack API
///
/// Attaches the session's bearer credential to every request and recovers
/// from a 401 with exactly one silent token refresh followed by exactly one
/// retry of the original request.
pub struct HealthtrackHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base address all paths are joined onto
    base_url: String,

    /// Injected session state
    session: Arc<SessionStore>,

    /// Forced-logout boundary
    navigator: Arc<dyn Navigator>,

    /// Coalesces concurrent refresh attempts into one in-flight call
    refresh_lock: Mutex<()>,
}

impl HealthtrackHttpClient {
    /// Create a new client
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            navigator,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session store this client reads credentials from
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build a request against the configured base address
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and parse the JSON response body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let request = request.build()?;
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a request, attaching the current credential and transparently
    /// recovering from a single authorization failure
    ///
    /// Success responses (status < 400) are returned unchanged. Transport
    /// errors and non-401 error statuses propagate untouched.
    pub async fn send(&self, mut request: Request) -> Result<Response, ClientError> {
        let method = request.method().clone();
        let url = request.url().clone();

        // Explicit attempt counter: at most one refresh and one retry
        let mut attempt: u32 = 0;

        loop {
            // Re-read the credential on every attempt so a refresh between
            // attempts replaces the stale header
            let bearer = self.session.access_token().await;
            match bearer {
                Some(ref token) => {
                    let value = format!("Bearer {}", token).parse().map_err(|_| {
                        ClientError::Auth("Access token is not a valid header value".to_string())
                    })?;
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                None => {
                    request.headers_mut().remove(AUTHORIZATION);
                }
            }

            let req = request.try_clone().ok_or_else(|| {
                ClientError::Internal(anyhow::anyhow!("Request body is not cloneable"))
            })?;

            tracing::debug!(
                method = %method,
                url = %url,
                attempt = attempt + 1,
                "Sending HTTP request"
            );

            let response = self.client.execute(req).await?;
            let status = response.status();

            if !(status.is_client_error() || status.is_server_error()) {
                tracing::debug!(status = %status, "Request successful");
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                // Mark the request as retried before attempting recovery so
                // a second 401 can never loop
                attempt += 1;

                if self.recover_authorization(bearer.as_deref()).await? {
                    continue;
                }

                // No refresh credential: the original failure propagates
                let error_text = response.text().await.unwrap_or_default();
                return Err(ClientError::from_status(status, error_text));
            }

            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                url = %url,
                "HTTP request failed"
            );
            return Err(ClientError::from_status(status, error_text));
        }
    }

    /// Attempt the single silent refresh after a 401
    ///
    /// Returns `Ok(true)` when the caller should retry with the refreshed
    /// credential and `Ok(false)` when there is no refresh credential (the
    /// session has been cleared and the navigator invoked; the original 401
    /// belongs to the caller). A failed refresh clears the session and is
    /// returned as the error to propagate.
    async fn recover_authorization(&self, used_token: Option<&str>) -> Result<bool, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock
        let current = self.session.access_token().await;
        if current.as_deref() != used_token {
            tracing::debug!("Access token already refreshed by a concurrent request");
            return Ok(true);
        }

        let refresh_token = match self.session.refresh_token().await {
            Some(token) => token,
            None => {
                tracing::warn!("Received 401 with no refresh credential, signing out");
                self.session.clear().await?;
                self.navigator.redirect_to_login();
                return Ok(false);
            }
        };

        match auth::refresh_access_token(&self.client, &self.base_url, &refresh_token).await {
            Ok(access) => {
                // Persist the refreshed credential before any retry
                self.session.set_access_token(Some(&access)).await?;
                tracing::info!("Access token refreshed, retrying original request");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.session.clear().await?;
                Err(ClientError::Auth(format!("Token refresh failed: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_client(dir: &TempDir, base_url: &str) -> HealthtrackHttpClient {
        let session =
            Arc::new(SessionStore::open(dir.path().join("session.sqlite3")).unwrap());
        HealthtrackHttpClient::new(base_url, session, Arc::new(NoopNavigator), 8, 10, 30)
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_builds_absolute_url() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir, "http://localhost:8000/api");

        let request = client
            .request(Method::GET, "/measurements/")
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8000/api/measurements/"
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_is_stripped_from_base_url() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir, "http://localhost:8000/api/");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
    }
}
