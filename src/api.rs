// Typed API surface
// Endpoint methods layered on the authenticated HTTP client.

use reqwest::Method;

use crate::auth::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use crate::error::ClientError;
use crate::http_client::HealthtrackHttpClient;
use crate::models::{ListResponse, Measurement, NewMeasurement};

impl HealthtrackHttpClient {
    /// Sign in and persist the returned token pair and user record
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let req = self.request(Method::POST, "/auth/login/").json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        let response: LoginResponse = self.execute(req).await?;

        self.session()
            .store_login(&response.access, &response.refresh, &response.user)
            .await?;
        tracing::info!("Signed in as {}", response.user.username);
        Ok(response.user)
    }

    /// Create a new account (does not sign in)
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, ClientError> {
        let req = self.request(Method::POST, "/auth/register/").json(&request);
        self.execute(req).await
    }

    /// Drop the persisted session
    ///
    /// Sign-out is purely client side; the backend invalidates nothing.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session().clear().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Fetch the signed-in user and sync the persisted record
    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let user: UserProfile = self.execute(self.request(Method::GET, "/users/me/")).await?;
        self.session().set_user(Some(&user)).await?;
        Ok(user)
    }

    /// Partially update the signed-in user
    pub async fn update_current_user(
        &self,
        patch: &serde_json::Value,
    ) -> Result<UserProfile, ClientError> {
        let req = self.request(Method::PATCH, "/users/me/").json(patch);
        let user: UserProfile = self.execute(req).await?;
        self.session().set_user(Some(&user)).await?;
        Ok(user)
    }

    /// List the signed-in user's measurements, newest first
    pub async fn my_measurements(&self) -> Result<Vec<Measurement>, ClientError> {
        let list: ListResponse<Measurement> = self
            .execute(self.request(Method::GET, "/measurements/my-measurements/"))
            .await?;
        Ok(list.into_vec())
    }

    /// Record a new measurement
    pub async fn create_measurement(
        &self,
        measurement: &NewMeasurement,
    ) -> Result<Measurement, ClientError> {
        let req = self.request(Method::POST, "/measurements/").json(measurement);
        self.execute(req).await
    }
}
