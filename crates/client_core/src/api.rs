use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::StudentId,
    error::ApiError,
    protocol::{
        AckResponse, DashboardResponse, LoginRequest, LoginResponse, RegistrationFormData,
        RegistrationStatusResponse, SignupForm, StatusUpdateRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Thin typed wrapper over the internship service's JSON endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url.trim()).with_context(|| format!("invalid api url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("api url '{base_url}' cannot carry a path"));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub async fn login(&self, id: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let url = self.endpoint(&[])?;
        self.send(self.http.post(url).json(&LoginRequest {
            id: id.to_string(),
            password: password.to_string(),
        }))
        .await
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<AckResponse, ClientError> {
        let url = self.endpoint(&["signup"])?;
        self.send(self.http.post(url).json(form)).await
    }

    pub async fn registration_status(
        &self,
        user_id: &StudentId,
    ) -> Result<RegistrationStatusResponse, ClientError> {
        let url = self.endpoint(&["registration", user_id.as_str()])?;
        self.send(self.http.get(url)).await
    }

    pub async fn submit_registration(
        &self,
        user_id: &StudentId,
        form: &RegistrationFormData,
    ) -> Result<AckResponse, ClientError> {
        let url = self.endpoint(&["registration", user_id.as_str()])?;
        self.send(self.http.post(url).json(form)).await
    }

    pub async fn list_requests(&self) -> Result<DashboardResponse, ClientError> {
        let url = self.endpoint(&["encadreur-dashboard"])?;
        self.send(self.http.get(url)).await
    }

    pub async fn update_status(
        &self,
        user_id: &StudentId,
        accepted: bool,
    ) -> Result<AckResponse, ClientError> {
        let url = self.endpoint(&["encadreur-dashboard", user_id.as_str()])?;
        self.send(
            self.http
                .put(url)
                .json(&StatusUpdateRequest { situation: accepted }),
        )
        .await
    }

    /// Appends percent-encoded path segments to the base url, keeping any
    /// prefix path the base already has.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let Ok(mut path) = url.path_segments_mut() else {
                return Err(ClientError::Network(format!(
                    "api url '{}' cannot carry a path",
                    self.base_url
                )));
            };
            path.pop_if_empty();
            path.extend(segments);
        }
        if segments.is_empty() && !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "api request failed before a response arrived");
            ClientError::from_transport(err)
        })?;
        let status = response.status();
        let url = response.url().clone();
        debug!(%url, status = status.as_u16(), "api response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let api_error: ApiError = serde_json::from_str(&body).unwrap_or_default();
            warn!(%url, status = status.as_u16(), "api returned error status");
            return Err(ClientError::Server {
                status: Some(status.as_u16()),
                message: api_error.message().map(str::to_owned),
            });
        }

        response.json::<T>().await.map_err(ClientError::from_transport)
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
