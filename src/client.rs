use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    ClientId, ExplanationPayload, FindProfileRequest, Profile, RecommendationsResponse,
    UpdateProfileRequest,
};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Client for the credit backends: the profile data API and the
/// explanation/suggestion service.
#[derive(Clone)]
pub struct CreditApiClient {
    client: reqwest::Client,
    api_url: String,
    data_api_url: String,
}

impl CreditApiClient {
    /// Creates a new `CreditApiClient`.
    ///
    /// Timeouts are left to the transport; the configured value is applied to
    /// every request and failed requests are never retried.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            data_api_url: config.data_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Looks up a profile by client identity.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The backend answered with `null` or an empty mapping.
    /// * `Ok(Some(profile))` - The profile record.
    pub async fn find_profile(&self, client_id: ClientId) -> Result<Option<Profile>, AppError> {
        let url = format!("{}/api/findOne", self.data_api_url);
        tracing::info!("Fetching profile for client {}", client_id);

        let response = self
            .client
            .post(&url)
            .json(&FindProfileRequest::new(client_id))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Profile request failed: {}", e)))?;

        let body = read_json(response, "profile").await?;

        let record = match body {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };

        match record {
            Value::Null | Value::Array(_) => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(map) => {
                let profile = serde_json::from_value(Value::Object(map)).map_err(|e| {
                    AppError::ParseError(format!("Failed to decode profile: {}", e))
                })?;
                Ok(Some(profile))
            }
            other => Err(AppError::ParseError(format!(
                "Unexpected profile response: {}",
                other
            ))),
        }
    }

    /// Fetches the generated explanation for a client.
    pub async fn fetch_explanation(
        &self,
        client_id: ClientId,
    ) -> Result<ExplanationPayload, AppError> {
        let url = format!("{}/credit_score/{}", self.api_url, client_id);
        tracing::info!("Fetching credit explanation for client {}", client_id);

        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Explanation request failed: {}", e))
            })?;

        let body = read_json(response, "explanation").await?;
        ExplanationPayload::from_response(body)
            .with_context(|| format!("Decoding explanation for client {}", client_id))
    }

    /// Requests product recommendations for an explanation.
    ///
    /// The full explanation payload is posted back; the returned value is the
    /// `productRecommendations` field (`Null` when the backend omits it).
    pub async fn fetch_recommendations(
        &self,
        explanation: &ExplanationPayload,
    ) -> Result<Value, AppError> {
        let url = format!("{}/product_suggestions", self.api_url);
        tracing::info!("Requesting product recommendations");

        let response = self
            .client
            .post(&url)
            .json(explanation)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Recommendation request failed: {}", e))
            })?;

        let body = read_json(response, "recommendations").await?;
        let parsed: RecommendationsResponse = serde_json::from_value(body).map_err(|e| {
            AppError::ParseError(format!("Failed to decode recommendations: {}", e))
        })?;

        Ok(parsed.product_recommendations)
    }

    /// Persists a sparse profile update. Only HTTP 200 counts as success.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<(), AppError> {
        let url = format!("{}/api/updateOne", self.data_api_url);
        tracing::info!(
            "Updating {} profile field(s) for client {}",
            request.update.set.len(),
            request.filter.customer_id
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Profile update failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Profile update returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("✓ Profile updated for client {}", request.filter.customer_id);
        Ok(())
    }
}

/// Checks the status and decodes the body as JSON.
async fn read_json(response: reqwest::Response, what: &str) -> Result<Value, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::ExternalApiError(format!(
            "{} request returned {}: {}",
            what, status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::ParseError(format!("Failed to parse {} response: {}", what, e)))
}
