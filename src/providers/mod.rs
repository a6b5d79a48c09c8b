//! Adapters for third-party weather APIs.
//!
//! Every adapter speaks its provider's own vocabulary: parameter and model names arrive
//! already translated, and the returned frame is keyed by the provider's column names.
//! Translation to and from the domain happens in
//! [`crate::services::external_service::ExternalForecastService`].

pub mod error;
pub mod meteomatics;
pub mod meteostat;
pub mod open_meteo;
pub mod station;

use crate::providers::error::ExternalCallError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use polars::frame::DataFrame;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A source of raw, provider-keyed weather tables.
pub trait ForecastProvider {
    /// Short name used in errors and logs.
    fn name(&self) -> &str;

    /// Fetches hourly forecast values around `target_timestamp`.
    ///
    /// # Arguments
    ///
    /// * `lon`, `lat` - Decimal-degree coordinates as strings.
    /// * `params` - Parameter names in the provider's vocabulary.
    /// * `model` - Model name in the provider's vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an [`ExternalCallError`] when the request fails or the response cannot be
    /// turned into a table.
    fn get_forecast_data(
        &self,
        lon: &str,
        lat: &str,
        target_timestamp: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError>;

    /// Fetches hourly values between `start` and `end` (inclusive).
    ///
    /// Providers without an archive keep the default, which fails with
    /// [`ExternalCallError::Unsupported`].
    fn get_historical_data(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        let _ = (lon, lat, start, end, params, model);
        Err(ExternalCallError::Unsupported {
            provider: self.name().to_string(),
            capability: "historical data",
        })
    }
}

/// Sends a blocking request and returns the body of a successful response.
///
/// Non-2xx responses become [`ExternalCallError::HttpStatus`], using the error message
/// found in a JSON body when there is one.
pub(crate) fn execute_request(
    provider: &str,
    client: &Client,
    request: RequestBuilder,
) -> Result<String, ExternalCallError> {
    let request = request.build().map_err(|source| ExternalCallError::Client {
        provider: provider.to_string(),
        source,
    })?;
    let url = request.url().to_string();
    info!("[{}] GET {}", provider, url);

    let response = client
        .execute(request)
        .map_err(|source| ExternalCallError::NetworkRequest {
            provider: provider.to_string(),
            url: url.clone(),
            source,
        })?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|source| ExternalCallError::NetworkRequest {
            provider: provider.to_string(),
            url: url.clone(),
            source,
        })?;

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    warn!("[{}] HTTP {} for {}: {}", provider, status.as_u16(), url, message);
    Err(ExternalCallError::HttpStatus {
        provider: provider.to_string(),
        url,
        status: status.as_u16(),
        message,
    })
}

fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let json = serde_json::from_str::<Value>(trimmed).ok()?;
    ["reason", "message", "error", "description"]
        .iter()
        .filter_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_reason() {
        let body = r#"{"error": true, "reason": "Cannot initialize WeatherVariable from invalid String value foo"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Cannot initialize WeatherVariable from invalid String value foo")
        );
    }

    #[test]
    fn test_error_message_from_plain_body_is_none() {
        assert_eq!(extract_error_message(""), None);
        assert_eq!(extract_error_message("Bad Gateway"), None);
        assert_eq!(extract_error_message(r#"{"message": "  "}"#), None);
    }
}
