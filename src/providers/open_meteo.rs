use crate::providers::error::ExternalCallError;
use crate::providers::{execute_request, ForecastProvider, DEFAULT_TIMEOUT};
use crate::types::frame::series_frame;
use crate::types::time::utc_day_bounds;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use polars::frame::DataFrame;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "open_meteo";
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
/// Name of the time column in every Open-Meteo table.
pub const TIME_COLUMN: &str = "time";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: &'a str,
    longitude: &'a str,
    hourly: String,
    models: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

/// Client for the Open-Meteo forecast API.
///
/// Open-Meteo needs no credentials. Forecast requests cover the whole UTC day of the
/// target timestamp; the API also serves recent past days, so historical requests are
/// supported for the range it keeps.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    client: Client,
}

impl OpenMeteoClient {
    /// Creates a client against `base_url` (e.g. [`DEFAULT_BASE_URL`]) using the default
    /// request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ExternalCallError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExternalCallError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ExternalCallError::Client {
                provider: PROVIDER_NAME.to_string(),
                source,
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request for the whole UTC day containing `target_timestamp`.
    fn forecast_request(
        &self,
        lon: &str,
        lat: &str,
        target_timestamp: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        let (start, end) = utc_day_bounds(target_timestamp);
        self.request(lon, lat, start.date_naive(), end.date_naive(), params, model)
    }

    /// Request for every UTC day touched by `[start, end]`.
    fn historical_request(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        self.request(lon, lat, start.date_naive(), end.date_naive(), params, model)
    }

    fn request(
        &self,
        lon: &str,
        lat: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        let query = ForecastQuery {
            latitude: lat,
            longitude: lon,
            hourly: params.join(","),
            models: model,
            start_date,
            end_date,
            timezone: "GMT",
        };
        self.client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&query)
    }

    fn send(
        &self,
        request: RequestBuilder,
        params: &[String],
    ) -> Result<DataFrame, ExternalCallError> {
        let body = execute_request(PROVIDER_NAME, &self.client, request)?;
        parse_forecast_response(&body, params)
    }
}

impl ForecastProvider for OpenMeteoClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn get_forecast_data(
        &self,
        lon: &str,
        lat: &str,
        target_timestamp: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        let request = self.forecast_request(lon, lat, target_timestamp, params, model);
        self.send(request, params)
    }

    fn get_historical_data(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        let request = self.historical_request(lon, lat, start, end, params, model);
        self.send(request, params)
    }
}

/// Turns the `hourly` block of a forecast response into a `"time"` column followed by
/// one column per requested parameter.
pub(crate) fn parse_forecast_response(
    body: &str,
    params: &[String],
) -> Result<DataFrame, ExternalCallError> {
    let payload: ForecastResponse = serde_json::from_str(body).map_err(|error| {
        ExternalCallError::invalid(PROVIDER_NAME, format!("forecast payload: {error}"))
    })?;
    let Some(mut hourly) = payload.hourly else {
        return Err(ExternalCallError::invalid(
            PROVIDER_NAME,
            "forecast payload: missing hourly block",
        ));
    };

    let times = hourly
        .time
        .iter()
        .map(|raw| {
            NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map(Some).map_err(|error| {
                ExternalCallError::invalid(PROVIDER_NAME, format!("invalid time '{raw}': {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut series = Vec::with_capacity(params.len());
    for param in params {
        let values = hourly.series.remove(param).ok_or_else(|| {
            ExternalCallError::invalid(PROVIDER_NAME, format!("missing hourly series '{param}'"))
        })?;
        if values.len() != times.len() {
            return Err(ExternalCallError::invalid(
                PROVIDER_NAME,
                format!(
                    "hourly series '{param}' has {} values for {} timestamps",
                    values.len(),
                    times.len()
                ),
            ));
        }
        series.push((param.clone(), values));
    }

    let df = series_frame(TIME_COLUMN, times, series)
        .map_err(ExternalCallError::frame(PROVIDER_NAME))?;
    debug!("[{}] parsed {} x {} frame", PROVIDER_NAME, df.height(), df.width());
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::frame::{float_values, naive_timestamps};
    use chrono::TimeZone;

    fn query_of(request: RequestBuilder) -> HashMap<String, String> {
        request
            .build()
            .unwrap()
            .url()
            .query_pairs()
            .into_owned()
            .collect()
    }

    const BODY: &str = r#"{
        "latitude": 52.52,
        "longitude": 13.419998,
        "timezone": "GMT",
        "hourly_units": {"time": "iso8601", "temperature_2m": "°C"},
        "hourly": {
            "time": ["2024-04-05T00:00", "2024-04-05T01:00", "2024-04-05T02:00"],
            "temperature_2m": [9.1, null, 8.4],
            "windspeed_10m": [11.2, 10.8, 9.9]
        }
    }"#;

    #[test]
    fn test_parse_keeps_requested_order() {
        let params = vec!["windspeed_10m".to_string(), "temperature_2m".to_string()];
        let df = parse_forecast_response(BODY, &params).unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["time", "windspeed_10m", "temperature_2m"]);
        assert_eq!(df.height(), 3);
        assert_eq!(
            float_values(&df, "temperature_2m").unwrap(),
            vec![Some(9.1), None, Some(8.4)]
        );
        let first = naive_timestamps(&df, TIME_COLUMN).unwrap()[0].unwrap();
        assert_eq!(first.to_string(), "2024-04-05 00:00:00");
    }

    #[test]
    fn test_parse_rejects_missing_series() {
        let params = vec!["windgusts_10m".to_string()];
        let error = parse_forecast_response(BODY, &params).unwrap_err();
        assert!(matches!(error, ExternalCallError::InvalidResponse { .. }));
        assert!(error.to_string().contains("windgusts_10m"));
    }

    #[test]
    fn test_parse_rejects_payload_without_hourly_block() {
        let error = parse_forecast_response(r#"{"latitude": 52.5}"#, &[]).unwrap_err();
        assert!(matches!(error, ExternalCallError::InvalidResponse { .. }));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = OpenMeteoClient::new("https://api.open-meteo.com/").unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.name(), PROVIDER_NAME);
    }

    #[test]
    fn test_forecast_request_covers_target_day() {
        let client = OpenMeteoClient::new(DEFAULT_BASE_URL).unwrap();
        let target = Utc.with_ymd_and_hms(2024, 4, 5, 17, 45, 0).unwrap();
        let params = vec!["temperature_2m".to_string(), "windspeed_10m".to_string()];

        let request = client.forecast_request("13.405", "52.52", target, &params, "icon_seamless");
        let url = request.try_clone().unwrap().build().unwrap().url().clone();
        assert_eq!(url.path(), "/v1/forecast");
        let query = query_of(request);
        assert_eq!(query["start_date"], "2024-04-05");
        assert_eq!(query["end_date"], "2024-04-05");
        assert_eq!(query["hourly"], "temperature_2m,windspeed_10m");
        assert_eq!(query["models"], "icon_seamless");
        assert_eq!(query["latitude"], "52.52");
        assert_eq!(query["longitude"], "13.405");
        assert_eq!(query["timezone"], "GMT");
    }

    #[test]
    fn test_historical_request_spans_every_touched_day() {
        let client = OpenMeteoClient::new(DEFAULT_BASE_URL).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 4, 3, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 4, 5, 1, 0, 0).unwrap();

        let query = query_of(client.historical_request(
            "13.405",
            "52.52",
            start,
            end,
            &["temperature_2m".to_string()],
            "gfs",
        ));
        assert_eq!(query["start_date"], "2024-04-03");
        assert_eq!(query["end_date"], "2024-04-05");
        assert_eq!(query["models"], "gfs");
    }
}
