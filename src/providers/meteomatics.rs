use crate::providers::error::ExternalCallError;
use crate::providers::{execute_request, ForecastProvider, DEFAULT_TIMEOUT};
use crate::types::frame::series_frame;
use crate::types::time::utc_day_bounds;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use polars::frame::DataFrame;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "meteomatics";
pub const DEFAULT_BASE_URL: &str = "https://api.meteomatics.com";
/// Name of the time column in every Meteomatics table.
pub const TIME_COLUMN: &str = "validdate";
const URL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    data: Vec<ParameterSeries>,
}

#[derive(Debug, Deserialize)]
struct ParameterSeries {
    parameter: String,
    #[serde(default)]
    coordinates: Vec<CoordinateSeries>,
}

#[derive(Debug, Deserialize)]
struct CoordinateSeries {
    #[serde(default)]
    dates: Vec<DatedValue>,
}

#[derive(Debug, Deserialize)]
struct DatedValue {
    date: DateTime<Utc>,
    value: Option<f64>,
}

/// Client for the Meteomatics time-series API, authenticated with HTTP basic auth.
#[derive(Clone)]
pub struct MeteomaticsClient {
    base_url: String,
    user: String,
    password: String,
    client: Client,
}

impl fmt::Debug for MeteomaticsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeteomaticsClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl MeteomaticsClient {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ExternalCallError> {
        Self::with_timeout(base_url, user, password, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
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
            user: user.into(),
            password: password.into(),
            client,
        })
    }

    /// Builds the time-series URL for an hourly range at one coordinate.
    pub(crate) fn series_url(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
    ) -> String {
        format!(
            "{}/{}--{}:PT1H/{}/{},{}/json",
            self.base_url,
            start.format(URL_TIME_FORMAT),
            end.format(URL_TIME_FORMAT),
            params.join(","),
            lat,
            lon
        )
    }

    /// Hourly request for the whole UTC day containing `target_timestamp`.
    fn forecast_request(
        &self,
        lon: &str,
        lat: &str,
        target_timestamp: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        let (start, end) = utc_day_bounds(target_timestamp);
        self.request(lon, lat, start, end, params, model)
    }

    /// Hourly request for exactly `[start, end]`.
    fn historical_request(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        self.request(lon, lat, start, end, params, model)
    }

    fn request(
        &self,
        lon: &str,
        lat: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> RequestBuilder {
        self.client
            .get(self.series_url(lon, lat, start, end, params))
            .query(&[("model", model)])
            .basic_auth(&self.user, Some(&self.password))
    }

    fn send(
        &self,
        request: RequestBuilder,
        params: &[String],
    ) -> Result<DataFrame, ExternalCallError> {
        let body = execute_request(PROVIDER_NAME, &self.client, request)?;
        parse_series_response(&body, params)
    }
}

impl ForecastProvider for MeteomaticsClient {
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

/// Pivots the per-parameter date lists into one `"validdate"` column plus one column per
/// requested parameter. Dates missing for a parameter become nulls.
pub(crate) fn parse_series_response(
    body: &str,
    params: &[String],
) -> Result<DataFrame, ExternalCallError> {
    let payload: TimeSeriesResponse = serde_json::from_str(body).map_err(|error| {
        ExternalCallError::invalid(PROVIDER_NAME, format!("time-series payload: {error}"))
    })?;

    let mut by_parameter: BTreeMap<String, BTreeMap<NaiveDateTime, Option<f64>>> = BTreeMap::new();
    for series in payload.data {
        let Some(coordinate) = series.coordinates.into_iter().next() else {
            return Err(ExternalCallError::invalid(
                PROVIDER_NAME,
                format!("parameter '{}' has no coordinates", series.parameter),
            ));
        };
        let values = coordinate
            .dates
            .into_iter()
            .map(|dated| (dated.date.naive_utc(), dated.value))
            .collect();
        by_parameter.insert(series.parameter, values);
    }

    let mut times: Vec<NaiveDateTime> = by_parameter
        .values()
        .flat_map(|values| values.keys().copied())
        .collect();
    times.sort();
    times.dedup();

    let mut columns = Vec::with_capacity(params.len());
    for param in params {
        let values = by_parameter.get(param).ok_or_else(|| {
            ExternalCallError::invalid(PROVIDER_NAME, format!("missing parameter '{param}'"))
        })?;
        let column = times
            .iter()
            .map(|time| values.get(time).copied().flatten())
            .collect();
        columns.push((param.clone(), column));
    }

    let df = series_frame(TIME_COLUMN, times.into_iter().map(Some).collect(), columns)
        .map_err(ExternalCallError::frame(PROVIDER_NAME))?;
    debug!("[{}] parsed {} x {} frame", PROVIDER_NAME, df.height(), df.width());
    Ok(df)
}
