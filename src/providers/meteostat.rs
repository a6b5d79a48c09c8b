//! Historical hourly observations from the Meteostat bulk data service.

use crate::providers::error::ExternalCallError;
use crate::providers::station::{Station, StationIndex};
use crate::providers::{ForecastProvider, DEFAULT_TIMEOUT};
use crate::types::frame::{float_values, series_frame, timestamp_dtype};
use crate::types::location::Location;
use async_compression::tokio::bufread::GzipDecoder;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

pub const PROVIDER_NAME: &str = "meteostat";
/// Name of the time column derived from the `date` and `hour` columns.
pub const TIME_COLUMN: &str = "time";
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;
const BULK_URL: &str = "https://bulk.meteostat.net/v2";
const STATIONS_URL: &str = "https://bulk.meteostat.net/v2/stations/lite.json.gz";
const HOURLY_SCHEMA: [&str; 13] = [
    "date", "hour", "temp", "dwpt", "rhum", "prcp", "snow", "wdir", "wspd", "wpgt", "pres",
    "tsun", "coco",
];

/// Historical hourly observations for the station nearest to a location.
///
/// Downloads go through a private current-thread tokio runtime, so the client must not be
/// used from inside another tokio runtime. Nothing is cached: every call downloads the
/// station's full hourly archive again.
#[derive(Debug, Clone)]
pub struct MeteostatClient {
    stations: StationIndex,
    fixed_station: Option<String>,
    max_distance_km: f64,
    client: Client,
}

impl MeteostatClient {
    /// Downloads the Meteostat station list so locations can be resolved to stations.
    ///
    /// # Errors
    ///
    /// Fails if the station list cannot be downloaded, decompressed or parsed.
    pub fn new() -> Result<Self, ExternalCallError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ExternalCallError> {
        let client = build_client(timeout)?;
        let bytes = block_on(download_gzip(&client, STATIONS_URL))??;
        let stations: Vec<Station> = serde_json::from_slice(&bytes).map_err(|error| {
            ExternalCallError::invalid(PROVIDER_NAME, format!("station list: {error}"))
        })?;
        info!("[{}] loaded {} stations", PROVIDER_NAME, stations.len());
        Ok(Self::from_stations(stations, client))
    }

    /// Uses a preloaded station list instead of downloading one.
    pub fn with_stations(stations: Vec<Station>) -> Result<Self, ExternalCallError> {
        Ok(Self::from_stations(stations, build_client(DEFAULT_TIMEOUT)?))
    }

    /// Always reads from the given station, whatever the requested location.
    pub fn with_station(station_id: impl Into<String>) -> Result<Self, ExternalCallError> {
        let mut client = Self::from_stations(Vec::new(), build_client(DEFAULT_TIMEOUT)?);
        client.fixed_station = Some(station_id.into());
        Ok(client)
    }

    /// Sets how far away the nearest station may be.
    pub fn max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    fn from_stations(stations: Vec<Station>, client: Client) -> Self {
        Self {
            stations: StationIndex::new(stations),
            fixed_station: None,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            client,
        }
    }

    /// Resolves the station id to read for the given coordinates.
    ///
    /// # Errors
    ///
    /// * [`ExternalCallError::InvalidCoordinate`] if the coordinates do not parse.
    /// * [`ExternalCallError::NoStationNearby`] if no station lies within range.
    pub fn resolve_station(&self, lon: &str, lat: &str) -> Result<String, ExternalCallError> {
        if let Some(id) = &self.fixed_station {
            return Ok(id.clone());
        }

        let point = Location::new("", lon, lat)
            .coordinates()
            .map_err(|_| ExternalCallError::InvalidCoordinate(format!("{lat}, {lon}")))?;
        match self.stations.nearest(point, self.max_distance_km) {
            Some((station, km)) => {
                info!(
                    "[{}] using station {} ({}) at {:.1} km",
                    PROVIDER_NAME,
                    station.id,
                    station.display_name(),
                    km
                );
                Ok(station.id.clone())
            }
            None => Err(ExternalCallError::NoStationNearby {
                lat: point.0,
                lon: point.1,
                max_distance_km: self.max_distance_km,
            }),
        }
    }
}

impl ForecastProvider for MeteostatClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn get_forecast_data(
        &self,
        _lon: &str,
        _lat: &str,
        _target_timestamp: DateTime<Utc>,
        _params: &[String],
        _model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        Err(ExternalCallError::Unsupported {
            provider: PROVIDER_NAME.to_string(),
            capability: "forecasts",
        })
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
        debug!("[{}] model '{}' is implied by the station", PROVIDER_NAME, model);
        let station = self.resolve_station(lon, lat)?;
        let url = format!("{}/hourly/{}.csv.gz", BULK_URL, station);
        let bytes = block_on(download_gzip(&self.client, &url))??;
        let raw = csv_to_dataframe(&bytes, &station)?;
        select_hourly(&raw, start, end, params)
    }
}

fn build_client(timeout: Duration) -> Result<Client, ExternalCallError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ExternalCallError::Client {
            provider: PROVIDER_NAME.to_string(),
            source,
        })
}

fn block_on<F: Future>(future: F) -> Result<F::Output, ExternalCallError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ExternalCallError::Runtime)?;
    Ok(runtime.block_on(future))
}

/// Downloads and decompresses a gzip file.
async fn download_gzip(client: &Client, url: &str) -> Result<Vec<u8>, ExternalCallError> {
    info!("[{}] downloading {}", PROVIDER_NAME, url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| ExternalCallError::NetworkRequest {
            provider: PROVIDER_NAME.to_string(),
            url: url.to_string(),
            source,
        })?;

    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(e) => {
            warn!("[{}] HTTP error for {}: {:?}", PROVIDER_NAME, url, e);
            return Err(match e.status() {
                Some(status) => ExternalCallError::HttpStatus {
                    provider: PROVIDER_NAME.to_string(),
                    url: url.to_string(),
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("request failed").to_string(),
                },
                None => ExternalCallError::NetworkRequest {
                    provider: PROVIDER_NAME.to_string(),
                    url: url.to_string(),
                    source: e,
                },
            });
        }
    };

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut decoder = GzipDecoder::new(BufReader::new(StreamReader::new(stream)));
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .await
        .map_err(|source| ExternalCallError::Download {
            provider: PROVIDER_NAME.to_string(),
            source,
        })?;
    debug!(
        "[{}] decompressed {} bytes from {}",
        PROVIDER_NAME,
        decompressed.len(),
        url
    );
    Ok(decompressed)
}

/// Parses the headerless hourly CSV and names its columns.
fn csv_to_dataframe(bytes: &[u8], station: &str) -> Result<DataFrame, ExternalCallError> {
    let io_error = |source| ExternalCallError::Download {
        provider: PROVIDER_NAME.to_string(),
        source,
    };
    let mut temp_file = NamedTempFile::new().map_err(io_error)?;
    temp_file.write_all(bytes).map_err(io_error)?;
    temp_file.flush().map_err(io_error)?;

    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(ExternalCallError::frame(PROVIDER_NAME))?;

    if df.width() != HOURLY_SCHEMA.len() {
        return Err(ExternalCallError::invalid(
            PROVIDER_NAME,
            format!(
                "hourly CSV for station {} has {} columns, expected {}",
                station,
                df.width(),
                HOURLY_SCHEMA.len()
            ),
        ));
    }
    df.set_column_names(HOURLY_SCHEMA)
        .map_err(ExternalCallError::frame(PROVIDER_NAME))?;
    Ok(df)
}

/// Derives the `"time"` column from `date` + `hour`, keeps rows within `[start, end]` and
/// the requested columns as `f64`.
pub(crate) fn select_hourly(
    raw: &DataFrame,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    params: &[String],
) -> Result<DataFrame, ExternalCallError> {
    let to_frame_error = ExternalCallError::frame(PROVIDER_NAME);
    let times = hourly_times(raw).map_err(to_frame_error)?;

    let mut series = Vec::with_capacity(params.len());
    for param in params {
        if !HOURLY_SCHEMA[2..].contains(&param.as_str()) {
            return Err(ExternalCallError::invalid(
                PROVIDER_NAME,
                format!("unknown hourly column '{param}'"),
            ));
        }
        let values = float_values(raw, param).map_err(ExternalCallError::frame(PROVIDER_NAME))?;
        series.push((param.clone(), values));
    }

    let start_naive = start.naive_utc();
    let end_naive = end.naive_utc();
    series_frame(TIME_COLUMN, times, series)
        .and_then(|df| {
            df.lazy()
                .filter(
                    col(TIME_COLUMN)
                        .cast(timestamp_dtype())
                        .gt_eq(lit(start_naive))
                        .and(col(TIME_COLUMN).cast(timestamp_dtype()).lt_eq(lit(end_naive))),
                )
                .collect()
        })
        .map_err(ExternalCallError::frame(PROVIDER_NAME))
}

fn hourly_times(raw: &DataFrame) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let dates = raw.column("date")?.cast(&DataType::String)?;
    let hours = raw.column("hour")?.cast(&DataType::Int64)?;
    Ok(dates
        .str()?
        .into_iter()
        .zip(hours.i64()?.into_iter())
        .map(|(date, hour)| {
            let date = NaiveDate::parse_from_str(date?, "%Y-%m-%d").ok()?;
            date.and_hms_opt(u32::try_from(hour?).ok()?, 0, 0)
        })
        .collect())
}
