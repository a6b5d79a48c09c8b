//! In-memory provider doubles shared by the unit tests.

use crate::providers::error::ExternalCallError;
use crate::providers::ForecastProvider;
use crate::services::external_service::ExternalForecastService;
use crate::types::frame::series_frame;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use polars::frame::DataFrame;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub historical: bool,
    /// The target timestamp for forecasts, `(start, end)` for history.
    pub window: (DateTime<Utc>, DateTime<Utc>),
    pub lon: String,
    pub lat: String,
    pub params: Vec<String>,
    pub model: String,
}

pub(crate) type CallLog = Rc<RefCell<Vec<RecordedCall>>>;

/// Returns a canned frame (or a canned HTTP failure) and records every call.
pub(crate) struct ScriptedProvider {
    name: String,
    frame: Option<DataFrame>,
    calls: CallLog,
}

impl ScriptedProvider {
    pub fn returning(name: &str, frame: DataFrame) -> Self {
        Self {
            name: name.to_string(),
            frame: Some(frame),
            calls: CallLog::default(),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frame: None,
            calls: CallLog::default(),
        }
    }

    pub fn calls(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    fn answer(
        &self,
        historical: bool,
        window: (DateTime<Utc>, DateTime<Utc>),
        lon: &str,
        lat: &str,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        self.calls.borrow_mut().push(RecordedCall {
            historical,
            window,
            lon: lon.to_string(),
            lat: lat.to_string(),
            params: params.to_vec(),
            model: model.to_string(),
        });
        self.frame.clone().ok_or_else(|| ExternalCallError::HttpStatus {
            provider: self.name.clone(),
            url: format!("https://{}.invalid/forecast", self.name),
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }
}

impl ForecastProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_forecast_data(
        &self,
        lon: &str,
        lat: &str,
        target_timestamp: DateTime<Utc>,
        params: &[String],
        model: &str,
    ) -> Result<DataFrame, ExternalCallError> {
        let window = (target_timestamp, target_timestamp);
        self.answer(false, window, lon, lat, params, model)
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
        self.answer(true, (start, end), lon, lat, params, model)
    }
}

/// 2024-04-05T00:00:00Z
pub(crate) fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap()
}

pub(crate) fn hour(h: i64) -> NaiveDateTime {
    (day_start() + Duration::hours(h)).naive_utc()
}

/// A frame with `time_column` holding consecutive hours from [`day_start`].
pub(crate) fn hourly_frame(time_column: &str, columns: &[(&str, Vec<Option<f64>>)]) -> DataFrame {
    let rows = columns.first().map_or(0, |(_, values)| values.len());
    series_frame(
        time_column,
        (0..rows as i64).map(|h| Some(hour(h))).collect(),
        columns
            .iter()
            .map(|(name, values)| (name.to_string(), values.clone()))
            .collect(),
    )
    .unwrap()
}

/// Vocabulary of the scripted providers: `time`, `temp`, `wind`, `dir`, `gust`; models
/// `mix` and `icon_eu`.
pub(crate) fn scripted_service(
    name: &str,
    provider: ScriptedProvider,
) -> ExternalForecastService {
    ExternalForecastService::new(
        name,
        [
            (WeatherParam::Timestamp, "time".to_string()),
            (WeatherParam::Temperature, "temp".to_string()),
            (WeatherParam::WindSpeed, "wind".to_string()),
            (WeatherParam::WindDirection, "dir".to_string()),
            (WeatherParam::WindGusts, "gust".to_string()),
        ]
        .into_iter()
        .collect(),
        [
            (WeatherModel::Default, "mix".to_string()),
            (WeatherModel::Icon, "icon_eu".to_string()),
        ]
        .into_iter()
        .collect(),
        provider,
    )
}
