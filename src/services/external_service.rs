//! One third-party provider, wrapped so it speaks the domain vocabulary.

use crate::mapping::bijective_map::BiMap;
use crate::providers::error::ExternalCallError;
use crate::providers::meteomatics::{self, MeteomaticsClient};
use crate::providers::meteostat::{self, MeteostatClient};
use crate::providers::open_meteo::{self, OpenMeteoClient};
use crate::providers::ForecastProvider;
use crate::services::error::{ServiceError, TranslationError};
use crate::types::forecast::Forecast;
use crate::types::frame::{timestamp_dtype, TIMESTAMP_COLUMN};
use crate::types::location::Location;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use chrono::{DateTime, Utc};
use log::{debug, info};
use polars::prelude::*;
use std::fmt;

const OPEN_METEO_PARAMS: [(WeatherParam, &str); 5] = [
    (WeatherParam::Timestamp, open_meteo::TIME_COLUMN),
    (WeatherParam::Temperature, "temperature_2m"),
    (WeatherParam::WindSpeed, "windspeed_10m"),
    (WeatherParam::WindDirection, "winddirection_10m"),
    (WeatherParam::WindGusts, "windgusts_10m"),
];
const OPEN_METEO_MODELS: [(WeatherModel, &str); 2] = [
    (WeatherModel::Default, "gfs"),
    (WeatherModel::Icon, "icon_seamless"),
];

const METEOMATICS_PARAMS: [(WeatherParam, &str); 5] = [
    (WeatherParam::Timestamp, meteomatics::TIME_COLUMN),
    (WeatherParam::Temperature, "t_2m:C"),
    (WeatherParam::WindSpeed, "wind_speed_10m:kmh"),
    (WeatherParam::WindDirection, "wind_dir_10m:d"),
    (WeatherParam::WindGusts, "wind_gusts_10m_1h:kmh"),
];
const METEOMATICS_MODELS: [(WeatherModel, &str); 1] = [(WeatherModel::Default, "mix")];

const METEOSTAT_PARAMS: [(WeatherParam, &str); 5] = [
    (WeatherParam::Timestamp, meteostat::TIME_COLUMN),
    (WeatherParam::Temperature, "temp"),
    (WeatherParam::WindSpeed, "wspd"),
    (WeatherParam::WindDirection, "wdir"),
    (WeatherParam::WindGusts, "wpgt"),
];
const METEOSTAT_MODELS: [(WeatherModel, &str); 1] = [(WeatherModel::Default, "station")];

fn vocabulary<K: Copy + std::hash::Hash + Eq + fmt::Display>(
    pairs: &[(K, &str)],
) -> BiMap<K, String> {
    pairs
        .iter()
        .map(|(domain, wire)| (*domain, wire.to_string()))
        .collect()
}

/// A named provider together with the mappings between its vocabulary and the domain.
///
/// Every request is translated before it reaches the provider and every response is
/// translated back, so callers only ever see [`WeatherParam`] names as columns.
pub struct ExternalForecastService {
    name: String,
    params: BiMap<WeatherParam, String>,
    models: BiMap<WeatherModel, String>,
    provider: Box<dyn ForecastProvider>,
}

impl fmt::Debug for ExternalForecastService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalForecastService")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("params", &self.params)
            .field("models", &self.models)
            .finish()
    }
}

impl ExternalForecastService {
    /// # Arguments
    ///
    /// * `name` - Key under which the service is registered in a
    ///   [`crate::ForecastService`].
    /// * `params` - Domain parameter ↔ provider column name. Must map
    ///   [`WeatherParam::Timestamp`] to the provider's time column.
    /// * `models` - Domain model ↔ provider model name.
    /// * `provider` - The adapter performing the actual calls.
    pub fn new(
        name: impl Into<String>,
        params: BiMap<WeatherParam, String>,
        models: BiMap<WeatherModel, String>,
        provider: impl ForecastProvider + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            models,
            provider: Box::new(provider),
        }
    }

    /// Open-Meteo, registered as `"open_meteo"`.
    pub fn open_meteo(client: OpenMeteoClient) -> Self {
        Self::new(
            open_meteo::PROVIDER_NAME,
            vocabulary(&OPEN_METEO_PARAMS),
            vocabulary(&OPEN_METEO_MODELS),
            client,
        )
    }

    /// Meteomatics, registered as `"meteomatics"`. Only the default (`mix`) model.
    pub fn meteomatics(client: MeteomaticsClient) -> Self {
        Self::new(
            meteomatics::PROVIDER_NAME,
            vocabulary(&METEOMATICS_PARAMS),
            vocabulary(&METEOMATICS_MODELS),
            client,
        )
    }

    /// Meteostat station observations, registered as `"meteostat"`. Historical only.
    pub fn meteostat(client: MeteostatClient) -> Self {
        Self::new(
            meteostat::PROVIDER_NAME,
            vocabulary(&METEOSTAT_PARAMS),
            vocabulary(&METEOSTAT_MODELS),
            client,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &BiMap<WeatherParam, String> {
        &self.params
    }

    pub fn models(&self) -> &BiMap<WeatherModel, String> {
        &self.models
    }

    /// Translates domain parameters into the provider's names, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails with a [`TranslationError`] naming the first parameter the provider does not
    /// know. Nothing is returned for the others.
    pub fn translate_to_query_params(
        &self,
        params: &[WeatherParam],
    ) -> Result<Vec<String>, TranslationError> {
        let translated = params
            .iter()
            .map(|param| {
                self.params
                    .get(param)
                    .cloned()
                    .map_err(|source| self.translation_error(param, source))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("[{}] query params {:?} -> {:?}", self.name, params, translated);
        Ok(translated)
    }

    /// Translates provider names back into domain parameters, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails with a [`TranslationError`] naming the first unknown provider name.
    pub fn translate_to_domain_params<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<WeatherParam>, TranslationError> {
        names
            .iter()
            .map(|name| {
                self.params
                    .backward()
                    .get(name.as_ref())
                    .copied()
                    .map_err(|source| self.translation_error(name.as_ref(), source))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Fails with a [`TranslationError`] if the provider does not offer `model`.
    pub fn translate_to_query_model(&self, model: WeatherModel) -> Result<&str, TranslationError> {
        self.models
            .get(&model)
            .map(String::as_str)
            .map_err(|source| self.translation_error(&model, source))
    }

    /// # Errors
    ///
    /// Fails with a [`TranslationError`] if `name` is not one of the provider's models.
    pub fn translate_to_domain_model(&self, name: &str) -> Result<WeatherModel, TranslationError> {
        self.models
            .backward()
            .get(name)
            .copied()
            .map_err(|source| self.translation_error(name, source))
    }

    /// Fetches a forecast for `location` around `target_timestamp`.
    ///
    /// The returned [`Forecast`] has a `"timestamp"` column followed by the requested
    /// parameters in request order, rows sorted by time, and `created_at == valid_at ==`
    /// the time of the call. [`WeatherParam::Timestamp`] may be listed but is implied.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::NoParameters`] if no measurement was requested; the provider is
    ///   not called.
    /// * [`ServiceError::Translation`] if a parameter, the model, or a returned column has
    ///   no counterpart in the provider's vocabulary.
    /// * [`ServiceError::External`] for any provider failure, unchanged.
    /// * [`ServiceError::MissingTimestamp`] if the provider returned no time column.
    pub fn get_forecast(
        &self,
        location: &Location,
        target_timestamp: DateTime<Utc>,
        params: &[WeatherParam],
        model: WeatherModel,
    ) -> Result<Forecast, ServiceError> {
        info!(
            "[{}] forecast for {} at {} ({} model)",
            self.name, location, target_timestamp, model
        );
        let data = self.fetch(params, model, |provider, query_params, query_model| {
            provider.get_forecast_data(
                location.lon(),
                location.lat(),
                target_timestamp,
                query_params,
                query_model,
            )
        })?;
        let now = Utc::now();
        Ok(Forecast::new(now, now, data, location.clone(), model)
            .with_provider(&self.name))
    }

    /// Fetches values between `start` and `end` through the provider's archive.
    ///
    /// Works like [`ExternalForecastService::get_forecast`], except that `valid_at` is
    /// `start`.
    ///
    /// # Errors
    ///
    /// As for [`ExternalForecastService::get_forecast`]; providers without an archive fail
    /// with [`ExternalCallError::Unsupported`].
    pub fn get_historical_forecast(
        &self,
        location: &Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        params: &[WeatherParam],
        model: WeatherModel,
    ) -> Result<Forecast, ServiceError> {
        info!(
            "[{}] history for {} from {} to {} ({} model)",
            self.name, location, start, end, model
        );
        let data = self.fetch(params, model, |provider, query_params, query_model| {
            provider.get_historical_data(
                location.lon(),
                location.lat(),
                start,
                end,
                query_params,
                query_model,
            )
        })?;
        Ok(
            Forecast::new(Utc::now(), start, data, location.clone(), model)
                .with_provider(&self.name),
        )
    }

    fn fetch<F>(
        &self,
        params: &[WeatherParam],
        model: WeatherModel,
        call: F,
    ) -> Result<DataFrame, ServiceError>
    where
        F: FnOnce(&dyn ForecastProvider, &[String], &str) -> Result<DataFrame, ExternalCallError>,
    {
        let measurements = measurements(params);
        if measurements.is_empty() {
            return Err(ServiceError::NoParameters {
                provider: self.name.clone(),
            });
        }
        let query_params = self.translate_to_query_params(&measurements)?;
        let query_model = self.translate_to_query_model(model)?;

        let raw = call(self.provider.as_ref(), &query_params, query_model)?;
        debug!(
            "[{}] provider returned {} x {} frame",
            self.name,
            raw.height(),
            raw.width()
        );
        self.to_domain_frame(raw, &measurements)
    }

    /// Renames provider columns to domain names and puts the table in canonical shape.
    fn to_domain_frame(
        &self,
        mut raw: DataFrame,
        measurements: &[WeatherParam],
    ) -> Result<DataFrame, ServiceError> {
        let provider_names: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let domain = self.translate_to_domain_params(&provider_names)?;
        if !domain.contains(&WeatherParam::Timestamp) {
            return Err(ServiceError::MissingTimestamp {
                provider: self.name.clone(),
            });
        }
        raw.set_column_names(domain.iter().map(WeatherParam::as_str))?;

        let mut columns = vec![col(TIMESTAMP_COLUMN).cast(timestamp_dtype())];
        columns.extend(
            measurements
                .iter()
                .map(|param| col(param.as_str()).cast(DataType::Float64)),
        );
        let data = raw
            .lazy()
            .select(columns)
            .sort_by_exprs(
                [col(TIMESTAMP_COLUMN)],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(data)
    }

    fn translation_error(
        &self,
        value: &(impl fmt::Display + ?Sized),
        source: crate::mapping::error::MappingNotFoundError,
    ) -> TranslationError {
        TranslationError {
            provider: self.name.clone(),
            value: value.to_string(),
            source,
        }
    }
}

/// Requested measurements without the timestamp marker or repeats, in request order.
fn measurements(params: &[WeatherParam]) -> Vec<WeatherParam> {
    let mut unique = Vec::with_capacity(params.len());
    for param in params.iter().copied().filter(WeatherParam::is_measurement) {
        if !unique.contains(&param) {
            unique.push(param);
        }
    }
    unique
}
