//! Gathering the forecasts an analysis compares.

use crate::analysis::analyzer::ForecastAnalyzer;
use crate::services::error::ServiceError;
use crate::services::forecast_service::ForecastService;
use crate::types::forecast::Forecast;
use crate::types::location::Location;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use bon::bon;
use chrono::{DateTime, Utc};
use log::info;

/// A registered provider together with the model to request from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForecastSource {
    pub provider_name: String,
    pub model: WeatherModel,
}

impl ForecastSource {
    pub fn new(provider_name: impl Into<String>, model: WeatherModel) -> Self {
        Self {
            provider_name: provider_name.into(),
            model,
        }
    }
}

/// Fetches one forecast per source, in source order.
///
/// # Errors
///
/// Stops at the first source that fails and returns its error.
pub fn get_forecasts(
    service: &ForecastService,
    sources: &[ForecastSource],
    params: &[WeatherParam],
    location: &Location,
    target_timestamp: DateTime<Utc>,
) -> Result<Vec<Forecast>, ServiceError> {
    sources
        .iter()
        .map(|source| {
            service.get_forecast_for_location(
                location,
                params,
                target_timestamp,
                source.model,
                &source.provider_name,
            )
        })
        .collect()
}

#[bon]
impl ForecastAnalyzer {
    /// Builds an analyzer holding one forecast per source.
    ///
    /// # Arguments
    ///
    /// * `service` - The aggregation service the sources are registered in.
    /// * `sources` - Which (provider, model) pairs to compare.
    /// * `params` - Measurements to request from every source.
    /// * `location` - Where the forecasts are for.
    /// * `target_timestamp` - Optional. Defaults to now.
    ///
    /// # Errors
    ///
    /// Any error of [`get_forecasts`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use forecast_arbiter::{
    ///     open_meteo, ExternalForecastService, ForecastAnalyzer, ForecastService,
    ///     ForecastSource, Location, OpenMeteoClient, WeatherModel, WeatherParam,
    /// };
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = OpenMeteoClient::new(open_meteo::DEFAULT_BASE_URL)?;
    /// let service = ForecastService::new(vec![ExternalForecastService::open_meteo(client)]);
    ///
    /// let analyzer = ForecastAnalyzer::from_sources()
    ///     .service(&service)
    ///     .sources(&[
    ///         ForecastSource::new(open_meteo::PROVIDER_NAME, WeatherModel::Default),
    ///         ForecastSource::new(open_meteo::PROVIDER_NAME, WeatherModel::Icon),
    ///     ])
    ///     .params(&[WeatherParam::Temperature])
    ///     .location(&Location::new("Berlin", "13.405", "52.52"))
    ///     .call()?;
    /// assert_eq!(analyzer.forecasts().len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn from_sources(
        service: &ForecastService,
        sources: &[ForecastSource],
        params: &[WeatherParam],
        location: &Location,
        target_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, ServiceError> {
        let target_timestamp = target_timestamp.unwrap_or_else(Utc::now);
        let forecasts = get_forecasts(service, sources, params, location, target_timestamp)?;
        info!(
            "Gathered {} forecasts for {} to analyze",
            forecasts.len(),
            location
        );
        Ok(Self::new(forecasts))
    }
}
