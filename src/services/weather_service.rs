use crate::services::error::ServiceError;
use crate::services::external_service::ExternalForecastService;
use crate::types::location::Location;
use crate::types::time::IntoUtcDateTime;
use crate::types::weather_log::WeatherLog;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use log::info;

/// Fetches observed weather through a service whose provider keeps an archive, usually
/// [`ExternalForecastService::meteostat`].
#[derive(Debug)]
pub struct WeatherService {
    service: ExternalForecastService,
}

impl WeatherService {
    pub fn new(service: ExternalForecastService) -> Self {
        Self { service }
    }

    pub fn external_service(&self) -> &ExternalForecastService {
        &self.service
    }

    /// Observed values for `location` between `start` and `end`, tagged with the
    /// service's name as source. A bare date as `end` means midnight at its start.
    ///
    /// # Errors
    ///
    /// Any error of [`ExternalForecastService::get_historical_forecast`].
    pub fn get_weather_for_location(
        &self,
        location: &Location,
        start: impl IntoUtcDateTime,
        end: impl IntoUtcDateTime,
        params: &[WeatherParam],
    ) -> Result<WeatherLog, ServiceError> {
        let observed = self.service.get_historical_forecast(
            location,
            start.into_utc(),
            end.into_utc(),
            params,
            WeatherModel::Default,
        )?;
        info!(
            "[{}] {} observations for {}",
            self.service.name(),
            observed.data().height(),
            location
        );
        Ok(WeatherLog::new(
            location.clone(),
            self.service.name(),
            observed.data().clone(),
        ))
    }
}
