//! The registry of external services callers dispatch forecast requests through.

use crate::services::error::{ProviderNotFoundError, ServiceError};
use crate::services::external_service::ExternalForecastService;
use crate::types::forecast::Forecast;
use crate::types::location::Location;
use crate::types::time::IntoUtcDateTime;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use indexmap::IndexMap;
use log::{info, warn};

/// Aggregates named [`ExternalForecastService`]s behind one entry point.
///
/// The set of services is fixed at construction.
#[derive(Debug, Default)]
pub struct ForecastService {
    services: IndexMap<String, ExternalForecastService>,
}

impl ForecastService {
    /// Registers each service under its own name.
    ///
    /// When two services share a name, the later one replaces the earlier one at the
    /// earlier one's position.
    pub fn new(services: Vec<ExternalForecastService>) -> Self {
        let mut registry = IndexMap::with_capacity(services.len());
        for service in services {
            let name = service.name().to_string();
            if registry.insert(name.clone(), service).is_some() {
                warn!("External service '{}' registered twice, keeping the last one", name);
            }
        }
        info!(
            "Forecast service ready with providers: [{}]",
            registry.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Self { services: registry }
    }

    /// Looks up a registered service by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderNotFoundError`] naming `name` and listing the registered services.
    pub fn get_external_service(
        &self,
        name: &str,
    ) -> Result<&ExternalForecastService, ProviderNotFoundError> {
        self.services.get(name).ok_or_else(|| ProviderNotFoundError {
            name: name.to_string(),
            registered: self.external_service_names(),
        })
    }

    /// Names of the registered services in registration order.
    pub fn external_service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Fetches a forecast from the provider registered as `provider_name`.
    ///
    /// There is no fallback to other providers and no retry: whatever the selected
    /// provider fails with is returned.
    ///
    /// # Arguments
    ///
    /// * `location` - Where the forecast is for.
    /// * `params` - Requested measurements.
    /// * `target_timestamp` - The instant of interest; providers return its whole UTC day.
    ///   Naive values and dates are taken as UTC.
    /// * `model` - The forecast model to request.
    /// * `provider_name` - Name of a registered [`ExternalForecastService`].
    ///
    /// # Errors
    ///
    /// * [`ServiceError::ProviderNotFound`] if `provider_name` is not registered. Nothing
    ///   is sent over the network in that case.
    /// * Any error of [`ExternalForecastService::get_forecast`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chrono::Utc;
    /// use forecast_arbiter::{
    ///     ExternalForecastService, ForecastService, Location, OpenMeteoClient, WeatherModel,
    ///     WeatherParam,
    /// };
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = OpenMeteoClient::new("https://api.open-meteo.com")?;
    /// let service = ForecastService::new(vec![ExternalForecastService::open_meteo(client)]);
    ///
    /// let berlin = Location::new("Berlin", "13.405", "52.52");
    /// let forecast = service.get_forecast_for_location(
    ///     &berlin,
    ///     &[WeatherParam::Temperature, WeatherParam::WindSpeed],
    ///     Utc::now(),
    ///     WeatherModel::Icon,
    ///     "open_meteo",
    /// )?;
    /// println!("{}", forecast.data());
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_forecast_for_location(
        &self,
        location: &Location,
        params: &[WeatherParam],
        target_timestamp: impl IntoUtcDateTime,
        model: WeatherModel,
        provider_name: &str,
    ) -> Result<Forecast, ServiceError> {
        let service = self.get_external_service(provider_name)?;
        service.get_forecast(location, target_timestamp.into_utc(), params, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day_start, hourly_frame, scripted_service, ScriptedProvider};

    fn location() -> Location {
        Location::new("My location", "53.11", "21.37")
    }

    fn two_providers() -> (ForecastService, crate::testing::CallLog, crate::testing::CallLog) {
        let a = ScriptedProvider::returning(
            "A",
            hourly_frame("time", &[("temp", vec![Some(7.0), Some(8.0)])]),
        );
        let b = ScriptedProvider::returning(
            "B",
            hourly_frame("time", &[("temp", vec![Some(1.0), Some(2.0)])]),
        );
        let (calls_a, calls_b) = (a.calls(), b.calls());
        let service = ForecastService::new(vec![
            scripted_service("A", a),
            scripted_service("B", b),
        ]);
        (service, calls_a, calls_b)
    }

    #[test]
    fn test_dispatches_to_named_provider() {
        let (service, calls_a, calls_b) = two_providers();

        let forecast = service
            .get_forecast_for_location(
                &location(),
                &[WeatherParam::Temperature],
                day_start(),
                WeatherModel::Default,
                "A",
            )
            .unwrap();

        assert_eq!(forecast.location(), &location());
        assert!(forecast.data().column("temperature").is_ok());
        assert!(forecast.data().column("temp").is_err());
        assert_eq!(
            forecast.values(WeatherParam::Temperature).unwrap(),
            vec![Some(7.0), Some(8.0)]
        );
        assert_eq!(calls_a.borrow().len(), 1);
        assert!(calls_b.borrow().is_empty());
    }

    #[test]
    fn test_unknown_provider_fails_before_any_call() {
        let (service, calls_a, calls_b) = two_providers();

        let result = service.get_forecast_for_location(
            &location(),
            &[WeatherParam::Temperature],
            day_start(),
            WeatherModel::Default,
            "C",
        );

        match result {
            Err(ServiceError::ProviderNotFound(error)) => {
                assert_eq!(error.name, "C");
                assert_eq!(error.registered, ["A", "B"]);
                assert!(error.to_string().contains("'C'"));
            }
            other => panic!("expected ProviderNotFound, got {other:?}"),
        }
        assert!(calls_a.borrow().is_empty());
        assert!(calls_b.borrow().is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_last_registration() {
        let first = ScriptedProvider::failing("A");
        let second = ScriptedProvider::returning("A", hourly_frame("time", &[("temp", vec![Some(3.0)])]));
        let (first_calls, second_calls) = (first.calls(), second.calls());
        let service = ForecastService::new(vec![
            scripted_service("A", first),
            scripted_service("B", ScriptedProvider::failing("B")),
            scripted_service("A", second),
        ]);

        assert_eq!(service.external_service_names(), ["A", "B"]);
        service
            .get_forecast_for_location(
                &location(),
                &[WeatherParam::Temperature],
                day_start(),
                WeatherModel::Default,
                "A",
            )
            .unwrap();
        assert!(first_calls.borrow().is_empty());
        assert_eq!(second_calls.borrow().len(), 1);
    }

    #[test]
    fn test_local_target_is_converted_to_utc() {
        let (service, calls_a, _) = two_providers();
        let in_warsaw = chrono::DateTime::parse_from_rfc3339("2024-04-05T01:30:00+02:00").unwrap();

        service
            .get_forecast_for_location(
                &location(),
                &[WeatherParam::Temperature],
                in_warsaw,
                WeatherModel::Default,
                "A",
            )
            .unwrap();
        service
            .get_forecast_for_location(
                &location(),
                &[WeatherParam::Temperature],
                day_start().date_naive(),
                WeatherModel::Default,
                "A",
            )
            .unwrap();

        let calls = calls_a.borrow();
        assert_eq!(calls[0].window.0, day_start() - chrono::Duration::minutes(30));
        assert_eq!(calls[1].window.0, day_start());
    }

    #[test]
    fn test_empty_registry() {
        let service = ForecastService::default();
        assert!(service.external_service_names().is_empty());
        assert!(service.get_external_service("open_meteo").is_err());
    }
}
