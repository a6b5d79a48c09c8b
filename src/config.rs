//! Environment-driven provider settings.

use crate::providers::error::ExternalCallError;
use crate::providers::meteomatics::{self, MeteomaticsClient};
use crate::providers::meteostat::MeteostatClient;
use crate::providers::open_meteo::{self, OpenMeteoClient};
use crate::repository::error::RepositoryError;
use crate::repository::file_repository::FileForecastRepository;
use crate::services::external_service::ExternalForecastService;
use crate::services::forecast_service::ForecastService;
use crate::services::weather_service::WeatherService;
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const OPENMETEO_API_URL_ENV: &str = "OPENMETEO_API_URL";
pub const METEOMATICS_API_URL_ENV: &str = "METEOMATICS_API_URL";
pub const METEOMATICS_USER_ENV: &str = "METEOMATICS_USER";
pub const METEOMATICS_PASSWORD_ENV: &str = "METEOMATICS_PASSWORD";
pub const FORECAST_STORAGE_DIR_ENV: &str = "FORECAST_STORAGE_DIR";
pub const FORECAST_HTTP_TIMEOUT_SECS_ENV: &str = "FORECAST_HTTP_TIMEOUT_SECS";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct MeteomaticsCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for MeteomaticsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeteomaticsCredentials")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Where the providers live and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidersConfig {
    pub open_meteo_url: String,
    pub meteomatics_url: String,
    /// Meteomatics is only registered when credentials are configured.
    pub meteomatics_credentials: Option<MeteomaticsCredentials>,
    /// Repository directory; the platform data directory when unset.
    pub storage_dir: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self::from_pairs(Vec::<(String, String)>::new())
    }
}

impl ProvidersConfig {
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let meteomatics_credentials = match (
            non_empty(&map, METEOMATICS_USER_ENV),
            non_empty(&map, METEOMATICS_PASSWORD_ENV),
        ) {
            (Some(user), Some(password)) => Some(MeteomaticsCredentials {
                user: user.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        };

        Self {
            open_meteo_url: non_empty(&map, OPENMETEO_API_URL_ENV)
                .unwrap_or(open_meteo::DEFAULT_BASE_URL)
                .to_string(),
            meteomatics_url: non_empty(&map, METEOMATICS_API_URL_ENV)
                .unwrap_or(meteomatics::DEFAULT_BASE_URL)
                .to_string(),
            meteomatics_credentials,
            storage_dir: non_empty(&map, FORECAST_STORAGE_DIR_ENV).map(PathBuf::from),
            http_timeout: Duration::from_secs(
                non_empty(&map, FORECAST_HTTP_TIMEOUT_SECS_ENV)
                    .and_then(|value| value.parse::<u64>().ok())
                    .filter(|value| *value > 0)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        }
    }

    /// The external forecast services this configuration enables, Open-Meteo first.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be built.
    pub fn external_services(&self) -> Result<Vec<ExternalForecastService>, ExternalCallError> {
        let mut services = vec![ExternalForecastService::open_meteo(
            OpenMeteoClient::with_timeout(&self.open_meteo_url, self.http_timeout)?,
        )];
        if let Some(credentials) = &self.meteomatics_credentials {
            services.push(ExternalForecastService::meteomatics(
                MeteomaticsClient::with_timeout(
                    &self.meteomatics_url,
                    &credentials.user,
                    &credentials.password,
                    self.http_timeout,
                )?,
            ));
        } else {
            info!("Meteomatics credentials not set, provider not registered");
        }
        Ok(services)
    }

    /// A [`ForecastService`] with every configured forecast provider registered.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be built.
    pub fn forecast_service(&self) -> Result<ForecastService, ExternalCallError> {
        Ok(ForecastService::new(self.external_services()?))
    }

    /// A [`WeatherService`] backed by Meteostat station observations.
    ///
    /// # Errors
    ///
    /// Fails if the Meteostat station list cannot be downloaded.
    pub fn weather_service(&self) -> Result<WeatherService, ExternalCallError> {
        let client = MeteostatClient::with_timeout(self.http_timeout)?;
        Ok(WeatherService::new(ExternalForecastService::meteostat(client)))
    }

    /// # Errors
    ///
    /// [`RepositoryError::StorageDirResolution`] if no directory is configured and the
    /// platform has no data directory.
    pub fn repository(&self) -> Result<FileForecastRepository, RepositoryError> {
        match &self.storage_dir {
            Some(dir) => Ok(FileForecastRepository::new(dir)),
            None => FileForecastRepository::with_default_dir(),
        }
    }
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
