mod analysis;
mod config;
mod error;
mod mapping;
mod providers;
mod repository;
mod services;
#[cfg(test)]
mod testing;
mod types;

pub use error::ArbiterError;

pub use mapping::bijective_map::{Backward, BiMap};
pub use mapping::error::MappingNotFoundError;

pub use types::error::DomainError;
pub use types::forecast::Forecast;
pub use types::location::{LatLon, Location};
pub use types::time::IntoUtcDateTime;
pub use types::weather_log::{combine, DataKind, WeatherData, WeatherLog, WeatherTable};
pub use types::weather_param::{WeatherModel, WeatherParam};

pub use providers::error::ExternalCallError;
pub use providers::meteomatics::MeteomaticsClient;
pub use providers::meteostat::MeteostatClient;
pub use providers::open_meteo::OpenMeteoClient;
pub use providers::station::{Station, StationIndex, StationLocation};
pub use providers::ForecastProvider;
// Provider names, base URLs and column names.
pub use providers::{meteomatics, meteostat, open_meteo};

pub use services::error::{ProviderNotFoundError, ServiceError, TranslationError};
pub use services::external_service::ExternalForecastService;
pub use services::forecast_service::ForecastService;
pub use services::weather_service::WeatherService;

pub use analysis::analyzer::{ForecastAnalyzer, ModelScore};
pub use analysis::error::AnalysisError;
pub use analysis::sources::{get_forecasts, ForecastSource};

pub use repository::error::RepositoryError;
pub use repository::file_repository::FileForecastRepository;

pub use config::{
    MeteomaticsCredentials, ProvidersConfig, DEFAULT_HTTP_TIMEOUT_SECS,
    FORECAST_HTTP_TIMEOUT_SECS_ENV, FORECAST_STORAGE_DIR_ENV, METEOMATICS_API_URL_ENV,
    METEOMATICS_PASSWORD_ENV, METEOMATICS_USER_ENV, OPENMETEO_API_URL_ENV,
};
