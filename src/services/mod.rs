pub mod error;
pub mod external_service;
pub mod forecast_service;
pub mod weather_service;
