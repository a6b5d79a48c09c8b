pub mod error;
pub mod forecast;
pub(crate) mod frame;
pub mod location;
pub mod time;
pub mod weather_log;
pub mod weather_param;
