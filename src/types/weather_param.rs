//! Defines the closed domain vocabulary: which quantities can be requested and which
//! forecast models can produce them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A measurable weather quantity, independent of any provider's naming.
///
/// Providers never see these values directly: each external service translates them
/// through its own [`crate::BiMap`], so a parameter a provider does not support fails
/// loudly instead of producing a wrong query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherParam {
    /// Marker for the time index column of every weather table.
    Timestamp,
    /// Air temperature 2 m above ground, °C.
    Temperature,
    /// Wind speed 10 m above ground, km/h.
    WindSpeed,
    /// Wind direction 10 m above ground, degrees.
    WindDirection,
    /// Peak wind gust, km/h.
    WindGusts,
}

impl WeatherParam {
    pub const ALL: [WeatherParam; 5] = [
        WeatherParam::Timestamp,
        WeatherParam::Temperature,
        WeatherParam::WindSpeed,
        WeatherParam::WindDirection,
        WeatherParam::WindGusts,
    ];

    /// The domain name, which is also the column name in every domain table.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherParam::Timestamp => "timestamp",
            WeatherParam::Temperature => "temperature",
            WeatherParam::WindSpeed => "wind_speed",
            WeatherParam::WindDirection => "wind_direction",
            WeatherParam::WindGusts => "wind_gusts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.as_str() == name)
    }

    /// Whether the parameter is an actual measurement rather than the time index.
    pub fn is_measurement(&self) -> bool {
        !matches!(self, WeatherParam::Timestamp)
    }

    /// Values are angles in degrees, so differences wrap around at 360.
    pub fn is_angular(&self) -> bool {
        matches!(self, WeatherParam::WindDirection)
    }
}

/// Allows formatting a `WeatherParam` using its domain name.
///
/// # Examples
///
/// ```
/// use forecast_arbiter::WeatherParam;
///
/// assert_eq!(WeatherParam::WindGusts.to_string(), "wind_gusts");
/// ```
impl fmt::Display for WeatherParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A forecast model that can be selected per request.
///
/// The declaration order doubles as the tie-break order when two models score
/// equally in [`crate::ForecastAnalyzer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherModel {
    /// The provider's default (usually blended) model.
    Default,
    /// DWD ICON.
    Icon,
}

impl WeatherModel {
    pub const ALL: [WeatherModel; 2] = [WeatherModel::Default, WeatherModel::Icon];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherModel::Default => "default",
            WeatherModel::Icon => "icon",
        }
    }
}

impl fmt::Display for WeatherModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for param in WeatherParam::ALL {
            assert_eq!(WeatherParam::from_name(param.as_str()), Some(param));
        }
        assert_eq!(WeatherParam::from_name("temperature_2m"), None);
    }

    #[test]
    fn test_only_timestamp_is_not_a_measurement() {
        let measurements: Vec<_> = WeatherParam::ALL
            .into_iter()
            .filter(WeatherParam::is_measurement)
            .collect();
        assert_eq!(measurements.len(), 4);
        assert!(!measurements.contains(&WeatherParam::Timestamp));
    }

    #[test]
    fn test_model_order_is_declaration_order() {
        assert!(WeatherModel::Default < WeatherModel::Icon);
    }
}
