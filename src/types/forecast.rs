use crate::types::frame::{float_values, naive_timestamps, TIMESTAMP_COLUMN};
use crate::types::location::Location;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;

/// A provider's prediction for one location, normalized to domain column names.
///
/// The table holds a `"timestamp"` column (naive UTC, millisecond precision) and one
/// `f64` column per requested [`WeatherParam`]. A forecast is immutable once built; the
/// repository hands out a new value carrying the assigned id instead of mutating it.
#[derive(Debug, Clone)]
pub struct Forecast {
    id: Option<u64>,
    created_at: DateTime<Utc>,
    valid_at: DateTime<Utc>,
    data: DataFrame,
    location: Location,
    weather_model: WeatherModel,
    provider: Option<String>,
}

impl Forecast {
    pub fn new(
        created_at: DateTime<Utc>,
        valid_at: DateTime<Utc>,
        data: DataFrame,
        location: Location,
        weather_model: WeatherModel,
    ) -> Self {
        Self {
            id: None,
            created_at,
            valid_at,
            data,
            location,
            weather_model,
            provider: None,
        }
    }

    /// Tags the forecast with the name of the service that produced it.
    pub fn with_provider(self, provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..self
        }
    }

    pub(crate) fn with_id(self, id: u64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Identifier assigned on persistence, `None` until then.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn valid_at(&self) -> DateTime<Utc> {
        self.valid_at
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn weather_model(&self) -> WeatherModel {
        self.weather_model
    }

    /// Name of the service the forecast came from, if known.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Measurement parameters present as columns, in column order.
    pub fn params(&self) -> Vec<WeatherParam> {
        self.data
            .get_column_names()
            .iter()
            .filter_map(|name| WeatherParam::from_name(name.as_str()))
            .filter(WeatherParam::is_measurement)
            .collect()
    }

    /// # Errors
    ///
    /// Fails if the table has no usable `"timestamp"` column.
    pub fn timestamps(&self) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
        naive_timestamps(&self.data, TIMESTAMP_COLUMN)
    }

    /// Values of one parameter, row-aligned with [`Forecast::timestamps`].
    ///
    /// # Errors
    ///
    /// Fails with a column-not-found error when the parameter was not requested.
    pub fn values(&self, param: WeatherParam) -> PolarsResult<Vec<Option<f64>>> {
        float_values(&self.data, param.as_str())
    }

    /// Compares id, timestamps, location and table contents, treating nulls as equal
    /// to nulls. Weather model and provider do not take part.
    pub fn structurally_eq(&self, other: &Forecast) -> bool {
        self.id == other.id
            && self.created_at == other.created_at
            && self.valid_at == other.valid_at
            && self.location == other.location
            && self.data.equals_missing(&other.data)
    }
}

impl PartialEq for Forecast {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::frame::series_frame;
    use chrono::TimeZone;

    fn sample(location: Location, temperatures: Vec<Option<f64>>) -> Forecast {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        let times = (0..temperatures.len() as i64)
            .map(|h| Some((start + chrono::Duration::hours(h)).naive_utc()))
            .collect();
        let data = series_frame(
            TIMESTAMP_COLUMN,
            times,
            vec![("temperature".to_string(), temperatures)],
        )
        .unwrap();
        Forecast::new(start, start, data, location, WeatherModel::Default)
    }

    #[test]
    fn test_equality_treats_nulls_as_equal() {
        let berlin = Location::new("Berlin", "13.4", "52.5");
        let a = sample(berlin.clone(), vec![Some(1.0), None]);
        let b = sample(berlin.clone(), vec![Some(1.0), None]);
        let c = sample(berlin, vec![Some(1.0), Some(2.0)]);

        assert!(a.structurally_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_equality_ignores_model_but_not_id() {
        let berlin = Location::new("Berlin", "13.4", "52.5");
        let a = sample(berlin.clone(), vec![Some(1.0)]);
        let mut icon = sample(berlin, vec![Some(1.0)]);
        icon.weather_model = WeatherModel::Icon;

        assert_eq!(a, icon);
        assert_ne!(a.clone().with_id(1), a);
        assert_eq!(a.clone().with_id(1), icon.with_id(1));
    }

    #[test]
    fn test_provider_tag() {
        let berlin = Location::new("Berlin", "13.4", "52.5");
        let plain = sample(berlin, vec![Some(1.0)]);
        let tagged = plain.clone().with_provider("open_meteo");

        assert_eq!(plain.provider(), None);
        assert_eq!(tagged.provider(), Some("open_meteo"));
        assert_eq!(plain, tagged);
    }

    #[test]
    fn test_params_and_values() {
        let forecast = sample(Location::new("Berlin", "13.4", "52.5"), vec![Some(3.5), Some(4.0)]);

        assert_eq!(forecast.params(), vec![WeatherParam::Temperature]);
        assert_eq!(
            forecast.values(WeatherParam::Temperature).unwrap(),
            vec![Some(3.5), Some(4.0)]
        );
        assert_eq!(forecast.timestamps().unwrap().len(), 2);
        assert!(forecast.values(WeatherParam::WindGusts).is_err());
    }
}
