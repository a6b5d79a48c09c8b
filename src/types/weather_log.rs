//! Observed weather and the combination of weather tables.

use crate::types::error::DomainError;
use crate::types::forecast::Forecast;
use crate::types::frame::{timestamp_dtype, TIMESTAMP_COLUMN, TYPE_COLUMN};
use crate::types::location::Location;
use polars::prelude::*;
use std::fmt;

/// Whether a table holds predicted or observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Forecast,
    Observation,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Forecast => "forecast",
            DataKind::Observation => "observation",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything holding a timestamp-keyed weather table for one location.
pub trait WeatherTable {
    fn location(&self) -> &Location;
    fn data(&self) -> &DataFrame;
    fn kind(&self) -> DataKind;
}

impl WeatherTable for Forecast {
    fn location(&self) -> &Location {
        Forecast::location(self)
    }

    fn data(&self) -> &DataFrame {
        Forecast::data(self)
    }

    fn kind(&self) -> DataKind {
        DataKind::Forecast
    }
}

/// Observed readings for a location, tagged with where they came from.
#[derive(Debug, Clone)]
pub struct WeatherLog {
    location: Location,
    source: String,
    data: DataFrame,
}

impl WeatherLog {
    pub fn new(location: Location, source: impl Into<String>, data: DataFrame) -> Self {
        Self {
            location,
            source: source.into(),
            data,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Name of the service the readings were fetched from, `"a+b"` after a merge.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Concatenates two logs of the same location into one, sorted by timestamp.
    ///
    /// # Errors
    ///
    /// [`DomainError::LocationMismatch`] if the logs belong to different locations.
    pub fn merge(&self, other: &WeatherLog) -> Result<WeatherLog, DomainError> {
        let combined = combine(self, other)?;
        Ok(WeatherLog {
            location: combined.location,
            source: format!("{}+{}", self.source, other.source),
            data: combined.data,
        })
    }

    /// Combines the observations with a forecast; each row is tagged in a `"type"`
    /// column as `"observation"` or `"forecast"`.
    ///
    /// # Errors
    ///
    /// [`DomainError::LocationMismatch`] if the forecast is for another location.
    pub fn with_forecast(&self, forecast: &Forecast) -> Result<WeatherData, DomainError> {
        combine(self, forecast)
    }
}

impl WeatherTable for WeatherLog {
    fn location(&self) -> &Location {
        &self.location
    }

    fn data(&self) -> &DataFrame {
        &self.data
    }

    fn kind(&self) -> DataKind {
        DataKind::Observation
    }
}

/// The result of combining two weather tables of the same location.
#[derive(Debug, Clone)]
pub struct WeatherData {
    location: Location,
    data: DataFrame,
}

impl WeatherData {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }
}

/// Concatenates two weather tables of the same location.
///
/// Columns missing on one side are filled with nulls and the result is sorted by
/// timestamp. When the tables are of different [`DataKind`]s, a `"type"` column records
/// which side each row came from.
///
/// # Errors
///
/// * [`DomainError::LocationMismatch`] if the locations differ.
/// * [`DomainError::Frame`] if a table lacks a usable `"timestamp"` column.
pub fn combine<A, B>(left: &A, right: &B) -> Result<WeatherData, DomainError>
where
    A: WeatherTable + ?Sized,
    B: WeatherTable + ?Sized,
{
    if left.location() != right.location() {
        return Err(DomainError::LocationMismatch {
            left: left.location().to_string(),
            right: right.location().to_string(),
        });
    }

    let tag = left.kind() != right.kind();
    let data = concat_lf_diagonal(
        [
            prepare(left.data(), left.kind(), tag),
            prepare(right.data(), right.kind(), tag),
        ],
        UnionArgs::default(),
    )?
    .sort_by_exprs(
        [col(TIMESTAMP_COLUMN)],
        SortMultipleOptions::default().with_maintain_order(true),
    )
    .collect()?;

    Ok(WeatherData {
        location: left.location().clone(),
        data,
    })
}

fn prepare(data: &DataFrame, kind: DataKind, tag: bool) -> LazyFrame {
    let frame = data
        .clone()
        .lazy()
        .with_column(col(TIMESTAMP_COLUMN).cast(timestamp_dtype()));
    if tag {
        frame.with_column(lit(kind.as_str()).alias(TYPE_COLUMN))
    } else {
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::frame::{naive_timestamps, series_frame};
    use crate::types::weather_param::WeatherModel;
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 5)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn table(hours: &[u32], column: &str, values: Vec<Option<f64>>) -> DataFrame {
        series_frame(
            TIMESTAMP_COLUMN,
            hours.iter().map(|h| Some(at(*h))).collect(),
            vec![(column.to_string(), values)],
        )
        .unwrap()
    }

    fn berlin() -> Location {
        Location::new("Berlin", "13.4", "52.5")
    }

    #[test]
    fn test_merge_logs_sorts_and_joins_sources() {
        let a = WeatherLog::new(berlin(), "meteostat", table(&[2, 0], "temperature", vec![Some(3.0), Some(1.0)]));
        let b = WeatherLog::new(berlin(), "station", table(&[1], "wind_speed", vec![Some(9.0)]));

        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.source(), "meteostat+station");
        assert_eq!(merged.data().height(), 3);
        assert!(merged.data().column(TYPE_COLUMN).is_err());
        assert_eq!(
            naive_timestamps(merged.data(), TIMESTAMP_COLUMN).unwrap(),
            vec![Some(at(0)), Some(at(1)), Some(at(2))]
        );
        // Filled with nulls where the other log had no such column.
        assert_eq!(merged.data().column("wind_speed").unwrap().null_count(), 2);
    }

    #[test]
    fn test_forecast_and_log_are_tagged() {
        let created = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        let forecast = Forecast::new(
            created,
            created,
            table(&[0, 1], "temperature", vec![Some(1.0), Some(2.0)]),
            berlin(),
            WeatherModel::Default,
        );
        let log = WeatherLog::new(berlin(), "meteostat", table(&[0], "temperature", vec![Some(1.5)]));

        let combined = log.with_forecast(&forecast).unwrap();
        let types: Vec<Option<&str>> = combined
            .data()
            .column(TYPE_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(types, vec![Some("observation"), Some("forecast"), Some("forecast")]);
    }

    #[test]
    fn test_different_locations_do_not_combine() {
        let a = WeatherLog::new(berlin(), "meteostat", table(&[0], "temperature", vec![Some(1.0)]));
        let b = WeatherLog::new(
            Location::new("Warsaw", "21.0", "52.2"),
            "meteostat",
            table(&[0], "temperature", vec![Some(1.0)]),
        );

        assert!(matches!(
            a.merge(&b),
            Err(DomainError::LocationMismatch { .. })
        ));
    }
}
