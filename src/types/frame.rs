//! Small helpers shared by every component that builds or reads weather tables.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

pub(crate) const TIMESTAMP_COLUMN: &str = "timestamp";
pub(crate) const TYPE_COLUMN: &str = "type";
pub(crate) const TIME_UNIT: TimeUnit = TimeUnit::Milliseconds;

/// Naive (UTC) datetime in millisecond precision, the dtype of every time column.
pub(crate) fn timestamp_dtype() -> DataType {
    DataType::Datetime(TIME_UNIT, None)
}

/// Builds a frame with a datetime column named `time_column` followed by one `f64`
/// column per entry in `series`.
pub(crate) fn series_frame(
    time_column: &str,
    times: Vec<Option<NaiveDateTime>>,
    series: Vec<(String, Vec<Option<f64>>)>,
) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(series.len() + 1);
    let time =
        DatetimeChunked::from_naive_datetime_options(time_column.into(), times, TIME_UNIT);
    columns.push(Column::from(time.into_series()));
    for (name, values) in series {
        columns.push(Column::from(Series::new(name.as_str().into(), values)));
    }
    DataFrame::new(columns)
}

/// Reads a datetime column back as naive UTC values.
pub(crate) fn naive_timestamps(
    df: &DataFrame,
    column: &str,
) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let casted = df.column(column)?.cast(&timestamp_dtype())?;
    let millis = casted.datetime()?;
    Ok(millis
        .into_iter()
        .map(|ms| ms.and_then(DateTime::from_timestamp_millis).map(|dt| dt.naive_utc()))
        .collect())
}

/// Reads any numeric column as `f64` values.
pub(crate) fn float_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    let casted = df.column(column)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}
