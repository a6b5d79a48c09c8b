//! Scoring forecast models against what was actually observed.

use crate::analysis::error::AnalysisError;
use crate::types::forecast::Forecast;
use crate::types::frame::{float_values, timestamp_dtype, TIMESTAMP_COLUMN};
use crate::types::weather_log::WeatherLog;
use crate::types::weather_param::{WeatherModel, WeatherParam};
use log::{debug, warn};
use ordered_float::OrderedFloat;
use polars::prelude::*;
use std::collections::BTreeMap;

const PREDICTED: &str = "predicted";
const OBSERVED: &str = "observed";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ErrorSum {
    total: f64,
    samples: usize,
}

impl ErrorSum {
    fn add(&mut self, other: ErrorSum) {
        self.total += other.total;
        self.samples += other.samples;
    }
}

/// Forecasts are scored per model and per producing service, so the same model offered
/// by two providers is never pooled.
type ScoreKey = (WeatherModel, Option<String>);

/// Accuracy of one (provider, model) pair over everything analyzed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    /// The service the forecasts came from, `None` for untagged forecasts.
    pub provider: Option<String>,
    pub model: WeatherModel,
    /// Mean of the absolute errors of all compared values, pooled over parameters.
    pub mean_absolute_error: f64,
    /// Number of compared (forecast, observation) value pairs.
    pub samples: usize,
}

/// Compares forecasts with a weather log and picks the most accurate model.
///
/// Values are compared where the forecast and the log share a parameter column and an
/// exact timestamp, and both values are present. Errors are absolute differences, except
/// for wind direction where the shorter way around the circle is used. Errors are kept
/// apart per [`Forecast::provider`] and [`Forecast::weather_model`]. Repeated calls to
/// [`ForecastAnalyzer::analyze`] keep accumulating.
#[derive(Debug, Clone, Default)]
pub struct ForecastAnalyzer {
    forecasts: Vec<Forecast>,
    errors: BTreeMap<ScoreKey, ErrorSum>,
}

impl ForecastAnalyzer {
    pub fn new(forecasts: Vec<Forecast>) -> Self {
        Self {
            forecasts,
            errors: BTreeMap::new(),
        }
    }

    /// The forecasts this analyzer was built with.
    pub fn forecasts(&self) -> &[Forecast] {
        &self.forecasts
    }

    /// Accumulates the errors of `forecasts` against `weather_log`.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::LocationMismatch`] if any forecast is for another location than
    ///   the log. Nothing is accumulated in that case.
    /// * [`AnalysisError::Frame`] if a table lacks a usable `"timestamp"` column.
    pub fn analyze(
        &mut self,
        forecasts: &[Forecast],
        weather_log: &WeatherLog,
    ) -> Result<(), AnalysisError> {
        if let Some(stray) = forecasts
            .iter()
            .find(|forecast| forecast.location() != weather_log.location())
        {
            return Err(AnalysisError::LocationMismatch {
                forecast: stray.location().to_string(),
                log: weather_log.location().to_string(),
            });
        }

        let mut pending = Vec::with_capacity(forecasts.len());
        for forecast in forecasts {
            let errors = forecast_errors(forecast, weather_log)?;
            if errors.samples == 0 {
                warn!(
                    "Forecast ({} model from {}, valid at {}) has no values overlapping the weather log from {}",
                    forecast.weather_model(),
                    forecast.provider().unwrap_or("an unknown provider"),
                    forecast.valid_at(),
                    weather_log.source()
                );
                continue;
            }
            debug!(
                "{} model from {:?}: {} samples, total absolute error {:.3}",
                forecast.weather_model(),
                forecast.provider(),
                errors.samples,
                errors.total
            );
            let key = (
                forecast.weather_model(),
                forecast.provider().map(str::to_string),
            );
            pending.push((key, errors));
        }

        for (key, errors) in pending {
            self.errors.entry(key).or_default().add(errors);
        }
        Ok(())
    }

    /// Runs [`ForecastAnalyzer::analyze`] over the forecasts held by this analyzer.
    ///
    /// # Errors
    ///
    /// As for [`ForecastAnalyzer::analyze`].
    pub fn analyze_held(&mut self, weather_log: &WeatherLog) -> Result<(), AnalysisError> {
        let forecasts = std::mem::take(&mut self.forecasts);
        let result = self.analyze(&forecasts, weather_log);
        self.forecasts = forecasts;
        result
    }

    /// Scores of every analyzed (provider, model) pair, most accurate first.
    ///
    /// Equal errors are ordered by model declaration order, then by provider name.
    pub fn scores(&self) -> Vec<ModelScore> {
        let mut scores: Vec<ModelScore> = self
            .errors
            .iter()
            .filter(|(_, errors)| errors.samples > 0)
            .map(|((model, provider), errors)| ModelScore {
                provider: provider.clone(),
                model: *model,
                mean_absolute_error: errors.total / errors.samples as f64,
                samples: errors.samples,
            })
            .collect();
        scores.sort_by(|a, b| {
            OrderedFloat(a.mean_absolute_error)
                .cmp(&OrderedFloat(b.mean_absolute_error))
                .then(a.model.cmp(&b.model))
                .then_with(|| a.provider.cmp(&b.provider))
        });
        scores
    }

    /// The most accurate (provider, model) pair.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NothingAnalyzed`] if no value has been compared yet.
    pub fn get_winning_score(&self) -> Result<ModelScore, AnalysisError> {
        self.scores()
            .into_iter()
            .next()
            .ok_or(AnalysisError::NothingAnalyzed)
    }

    /// The model of [`ForecastAnalyzer::get_winning_score`]. On a tie the model declared
    /// first in [`WeatherModel`] wins.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NothingAnalyzed`] if no value has been compared yet.
    pub fn get_winning_weather_model(&self) -> Result<WeatherModel, AnalysisError> {
        self.get_winning_score().map(|score| score.model)
    }
}

fn forecast_errors(forecast: &Forecast, weather_log: &WeatherLog) -> PolarsResult<ErrorSum> {
    let observed_params: Vec<WeatherParam> = weather_log
        .data()
        .get_column_names()
        .iter()
        .filter_map(|name| WeatherParam::from_name(name.as_str()))
        .collect();

    let mut sum = ErrorSum::default();
    for param in forecast
        .params()
        .into_iter()
        .filter(|param| observed_params.contains(param))
    {
        sum.add(param_errors(forecast.data(), weather_log.data(), param)?);
    }
    Ok(sum)
}

/// Inner-joins both tables on the exact timestamp and sums the absolute errors of
/// `param` over rows where both values are present.
fn param_errors(
    predicted: &DataFrame,
    observed: &DataFrame,
    param: WeatherParam,
) -> PolarsResult<ErrorSum> {
    let side = |df: &DataFrame, alias: &str| {
        df.clone().lazy().select([
            col(TIMESTAMP_COLUMN).cast(timestamp_dtype()),
            col(param.as_str()).cast(DataType::Float64).alias(alias),
        ])
    };
    let joined = side(predicted, PREDICTED)
        .join(
            side(observed, OBSERVED),
            [col(TIMESTAMP_COLUMN)],
            [col(TIMESTAMP_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    let pairs = float_values(&joined, PREDICTED)?
        .into_iter()
        .zip(float_values(&joined, OBSERVED)?)
        .filter_map(|(p, o)| Some(absolute_error(param, p?, o?)));

    let mut sum = ErrorSum::default();
    for error in pairs {
        sum.total += error;
        sum.samples += 1;
    }
    Ok(sum)
}

fn absolute_error(param: WeatherParam, predicted: f64, observed: f64) -> f64 {
    let difference = (predicted - observed).abs();
    if param.is_angular() {
        let difference = difference.rem_euclid(360.0);
        difference.min(360.0 - difference)
    } else {
        difference
    }
}
