//! File-backed storage of forecasts.

use crate::repository::error::RepositoryError;
use crate::types::forecast::Forecast;
use crate::types::location::Location;
use crate::types::weather_param::WeatherModel;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Utc};
use dirs::data_dir;
use log::info;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "forecast_arbiter";
const FORECASTS_DIR_NAME: &str = "forecasts";
const FILE_PREFIX: &str = "forecast_";
const FILE_EXTENSION: &str = "bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Serialize, Deserialize)]
struct ForecastRecord {
    id: u64,
    created_at: DateTime<Utc>,
    valid_at: DateTime<Utc>,
    location: Location,
    weather_model: WeatherModel,
    provider: Option<String>,
    /// Parquet encoding of the forecast table.
    data: Vec<u8>,
}

/// Stores each forecast as `forecast_<id>.bin` in one directory.
///
/// Ids start at 1 and grow by one per save: the next id is one above the largest id on
/// disk, so ids of deleted files are not reused unless they were the largest. Meant for
/// a single writer; concurrent writers may race for the same id, in which case the
/// loser's save fails instead of overwriting.
#[derive(Debug, Clone)]
pub struct FileForecastRepository {
    base_dir: PathBuf,
}

impl FileForecastRepository {
    /// Uses `base_dir`, which is created on first save if missing.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Uses `forecast_arbiter/forecasts` inside the platform data directory.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::StorageDirResolution`] if the platform has no data directory.
    pub fn with_default_dir() -> Result<Self, RepositoryError> {
        data_dir()
            .map(|dir| Self::new(dir.join(APP_DIR_NAME).join(FORECASTS_DIR_NAME)))
            .ok_or(RepositoryError::StorageDirResolution)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.base_dir
            .join(format!("{FILE_PREFIX}{id}.{FILE_EXTENSION}"))
    }

    /// The id the next saved forecast will get.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::ListDir`] if the directory exists but cannot be listed.
    pub fn next_id(&self) -> Result<u64, RepositoryError> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(RepositoryError::ListDir(self.base_dir.clone(), e)),
        };

        let mut max_id = 0;
        for entry in entries {
            let entry = entry.map_err(|e| RepositoryError::ListDir(self.base_dir.clone(), e))?;
            if let Some(id) = entry.file_name().to_str().and_then(parse_id) {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id + 1)
    }

    /// Persists `forecast` under a fresh id and returns a copy carrying that id.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::DuplicateIdentifier`] if `forecast` already has an id.
    /// * I/O, encoding and Parquet errors while writing.
    pub fn save_forecast(&self, forecast: &Forecast) -> Result<Forecast, RepositoryError> {
        if let Some(id) = forecast.id() {
            return Err(RepositoryError::DuplicateIdentifier(id));
        }

        fs::create_dir_all(&self.base_dir)
            .map_err(|e| RepositoryError::StorageDirCreation(self.base_dir.clone(), e))?;
        let id = self.next_id()?;

        let mut data = forecast.data().clone();
        let mut parquet = Vec::new();
        ParquetWriter::new(&mut parquet)
            .finish(&mut data)
            .map_err(RepositoryError::Parquet)?;

        let record = ForecastRecord {
            id,
            created_at: forecast.created_at(),
            valid_at: forecast.valid_at(),
            location: forecast.location().clone(),
            weather_model: forecast.weather_model(),
            provider: forecast.provider().map(str::to_string),
            data: parquet,
        };
        let bytes = bincode::serde::encode_to_vec(&record, BINCODE_CONFIG)
            .map_err(|e| RepositoryError::Encode(Box::new(e)))?;

        let path = self.path_for(id);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| RepositoryError::Write(path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| RepositoryError::Write(path.clone(), e))?;
        info!("Saved forecast {} ({} bytes) to {}", id, bytes.len(), path.display());

        Ok(forecast.clone().with_id(id))
    }

    /// Loads the forecast stored under `id`.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::NotFound`] if nothing is stored under `id`.
    /// * I/O, decoding and Parquet errors while reading.
    pub fn retrieve_forecast_by_id(&self, id: u64) -> Result<Forecast, RepositoryError> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(RepositoryError::NotFound(id)),
            Err(e) => return Err(RepositoryError::Read(path, e)),
        };

        let (record, _) =
            bincode::serde::decode_from_slice::<ForecastRecord, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| RepositoryError::Decode(path.clone(), Box::new(e)))?;
        let data = ParquetReader::new(Cursor::new(record.data))
            .finish()
            .map_err(RepositoryError::Parquet)?;

        let forecast = Forecast::new(
            record.created_at,
            record.valid_at,
            data,
            record.location,
            record.weather_model,
        )
        .with_id(record.id);
        Ok(match record.provider {
            Some(provider) => forecast.with_provider(provider),
            None => forecast,
        })
    }
}

fn parse_id(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day_start, hourly_frame};
    use crate::types::frame::TIMESTAMP_COLUMN;
    use tempfile::tempdir;

    fn forecast() -> Forecast {
        Forecast::new(
            day_start(),
            day_start(),
            hourly_frame(
                TIMESTAMP_COLUMN,
                &[
                    ("temperature", vec![Some(4.0), None, Some(3.5)]),
                    ("wind_direction", vec![Some(350.0), Some(10.0), None]),
                ],
            ),
            Location::new("My location", "53.11", "21.37"),
            WeatherModel::Icon,
        )
        .with_provider("open_meteo")
    }

    #[test]
    fn test_first_save_gets_id_one() {
        let dir = tempdir().unwrap();
        let repository = FileForecastRepository::new(dir.path().join("nested"));
        assert_eq!(repository.next_id().unwrap(), 1);

        let original = forecast();
        let saved = repository.save_forecast(&original).unwrap();

        assert_eq!(saved.id(), Some(1));
        assert_eq!(original.id(), None);
        assert!(dir.path().join("nested").join("forecast_1.bin").exists());
    }

    #[test]
    fn test_ids_continue_after_highest() {
        let dir = tempdir().unwrap();
        let repository = FileForecastRepository::new(dir.path());
        repository.save_forecast(&forecast()).unwrap();
        repository.save_forecast(&forecast()).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a forecast").unwrap();

        let third = repository.save_forecast(&forecast()).unwrap();
        assert_eq!(third.id(), Some(3));

        fs::remove_file(dir.path().join("forecast_2.bin")).unwrap();
        assert_eq!(repository.next_id().unwrap(), 4);
    }

    #[test]
    fn test_round_trip_keeps_everything() {
        let dir = tempdir().unwrap();
        let repository = FileForecastRepository::new(dir.path());
        let saved = repository.save_forecast(&forecast()).unwrap();

        let loaded = repository.retrieve_forecast_by_id(1).unwrap();
        assert!(loaded.structurally_eq(&saved));
        assert_eq!(loaded.weather_model(), WeatherModel::Icon);
        assert_eq!(loaded.location().name(), "My location");
        assert_eq!(loaded.provider(), Some("open_meteo"));
    }

    #[test]
    fn test_saving_identified_forecast_fails() {
        let dir = tempdir().unwrap();
        let repository = FileForecastRepository::new(dir.path());
        let saved = repository.save_forecast(&forecast()).unwrap();

        assert!(matches!(
            repository.save_forecast(&saved),
            Err(RepositoryError::DuplicateIdentifier(1))
        ));
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let dir = tempdir().unwrap();
        let repository = FileForecastRepository::new(dir.path());
        assert!(matches!(
            repository.retrieve_forecast_by_id(7),
            Err(RepositoryError::NotFound(7))
        ));
    }

    #[test]
    fn test_file_name_parsing() {
        assert_eq!(parse_id("forecast_12.bin"), Some(12));
        assert_eq!(parse_id("forecast_.bin"), None);
        assert_eq!(parse_id("forecast_3.pkl"), None);
        assert_eq!(parse_id("other_3.bin"), None);
    }
}
