use std::str::FromStr;
use log::{info, warn};
use crate::config::Config;
use crate::errors::{RenderError, ReshapeError, SinkError, UnrecoverableError};
use crate::handoff::{load_readings, save_readings};
use crate::manager_waqi::{fetch_all, FetchReport, Waqi};
use crate::models::city_reading::CityReading;
use crate::render::plot_all;
use crate::reshape::{transform, ForecastTable};
use crate::sink::load_table;
use crate::table::Table;

/// Pipeline stages, run one at a time by an external runner or all in sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Plot,
    All,
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract" => Ok(Stage::Extract),
            "transform" => Ok(Stage::Transform),
            "load" => Ok(Stage::Load),
            "plot" => Ok(Stage::Plot),
            "all" => Ok(Stage::All),
            _ => Err(format!("unknown stage '{}', expected extract, transform, load, plot or all", s)),
        }
    }
}

/// Runs the given stage. Running all stages hands the fetched readings directly to the
/// transform stage, the intermediate file is still written.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'stage' - stage to run
pub fn run(config: &Config, stage: Stage) -> Result<(), UnrecoverableError> {
    match stage {
        Stage::Extract => {
            extract_stage(config)?;
        },
        Stage::Transform => {
            let readings = load_readings(&config.files.raw_file)?;
            transform_stage(config, &readings)?;
        },
        Stage::Load => {
            load_stage(config)?;
        },
        Stage::Plot => plot_stage(config)?,
        Stage::All => {
            let report = extract_stage(config)?;
            transform_stage(config, &report.readings)?;
            load_stage(config)?;
            plot_stage(config)?;
        },
    }

    Ok(())
}

/// Fetches all configured cities and saves the accepted readings
///
/// # Arguments
///
/// * 'config' - configuration
pub fn extract_stage(config: &Config) -> Result<FetchReport, UnrecoverableError> {
    let waqi = Waqi::new(&config.waqi);
    let report = fetch_all(&waqi, &config.waqi.cities);

    let rejected = report.rejected().map(|o| o.city.as_str()).collect::<Vec<&str>>();
    if !rejected.is_empty() {
        warn!("no data for {} of {} cities: {}", rejected.len(), report.outcomes.len(), rejected.join(", "));
    }

    save_readings(&config.files.raw_file, &report.readings)?;
    info!("saved {} readings fetched {} to {}",
        report.readings.len(), report.fetched_at.format("%Y-%m-%d %H:%M:%S"), config.files.raw_file);

    Ok(report)
}

/// Reshapes readings into forecast rows and writes the table file
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'readings' - accepted city readings in city order
pub fn transform_stage(config: &Config, readings: &[CityReading]) -> Result<ForecastTable, ReshapeError> {
    let table = transform(readings);
    table.to_table().write_csv(&config.files.table_file)?;

    info!("saved {} rows to {}", table.rows.len(), config.files.table_file);

    Ok(table)
}

/// Replaces the database table with the content of the table file
///
/// # Arguments
///
/// * 'config' - configuration
pub fn load_stage(config: &Config) -> Result<usize, SinkError> {
    let table = Table::read_csv(&config.files.table_file)?;

    load_table(&config.database.db_path, &config.database.table, &table)
}

/// Renders the charts from the table file
///
/// # Arguments
///
/// * 'config' - configuration
pub fn plot_stage(config: &Config) -> Result<(), RenderError> {
    plot_all(&config.files.table_file, &config.files.plot_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use log::LevelFilter;
    use rusqlite::Connection;
    use serde_json::json;
    use crate::config::{Database, Files, General, Waqi as WaqiConfig};

    fn config(dir: &Path) -> Config {
        let path = |name: &str| dir.join(name).to_str().unwrap().to_string();
        Config {
            waqi: WaqiConfig {
                endpoint: "http://127.0.0.1:9/feed".to_string(),
                api_key: "test".to_string(),
                cities: vec!["X".to_string(), "Y".to_string()],
                timeout_secs: 1,
            },
            files: Files {
                raw_file: path("air_quality.json"),
                table_file: path("cleaned_air_quality.csv"),
                plot_dir: path("plots"),
            },
            database: Database {
                db_path: path("air_quality.db"),
                table: "air_quality".to_string(),
            },
            general: General {
                log_path: path("airquality.log"),
                log_level: LevelFilter::Info,
                log_to_stdout: false,
            },
        }
    }

    fn fixture() -> serde_json::Value {
        json!([
            {
                "city": "X",
                "data": {
                    "aqi": 57,
                    "idx": 1,
                    "dominentpol": "pm25",
                    "iaqi": { "pm25": {"v": 57}, "pm10": {"v": 21}, "t": {"v": 9.5} },
                    "forecast": { "daily": {
                        "pm25": [
                            { "day": "2024-03-01", "avg": 40, "min": 30, "max": 55 },
                            { "day": "2024-03-02", "avg": 35, "min": 21, "max": 48 }
                        ],
                        "pm10": [ { "day": "2024-03-01", "avg": 18, "min": 10, "max": 25 } ]
                    } }
                }
            },
            {
                "city": "Y",
                "data": { "aqi": 12, "dominentpol": "o3", "iaqi": { "o3": {"v": 12} }, "forecast": { "daily": {} } }
            }
        ])
    }

    #[test]
    fn stage_names() {
        assert_eq!("load".parse::<Stage>(), Ok(Stage::Load));
        assert_eq!("plot".parse::<Stage>(), Ok(Stage::Plot));
        assert!("Load".parse::<Stage>().is_err());
    }

    #[test]
    fn transform_load_and_plot_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        fs::write(&config.files.raw_file, fixture().to_string()).unwrap();

        run(&config, Stage::Transform).unwrap();
        let csv = fs::read_to_string(&config.files.table_file).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "City,AQI,Dominant Pollutant,Date,PM25,PM10,T,\
            PM2.5 Forecast (Avg),PM2.5 Forecast (Min),PM2.5 Forecast (Max),\
            PM10 Forecast (Avg),PM10 Forecast (Min),PM10 Forecast (Max)");
        assert_eq!(lines[2], "X,57,pm25,2024-03-02,57,21,9.5,35,21,48,18,10,25");

        run(&config, Stage::Load).unwrap();
        run(&config, Stage::Load).unwrap();
        let conn = Connection::open(&config.database.db_path).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM air_quality WHERE City = 'X'", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 2);
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM air_quality", [], |r| r.get(0)).unwrap();
        assert_eq!(total, 2);

        run(&config, Stage::Plot).unwrap();
        assert!(Path::new(&config.files.plot_dir).join(crate::render::AQI_PLOT).exists());
        assert!(Path::new(&config.files.plot_dir).join(crate::render::CORRELATION_PLOT).exists());
    }

    #[test]
    fn transform_without_intermediate_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        assert!(matches!(run(&config, Stage::Transform), Err(UnrecoverableError::Handoff(_))));
    }

    #[test]
    fn load_without_table_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        assert!(matches!(run(&config, Stage::Load), Err(UnrecoverableError::Sink(_))));
    }
}
