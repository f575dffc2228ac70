use std::collections::HashMap;
use log::{debug, info};
use crate::models::city_reading::CityReading;
use crate::models::waqi_feed::DailyForecast;
use crate::table::{format_number, Table};

pub const CITY: &str = "City";
pub const AQI: &str = "AQI";
pub const DOMINANT_POLLUTANT: &str = "Dominant Pollutant";
pub const DATE: &str = "Date";
pub const PM25_AVG: &str = "PM2.5 Forecast (Avg)";
pub const PM25_MIN: &str = "PM2.5 Forecast (Min)";
pub const PM25_MAX: &str = "PM2.5 Forecast (Max)";
pub const PM10_AVG: &str = "PM10 Forecast (Avg)";
pub const PM10_MIN: &str = "PM10 Forecast (Min)";
pub const PM10_MAX: &str = "PM10 Forecast (Max)";

/// Forecast columns in table order
pub const FORECAST_COLUMNS: [&str; 6] = [PM25_AVG, PM25_MIN, PM25_MAX, PM10_AVG, PM10_MIN, PM10_MAX];

/// avg/min/max of one forecast day, unset when the source had no value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForecastTriple {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<&DailyForecast> for ForecastTriple {
    fn from(d: &DailyForecast) -> Self {
        ForecastTriple { avg: d.avg, min: d.min, max: d.max }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stat {
    Avg,
    Min,
    Max,
}

impl ForecastTriple {
    fn get(&self, stat: Stat) -> Option<f64> {
        match stat {
            Stat::Avg => self.avg,
            Stat::Min => self.min,
            Stat::Max => self.max,
        }
    }

    fn set(&mut self, stat: Stat, value: f64) {
        match stat {
            Stat::Avg => self.avg = Some(value),
            Stat::Min => self.min = Some(value),
            Stat::Max => self.max = Some(value),
        }
    }
}

/// A numeric column of the forecast table
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumericColumn {
    Aqi,
    Pollutant(String),
    Pm25(Stat),
    Pm10(Stat),
}

/// One row per city and PM2.5 forecast day
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastRow {
    pub city: String,
    pub aqi: Option<f64>,
    pub dominant_pollutant: String,
    pub date: String,
    pub pollutants: HashMap<String, f64>,
    pub pm25: ForecastTriple,
    pub pm10: ForecastTriple,
}

impl ForecastRow {
    pub fn value(&self, column: &NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::Aqi => self.aqi,
            NumericColumn::Pollutant(code) => self.pollutants.get(code).copied(),
            NumericColumn::Pm25(stat) => self.pm25.get(*stat),
            NumericColumn::Pm10(stat) => self.pm10.get(*stat),
        }
    }

    fn set_value(&mut self, column: &NumericColumn, value: f64) {
        match column {
            NumericColumn::Aqi => self.aqi = Some(value),
            NumericColumn::Pollutant(code) => { self.pollutants.insert(code.clone(), value); },
            NumericColumn::Pm25(stat) => self.pm25.set(*stat, value),
            NumericColumn::Pm10(stat) => self.pm10.set(*stat, value),
        }
    }
}

/// Flattened forecast rows together with the pollutant columns in first seen order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastTable {
    pub pollutant_columns: Vec<String>,
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// Numeric columns in table order
    pub fn numeric_columns(&self) -> Vec<NumericColumn> {
        let mut columns = vec![NumericColumn::Aqi];
        columns.extend(self.pollutant_columns.iter().cloned().map(NumericColumn::Pollutant));
        for stat in [Stat::Avg, Stat::Min, Stat::Max] {
            columns.push(NumericColumn::Pm25(stat));
        }
        for stat in [Stat::Avg, Stat::Min, Stat::Max] {
            columns.push(NumericColumn::Pm10(stat));
        }
        columns
    }

    /// Fills missing numeric cells with the column mean rounded to two decimals.
    ///
    /// The mean is taken over every row of the table, so it must only be called once all
    /// cities have been added. A column without any values stays missing.
    pub fn impute_missing(&mut self) {
        for column in self.numeric_columns() {
            let present = self.rows
                .iter()
                .filter_map(|r| r.value(&column))
                .collect::<Vec<f64>>();

            if present.is_empty() || present.len() == self.rows.len() {
                continue;
            }

            let fill = round2(present.iter().sum::<f64>() / present.len() as f64);
            let mut filled = 0;
            for row in self.rows.iter_mut().filter(|r| r.value(&column).is_none()) {
                row.set_value(&column, fill);
                filled += 1;
            }
            debug!("filled {} cells in {:?} with {}", filled, column, fill);
        }
    }

    /// Returns the table as text cells with header row
    /// City, AQI, Dominant Pollutant, Date, pollutants, forecast columns
    pub fn to_table(&self) -> Table {
        let mut headers: Vec<String> = vec![CITY.into(), AQI.into(), DOMINANT_POLLUTANT.into(), DATE.into()];
        headers.extend(self.pollutant_columns.iter().cloned());
        headers.extend(FORECAST_COLUMNS.iter().map(|c| c.to_string()));

        let numeric = self.numeric_columns();
        let rows = self.rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    Some(r.city.clone()),
                    r.aqi.map(format_number),
                    Some(r.dominant_pollutant.clone()).filter(|s| !s.is_empty()),
                    Some(r.date.clone()),
                ];
                cells.extend(numeric.iter().skip(1).map(|c| r.value(c).map(format_number)));
                cells
            })
            .collect();

        Table { headers, rows }
    }
}

/// Flattens city readings into forecast rows, one row per PM2.5 forecast day.
///
/// Cities without a PM2.5 forecast contribute no rows. The PM10 forecast for a day is
/// matched on the day string and left unset when there is no match. No imputation is done.
///
/// # Arguments
///
/// * 'readings' - accepted city readings in city order
pub fn reshape(readings: &[CityReading]) -> ForecastTable {
    let mut table = ForecastTable::default();

    for reading in readings {
        let data = &reading.data;
        let levels = data.pollutant_levels();

        let Some(pm25) = data.daily_forecasts().and_then(|d| d.pm25.as_ref()) else {
            debug!("{} has no PM2.5 forecast, skipping", reading.city);
            continue;
        };
        let pm10 = data.daily_forecasts().and_then(|d| d.pm10.as_ref());

        // Cities without rows add no columns
        if !pm25.is_empty() {
            for (code, _) in &levels {
                if !table.pollutant_columns.contains(code) {
                    table.pollutant_columns.push(code.clone());
                }
            }
        }

        for day in pm25 {
            let pm10_day = pm10
                .and_then(|p| p.iter().find(|d| d.day == day.day))
                .map(ForecastTriple::from)
                .unwrap_or_default();

            table.rows.push(ForecastRow {
                city: reading.city.clone(),
                aqi: data.aqi,
                dominant_pollutant: data.dominant_pollutant.clone(),
                date: day.day.clone(),
                pollutants: levels.iter().cloned().collect(),
                pm25: ForecastTriple::from(day),
                pm10: pm10_day,
            });
        }
    }

    table
}

/// Reshapes the readings and fills in missing values
///
/// # Arguments
///
/// * 'readings' - accepted city readings in city order
pub fn transform(readings: &[CityReading]) -> ForecastTable {
    let mut table = reshape(readings);
    table.impute_missing();

    info!("reshaped {} cities into {} rows with {} pollutant columns",
        readings.len(), table.rows.len(), table.pollutant_columns.len());

    table
}

/// Rounds to two decimals, ties go to the even digit
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
