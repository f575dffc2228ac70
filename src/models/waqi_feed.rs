use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::serialize_aqi;

/// Envelope of every WAQI feed response. On errors 'data' is a plain message string.
#[derive(Deserialize)]
pub struct FeedResponse {
    pub status: String,
    #[serde(default)]
    pub data: Value,
}

/// One day of a pollutant forecast
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DailyForecast {
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DailyForecasts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25: Option<Vec<DailyForecast>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<Vec<DailyForecast>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Forecast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailyForecasts>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Station payload as delivered in the 'data' field of a successful feed response.
///
/// Fields not needed downstream are kept in 'other' so that the payload survives a
/// write/read cycle through the intermediate file unchanged.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StationData {
    #[serde(with = "serialize_aqi")]
    pub aqi: Option<f64>,
    #[serde(rename = "dominentpol", default)]
    pub dominant_pollutant: String,
    #[serde(default)]
    pub iaqi: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StationData {
    /// Returns current pollutant levels keyed by upper-cased pollutant code in payload order.
    /// Entries lacking a numeric 'v' are left out.
    pub fn pollutant_levels(&self) -> Vec<(String, f64)> {
        self.iaqi
            .iter()
            .filter_map(|(code, value)| {
                value.get("v")
                    .and_then(Value::as_f64)
                    .map(|v| (code.to_uppercase(), v))
            })
            .collect()
    }

    /// Returns the daily forecasts if the station has any
    pub fn daily_forecasts(&self) -> Option<&DailyForecasts> {
        self.forecast.as_ref().and_then(|f| f.daily.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dash_aqi_is_missing() {
        let data: StationData = serde_json::from_value(json!({
            "aqi": "-", "dominentpol": "", "iaqi": {}
        })).unwrap();
        assert_eq!(data.aqi, None);
        assert_eq!(serde_json::to_value(&data).unwrap()["aqi"], json!("-"));
    }

    #[test]
    fn pollutant_levels_keep_payload_order() {
        let data: StationData = serde_json::from_value(json!({
            "aqi": 42,
            "dominentpol": "pm25",
            "iaqi": { "pm25": {"v": 42}, "o3": {"v": 12.5}, "t": {"v": 8.1}, "w": {} }
        })).unwrap();

        let levels = data.pollutant_levels();
        assert_eq!(levels, vec![
            ("PM25".to_string(), 42.0),
            ("O3".to_string(), 12.5),
            ("T".to_string(), 8.1),
        ]);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "aqi": 42,
            "idx": 5771,
            "city": { "name": "Amsterdam" },
            "dominentpol": "pm25",
            "iaqi": {},
            "forecast": { "daily": { "uvi": [ {"day": "2024-01-01", "avg": 0} ] } }
        });
        let data: StationData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&data).unwrap(), raw);
    }
}
