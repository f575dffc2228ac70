use serde::{Deserialize, Deserializer, Serializer};
use serde::de::Error;
use serde_json::Value;

/// Marker WAQI uses when a station has no current AQI
const NO_VALUE: &str = "-";

/// Serializer for serde with to write an optional AQI the way WAQI does, i.e. as a number
/// or as "-" when missing. Integral values are written without decimals.
///
/// # Arguments
///
/// * 'aqi' - the aqi value
/// * 'serializer' - serializer given from serde
pub fn serialize<S>(aqi: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match aqi {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => serializer.serialize_i64(*v as i64),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str(NO_VALUE),
    }
}

/// Deserializer accepting a number, a numeric string, "-" or null
///
/// # Arguments
///
/// * 'd' - deserializer given from serde
pub fn deserialize<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Number(n) => Ok(n.as_f64()),
        Value::Null => Ok(None),
        Value::String(s) if s.trim() == NO_VALUE => Ok(None),
        Value::String(s) => s.trim().parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid aqi value '{}'", s))),
        other => Err(D::Error::custom(format!("invalid aqi value {}", other))),
    }
}
