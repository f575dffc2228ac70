use std::fs;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use crate::errors::HandoffError;
use crate::models::city_reading::CityReading;

/// Saves accepted city readings to the intermediate file, replacing any earlier content
///
/// # Arguments
///
/// * 'file_path' - the file to write
/// * 'readings' - readings to save
pub fn save_readings(file_path: &str, readings: &[CityReading]) -> Result<(), HandoffError> {
    let mut json: Vec<u8> = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut json, formatter);
    readings.serialize(&mut ser)?;

    fs::write(file_path, json)?;

    Ok(())
}

/// Loads city readings from the intermediate file
///
/// # Arguments
///
/// * 'file_path' - the file to read
pub fn load_readings(file_path: &str) -> Result<Vec<CityReading>, HandoffError> {
    let json = fs::read_to_string(file_path)
        .map_err(|e| HandoffError(format!("can't read {}: {}", file_path, e)))?;
    let readings: Vec<CityReading> = serde_json::from_str(&json)?;

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn readings_survive_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("air_quality.json");
        let path = path.to_str().unwrap();

        let readings: Vec<CityReading> = serde_json::from_value(json!([
            { "city": "Den Haag", "data": { "aqi": 17, "dominentpol": "o3", "iaqi": { "o3": {"v": 17} } } },
            { "city": "Groningen", "data": { "aqi": "-", "dominentpol": "", "iaqi": {} } },
        ])).unwrap();

        save_readings(path, &readings).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\n    {\n        \"city\": \"Den Haag\""));

        let loaded = load_readings(path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].city, "Den Haag");
        assert_eq!(loaded[1].data.aqi, None);
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_readings("/nonexistent/air_quality.json").is_err());
    }
}
