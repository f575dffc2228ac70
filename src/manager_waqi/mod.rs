pub mod errors;

use std::time::Duration;
use chrono::{DateTime, Local};
use log::{info, warn};
use serde_json::Value;
use ureq::Agent;
use crate::config;
use crate::manager_waqi::errors::WaqiError;
use crate::models::city_reading::CityReading;
use crate::models::waqi_feed::{FeedResponse, StationData};

/// Anything able to deliver the station feed for a city
pub trait FeedSource {
    fn station_feed(&self, city: &str) -> Result<StationData, WaqiError>;
}

/// Struct for fetching city feeds from the World Air Quality Index project
pub struct Waqi {
    agent: Agent,
    endpoint: String,
    api_key: String,
}

impl Waqi {
    /// Returns a Waqi struct ready for fetching city feeds
    ///
    /// # Arguments
    ///
    /// * 'config' - WAQI configuration with endpoint, api key and request timeout
    pub fn new(config: &config::Waqi) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        let agent = agent_config.into();

        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

impl FeedSource for Waqi {
    /// Retrieves the feed for the given city, see https://aqicn.org/json-api/doc/#api-City_Feed
    ///
    /// # Arguments
    ///
    /// * 'city' - name of city as known by WAQI
    fn station_feed(&self, city: &str) -> Result<StationData, WaqiError> {
        let url = format!("{}/{}/", self.endpoint, urlencoding::encode(city));

        let json = self.agent
            .get(url)
            .query("token", &self.api_key)
            .call()?
            .body_mut()
            .read_to_string()?;

        parse_feed(&json)
    }
}

/// Outcome of fetching one city
#[derive(Debug)]
pub enum FetchOutcome {
    Accepted,
    Rejected(WaqiError),
}

#[derive(Debug)]
pub struct CityOutcome {
    pub city: String,
    pub outcome: FetchOutcome,
}

/// Result of a fetch run, accepted readings are in city order
pub struct FetchReport {
    pub fetched_at: DateTime<Local>,
    pub readings: Vec<CityReading>,
    pub outcomes: Vec<CityOutcome>,
}

impl FetchReport {
    pub fn rejected(&self) -> impl Iterator<Item = &CityOutcome> {
        self.outcomes.iter().filter(|o| matches!(o.outcome, FetchOutcome::Rejected(_)))
    }
}

/// Fetches the feed for every city, one request per city and no retries.
/// Cities whose feed can't be fetched or isn't acceptable are left out of the readings
/// but recorded as rejected in the report.
///
/// # Arguments
///
/// * 'source' - the feed source to use
/// * 'cities' - cities to fetch, in order
pub fn fetch_all<S: FeedSource>(source: &S, cities: &[String]) -> FetchReport {
    let fetched_at = Local::now();
    let mut readings: Vec<CityReading> = Vec::with_capacity(cities.len());
    let mut outcomes: Vec<CityOutcome> = Vec::with_capacity(cities.len());

    for city in cities {
        let outcome = match source.station_feed(city) {
            Ok(data) => {
                readings.push(CityReading { city: city.clone(), data });
                FetchOutcome::Accepted
            },
            Err(e) => {
                warn!("dropping {}: {}", city, e);
                FetchOutcome::Rejected(e)
            },
        };
        outcomes.push(CityOutcome { city: city.clone(), outcome });
    }

    info!("fetched {} of {} cities at {}", readings.len(), cities.len(), fetched_at.format("%Y-%m-%d %H:%M:%S"));

    FetchReport { fetched_at, readings, outcomes }
}

/// Parses a feed response body, accepting it only if the api status is 'ok'
///
/// # Arguments
///
/// * 'json' - the response body
fn parse_feed(json: &str) -> Result<StationData, WaqiError> {
    let response: FeedResponse = serde_json::from_str(json)?;

    if response.status != "ok" {
        let msg = match response.data {
            Value::String(s) => format!("{}: {}", response.status, s),
            _ => response.status,
        };
        return Err(WaqiError::ApiStatus(msg));
    }

    Ok(serde_json::from_value(response.data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use serde_json::json;

    struct FakeSource(HashMap<&'static str, String>);

    impl FeedSource for FakeSource {
        fn station_feed(&self, city: &str) -> Result<StationData, WaqiError> {
            match self.0.get(city) {
                Some(body) => parse_feed(body),
                None => Err(WaqiError::HttpStatus(404)),
            }
        }
    }

    fn ok_body(aqi: u32) -> String {
        json!({ "status": "ok", "data": { "aqi": aqi, "dominentpol": "pm25", "iaqi": {} } }).to_string()
    }

    #[test]
    fn non_ok_status_is_rejected() {
        let body = json!({ "status": "error", "data": "Unknown station" }).to_string();
        match parse_feed(&body) {
            Err(WaqiError::ApiStatus(msg)) => assert_eq!(msg, "error: Unknown station"),
            _ => panic!("expected api status rejection"),
        }
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(parse_feed("<html>"), Err(WaqiError::Document(_))));
        let body = json!({ "status": "ok", "data": { "dominentpol": "pm25" } }).to_string();
        assert!(matches!(parse_feed(&body), Err(WaqiError::Document(_))));
    }

    #[test]
    fn fetch_keeps_city_order_and_records_rejections() {
        let mut bodies = HashMap::new();
        bodies.insert("Utrecht", ok_body(30));
        bodies.insert("Amsterdam", ok_body(40));
        bodies.insert("Delft", json!({ "status": "nok", "data": "Over quota" }).to_string());
        let source = FakeSource(bodies);

        let cities: Vec<String> = ["Utrecht", "Breda", "Amsterdam", "Delft"]
            .iter().map(|c| c.to_string()).collect();
        let report = fetch_all(&source, &cities);

        let accepted: Vec<&str> = report.readings.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(accepted, vec!["Utrecht", "Amsterdam"]);
        assert_eq!(report.readings[1].data.aqi, Some(40.0));

        assert_eq!(report.outcomes.len(), 4);
        let rejected: Vec<&str> = report.rejected().map(|o| o.city.as_str()).collect();
        assert_eq!(rejected, vec!["Breda", "Delft"]);
        assert!(matches!(report.outcomes[1].outcome, FetchOutcome::Rejected(WaqiError::HttpStatus(404))));
        assert!(matches!(report.outcomes[3].outcome, FetchOutcome::Rejected(WaqiError::ApiStatus(_))));
    }

    /// Serves a single request with the given status line and body, the join handle
    /// yields the request line as received
    fn serve_once(status: &'static str, body: String) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/feed", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status, body.len(), body);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            request_line.trim_end().to_string()
        });

        (endpoint, handle)
    }

    fn client(endpoint: &str, timeout_secs: u64) -> Waqi {
        Waqi::new(&config::Waqi {
            endpoint: endpoint.to_string(),
            api_key: "secret".to_string(),
            cities: vec![],
            timeout_secs,
        })
    }

    #[test]
    fn request_carries_encoded_city_and_token() {
        let (endpoint, handle) = serve_once("200 OK", ok_body(33));

        let data = client(&endpoint, 5).station_feed("The Hague").unwrap();
        assert_eq!(data.aqi, Some(33.0));

        let request_line = handle.join().unwrap();
        assert!(request_line.starts_with("GET /feed/The%20Hague/?token=secret "), "{}", request_line);
    }

    #[test]
    fn api_error_status_is_rejected_by_client() {
        let body = json!({ "status": "error", "data": "Invalid key" }).to_string();
        let (endpoint, handle) = serve_once("200 OK", body);

        match client(&endpoint, 5).station_feed("Utrecht") {
            Err(WaqiError::ApiStatus(msg)) => assert_eq!(msg, "error: Invalid key"),
            other => panic!("expected api status rejection, got {:?}", other.err()),
        }
        handle.join().unwrap();
    }

    #[test]
    fn server_error_maps_to_http_status() {
        let (endpoint, handle) = serve_once("500 Internal Server Error", "oops".to_string());

        assert!(matches!(client(&endpoint, 5).station_feed("Utrecht"), Err(WaqiError::HttpStatus(500))));
        handle.join().unwrap();
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/feed", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        assert!(matches!(client(&endpoint, 1).station_feed("Utrecht"), Err(WaqiError::Transport(_))));
        handle.join().unwrap();
    }
}
