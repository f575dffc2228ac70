use std::env;
use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

#[derive(Deserialize, Clone)]
pub struct Waqi {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub cities: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct Files {
    pub raw_file: String,
    pub table_file: String,
    pub plot_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct Database {
    pub db_path: String,
    pub table: String,
}

#[derive(Deserialize, Clone)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub waqi: Waqi,
    pub files: Files,
    pub database: Database,
    pub general: General,
}

fn default_timeout() -> u64 {
    30
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// The WAQI api key can be given in the environment variable WAQI_API_KEY, in which case
/// it takes precedence over any key in the file.
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {

    let toml = fs::read_to_string(config_path)?;
    let mut config: Config = toml::from_str(&toml)?;

    if let Ok(api_key) = env::var("WAQI_API_KEY") {
        config.waqi.api_key = api_key;
    }

    if config.waqi.api_key.is_empty() {
        return Err(ConfigError::from("no WAQI api key configured"));
    }
    if config.waqi.cities.is_empty() {
        return Err(ConfigError::from("city list is empty"));
    }

    Ok(config)
}
