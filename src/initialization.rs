use std::env;
use log::info;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General};
use crate::errors::{LoggingError, UnrecoverableError};
use crate::pipeline::Stage;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {m}{n}";

/// Parses the command line, loads configuration and sets up logging
///
/// Recognized arguments are an optional '--config=<path>' and an optional stage name.
/// Without '--config' the path is taken from the environment variable CONFIG_PATH and
/// lastly from the default location.
pub fn init() -> Result<(Config, Stage), UnrecoverableError> {
    let (config_path, stage) = parse_args(env::args().skip(1))?;

    let config = load_config(&config_path)?;
    setup_logger(&config.general)?;

    info!("airquality-etl version: {}", env!("CARGO_PKG_VERSION"));
    info!("using configuration {}", config_path);

    Ok((config, stage))
}

/// Splits command line arguments into a config path and a stage
///
/// # Arguments
///
/// * 'args' - arguments excluding the program name
fn parse_args<I: Iterator<Item = String>>(args: I) -> Result<(String, Stage), UnrecoverableError> {
    let mut config_path: Option<String> = None;
    let mut stage = Stage::All;

    for arg in args {
        if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(path.to_string());
        } else {
            stage = arg.parse::<Stage>().map_err(UnrecoverableError::Usage)?;
        }
    }

    let config_path = config_path
        .or_else(|| env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    Ok((config_path, stage))
}

/// Sets up log4rs with a file appender and, if configured, a console appender
///
/// # Arguments
///
/// * 'general' - general configuration holding log path and level
fn setup_logger(general: &General) -> Result<(), LoggingError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&general.log_path)?;

    let mut builder = LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let log_config = builder.build(root.build(general.log_level))?;
    log4rs::init_config(log_config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<String>>().into_iter()
    }

    #[test]
    fn explicit_config_and_stage() {
        let (path, stage) = parse_args(args(&["--config=/etc/aq.toml", "transform"])).unwrap();
        assert_eq!(path, "/etc/aq.toml");
        assert_eq!(stage, Stage::Transform);
    }

    #[test]
    fn stage_defaults_to_all() {
        let (_, stage) = parse_args(args(&["--config=/etc/aq.toml"])).unwrap();
        assert_eq!(stage, Stage::All);
    }

    #[test]
    fn unknown_stage_is_a_usage_error() {
        assert!(matches!(parse_args(args(&["reticulate"])), Err(UnrecoverableError::Usage(_))));
    }
}
