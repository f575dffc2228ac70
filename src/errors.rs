use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("HandoffError: {0}")]
pub struct HandoffError(pub String);
impl From<std::io::Error> for HandoffError {
    fn from(e: std::io::Error) -> Self { HandoffError(e.to_string()) }
}
impl From<serde_json::Error> for HandoffError {
    fn from(e: serde_json::Error) -> Self { HandoffError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("TableError: {0}")]
pub struct TableError(pub String);
impl From<std::io::Error> for TableError {
    fn from(e: std::io::Error) -> Self { TableError(e.to_string()) }
}
impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self { TableError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("ReshapeError: {0}")]
pub struct ReshapeError(pub String);
impl From<TableError> for ReshapeError {
    fn from(e: TableError) -> Self { ReshapeError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("SinkError: {0}")]
pub struct SinkError(pub String);
impl From<&str> for SinkError {
    fn from(e: &str) -> Self { SinkError(e.to_string()) }
}
impl From<rusqlite::Error> for SinkError {
    fn from(e: rusqlite::Error) -> Self { SinkError(e.to_string()) }
}
impl From<TableError> for SinkError {
    fn from(e: TableError) -> Self { SinkError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("RenderError: {0}")]
pub struct RenderError(pub String);
impl From<&str> for RenderError {
    fn from(e: &str) -> Self { RenderError(e.to_string()) }
}
impl From<TableError> for RenderError {
    fn from(e: TableError) -> Self { RenderError(e.to_string()) }
}
impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self { RenderError(e.to_string()) }
}
impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self { RenderError(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum UnrecoverableError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Logging(#[from] LoggingError),
    #[error("{0}")]
    Handoff(#[from] HandoffError),
    #[error("{0}")]
    Reshape(#[from] ReshapeError),
    #[error("{0}")]
    Sink(#[from] SinkError),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("UsageError: {0}")]
    Usage(String),
}
