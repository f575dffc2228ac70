use thiserror::Error;

/// Reasons for not accepting the feed of a city
#[derive(Error, Debug)]
pub enum WaqiError {
    #[error("WaqiError::Transport: {0}")]
    Transport(String),
    #[error("WaqiError::HttpStatus: {0}")]
    HttpStatus(u16),
    #[error("WaqiError::ApiStatus: {0}")]
    ApiStatus(String),
    #[error("WaqiError::Document: {0}")]
    Document(String),
}
impl From<ureq::Error> for WaqiError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => WaqiError::HttpStatus(code),
            _ => WaqiError::Transport(e.to_string()),
        }
    }
}
impl From<serde_json::Error> for WaqiError {
    fn from(e: serde_json::Error) -> Self {
        WaqiError::Document(e.to_string())
    }
}
