use serde::{Deserialize, Serialize};
use crate::models::waqi_feed::StationData;

/// An accepted station payload for one configured city
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CityReading {
    pub city: String,
    pub data: StationData,
}
