pub mod city_reading;
pub mod waqi_feed;
