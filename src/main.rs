mod config;
mod errors;
mod handoff;
mod initialization;
mod manager_waqi;
mod models;
mod pipeline;
mod render;
mod reshape;
mod serialize_aqi;
mod sink;
mod table;

use log::{error, info};
use crate::errors::UnrecoverableError;
use crate::initialization::init;

fn main() -> Result<(), UnrecoverableError> {
    let (config, stage) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return Err(e);
        }
    };

    info!("running stage {:?}", stage);
    if let Err(e) = pipeline::run(&config, stage) {
        error!("stage {:?} failed: {}", stage, e);
        return Err(e);
    }
    info!("stage {:?} done", stage);

    Ok(())
}
