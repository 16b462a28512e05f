/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{SimResult, SimulationConfig};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub observer: ObserverConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ObserverConfig {
    /// How often the binary logs a metrics line, in milliseconds.
    pub poll_interval_ms: u64,
    /// Pretty-print the final JSON state.
    pub pretty: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        ObserverConfig {
            poll_interval_ms: 5_000,
            pretty: true,
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config<P: AsRef<Path>>(path: P) -> SimResult<Config> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> SimResult<Config> {
    let config: Config = toml::from_str(config_str)?;
    config.simulation.validate()?;
    Ok(config)
}

/***************************************/
/*             Unit tests              */
/***************************************/
