use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Directory holding `flights.json` and `trains.json`.
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    #[serde(default = "default_seat_capacity")]
    pub seat_capacity: u32,
    #[serde(default = "default_prebooked_ratio")]
    pub prebooked_ratio: f64,
    /// Fixed seed for reproducible seat maps; random when unset.
    pub seat_seed: Option<u64>,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_payment_delay_ms")]
    pub payment_delay_ms: u64,
}

fn default_seat_capacity() -> u32 { 120 }
fn default_prebooked_ratio() -> f64 { 0.3 }
fn default_tax_rate() -> f64 { 0.10 }
fn default_currency() -> String { "USD".to_string() }
fn default_payment_delay_ms() -> u64 { 2000 }

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            seat_capacity: default_seat_capacity(),
            prebooked_ratio: default_prebooked_ratio(),
            seat_seed: None,
            tax_rate: default_tax_rate(),
            currency: default_currency(),
            payment_delay_ms: default_payment_delay_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `WAYFARE__BOOKING__SEAT_SEED=7`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
