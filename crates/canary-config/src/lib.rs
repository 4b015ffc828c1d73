pub mod config;
pub mod loader;

pub use config::Config;
pub use loader::{load_validator, load_validator_from_bytes, SpecLocation, ValidatorSource};
