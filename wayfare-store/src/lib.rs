pub mod app_config;
pub mod json_catalog;

pub use app_config::Config;
pub use json_catalog::JsonCatalogSource;
