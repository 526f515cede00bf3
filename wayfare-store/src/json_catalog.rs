use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, error};
use wayfare_catalog::{CatalogSource, Offering};
use wayfare_core::{CoreError, TravelMode};

/// Reads `{data_dir}/flights.json` and `{data_dir}/trains.json` on every
/// search. The files are versionless; whatever is on disk is the catalog.
#[derive(Debug, Clone)]
pub struct JsonCatalogSource {
    data_dir: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn path_for(&self, mode: TravelMode) -> PathBuf {
        self.data_dir.join(format!("{}.json", mode.dataset()))
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn load(&self, mode: TravelMode) -> Result<Vec<Offering>, CoreError> {
        let path = self.path_for(mode);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            error!("Failed to read catalog {}: {}", path.display(), e);
            CoreError::SourceUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let offerings = Offering::parse_dataset(mode, &bytes)?;
        debug!("Loaded {} {} offerings from {}", offerings.len(), mode, path.display());
        Ok(offerings)
    }
}
