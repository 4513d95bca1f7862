//! Loading of the emissions dataset and the boundary topology.

use log::{info, warn};
use tokio::try_join;

use crate::{
    config::Config,
    emissions::EmissionsDataset,
    error::{CarbonMapError, Result},
    topology::{BoundaryFeature, Topology},
};

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read a source as text, over HTTP for URLs and from disk otherwise
pub async fn fetch_text(location: &str) -> Result<String> {
    info!("Attempting to load {location}");
    if is_remote(location) {
        Ok(reqwest::Client::new()
            .get(location)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    } else {
        Ok(tokio::fs::read_to_string(location).await?)
    }
}

/// Load and validate the emissions dataset named by the config.
pub async fn load_emissions(config: &Config) -> Result<EmissionsDataset> {
    let location = &config.emissions_source;
    let result = async {
        let text = fetch_text(location).await?;
        EmissionsDataset::from_json_str(&text)
    }
    .await;
    match result {
        Ok(dataset) => {
            info!(
                "Emissions data loaded with {} year(s)",
                dataset.years().count()
            );
            Ok(dataset)
        }
        Err(cause) => Err(CarbonMapError::EmissionsLoad {
            location: location.clone(),
            cause: Box::new(cause),
        }),
    }
}

async fn fetch_topology(location: &str) -> Result<Topology> {
    Topology::from_json_str(&fetch_text(location).await?)
}

/// Load the boundary features, trying the alternative mirror exactly once if
/// the primary cannot be fetched or parsed. A topology that parses but has no
/// country collection is not retried.
pub async fn load_boundaries(config: &Config) -> Result<Vec<BoundaryFeature>> {
    let topology = match fetch_topology(&config.boundary_primary).await {
        Ok(topology) => topology,
        Err(primary) => {
            warn!("Error loading primary world map source: {primary}");
            info!("Trying alternative source {}", config.boundary_fallback);
            fetch_topology(&config.boundary_fallback)
                .await
                .map_err(|fallback| CarbonMapError::BoundaryLoad {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })?
        }
    };
    let features = topology.into_features(&config.country_objects)?;
    info!("Decoded {} boundary features", features.len());
    Ok(features)
}

/// Load both datasets concurrently. Either failure aborts the other.
pub async fn load_all(config: &Config) -> Result<(EmissionsDataset, Vec<BoundaryFeature>)> {
    try_join!(load_emissions(config), load_boundaries(config))
}
