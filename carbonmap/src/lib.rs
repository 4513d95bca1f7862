use choropleth::Choropleth;
use config::Config;
use emissions::EmissionsDataset;
use error::Result;
use log::{debug, info};
use resolver::{ResolvedBinding, Resolver};
use selection::Selection;
use topology::BoundaryFeature;

// Re-exports
pub use column_names as COL;

// Modules
pub mod choropleth;
pub mod column_names;
pub mod config;
pub mod countries;
pub mod emissions;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod geo;
pub mod loader;
pub mod resolver;
pub mod selection;
pub mod topology;

/// Type for the loaded emissions and boundary data and the API over them
pub struct CarbonMap {
    pub config: Config,
    pub emissions: EmissionsDataset,
    pub boundaries: Vec<BoundaryFeature>,
    pub resolver: Resolver,
}

impl CarbonMap {
    /// Load both datasets with the default configuration
    pub async fn new() -> Result<Self> {
        Self::new_with_config(Config::default()).await
    }

    /// Load both datasets with a custom configuration. Nothing is resolved
    /// until both loads have succeeded.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        debug!("config: {config:?}");
        let (emissions, boundaries) = loader::load_all(&config).await?;
        Ok(Self::from_parts(config, emissions, boundaries))
    }

    /// Build from datasets that are already in memory
    pub fn from_parts(
        config: Config,
        emissions: EmissionsDataset,
        boundaries: Vec<BoundaryFeature>,
    ) -> Self {
        let resolver = Resolver::from_config(&config);
        Self {
            config,
            emissions,
            boundaries,
            resolver,
        }
    }

    /// Resolve every boundary feature against the given selection
    pub fn resolve_all(&self, selection: &Selection) -> Result<Vec<ResolvedBinding>> {
        let current = self.emissions.current(selection)?;
        Ok(self
            .boundaries
            .iter()
            .map(|feature| self.resolver.resolve(feature, current))
            .collect())
    }

    /// Render a choropleth for the given selection
    pub fn choropleth(&self, selection: &Selection) -> Result<Choropleth> {
        let choropleth =
            Choropleth::build(&self.boundaries, &self.resolver, &self.emissions, selection)?;
        info!(
            "Found matches for {} out of {} countries ({selection})",
            choropleth.matched(),
            choropleth.shapes.len()
        );
        Ok(choropleth)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::{emissions::MetricKind, error::CarbonMapError};

    fn fixture(name: &str) -> String {
        format!("{}/../{name}", env!("CARGO_MANIFEST_DIR"))
    }

    async fn fixture_server() -> MockServer {
        let server = MockServer::start_async().await;
        let body = std::fs::read_to_string(fixture("test_topology.json")).unwrap();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/countries-110m.json");
                then.status(200).body(body);
            })
            .await;
        server
    }

    fn fixture_config(server: &MockServer) -> Config {
        Config {
            emissions_source: fixture("test_emissions.json"),
            boundary_primary: server.url("/countries-110m.json"),
            boundary_fallback: server.url("/missing.json"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn fixtures_should_resolve_end_to_end() {
        let server = fixture_server().await;
        let map = CarbonMap::new_with_config(fixture_config(&server))
            .await
            .unwrap();
        assert_eq!(map.boundaries.len(), 5);

        let bindings = map
            .resolve_all(&Selection::new("2019", MetricKind::Total))
            .unwrap();
        let codes: Vec<Option<&str>> = bindings.iter().map(ResolvedBinding::iso3).collect();
        assert_eq!(
            codes,
            vec![Some("USA"), Some("CHN"), Some("AUS"), None, Some("FRA")]
        );

        // The United States has no 2020 figure in the fixture
        let bindings = map.resolve_all(&Selection::default()).unwrap();
        assert_eq!(bindings[0], ResolvedBinding::Unresolved);
        assert_eq!(bindings[2].iso3(), Some("AUS"));
    }

    #[tokio::test]
    async fn choropleth_should_count_matches() {
        let server = fixture_server().await;
        let map = CarbonMap::new_with_config(fixture_config(&server))
            .await
            .unwrap();
        let choropleth = map.choropleth(&Selection::default()).unwrap();
        assert_eq!(choropleth.matched(), 3);
        assert_eq!(choropleth.unresolved().count(), 2);
    }

    #[tokio::test]
    async fn malformed_topology_should_resolve_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/countries-110m.json");
                then.status(200)
                    .body(r#"{"type": "Topology", "objects": {"land": {}}, "arcs": []}"#);
            })
            .await;
        let result = CarbonMap::new_with_config(fixture_config(&server)).await;
        assert!(matches!(
            result,
            Err(CarbonMapError::MissingCountryObject { .. })
        ));
    }
}
