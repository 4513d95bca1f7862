use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path or URL of the emissions dataset
    pub emissions_source: String,
    /// Boundary topology mirror tried first
    pub boundary_primary: String,
    /// Boundary topology mirror tried once if the primary fails
    pub boundary_fallback: String,
    /// Names under which the country collection may appear in the topology, in priority order
    pub country_objects: Vec<String>,
    /// Properties scanned, in priority order, for a recognised country name
    /// when a feature's "name" does not resolve
    pub name_properties: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            emissions_source: "data/emissions-data.json".into(),
            boundary_primary: "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json"
                .into(),
            boundary_fallback: "https://unpkg.com/world-atlas@2.0.2/countries-110m.json".into(),
            country_objects: vec!["countries".into(), "ne_110m_admin_0_countries".into()],
            name_properties: ["name_long", "admin", "name_en", "formal_en", "sovereignt", "geounit"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_should_fill_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"emissions_source": "fixtures/emissions.json"}"#).unwrap();
        assert_eq!(config.emissions_source, "fixtures/emissions.json");
        assert_eq!(config.boundary_primary, Config::default().boundary_primary);
        assert_eq!(config.country_objects[0], "countries");
    }
}
