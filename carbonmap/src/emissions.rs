//! Types for the emissions-by-country-by-year dataset

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{CarbonMapError, Result};
use crate::selection::Selection;

/// The kind of emissions figure recorded for each country.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MetricKind {
    /// Million tonnes of CO₂
    Total,
    /// Tonnes of CO₂ per capita
    Capita,
}

impl MetricKind {
    pub fn units(&self) -> &'static str {
        match self {
            MetricKind::Total => "million tonnes",
            MetricKind::Capita => "tonnes per capita",
        }
    }

    /// Colour scale domain used when shading a map for this metric
    pub fn domain(&self) -> (f64, f64) {
        match self {
            MetricKind::Total => (0.0, 12_000.0),
            MetricKind::Capita => (0.0, 50.0),
        }
    }
}

/// Emissions values for one year and metric, keyed by ISO-3166 alpha-3 code.
pub type CountryValues = HashMap<String, f64>;

/// The full dataset: year -> metric -> ISO3 code -> value.
///
/// Loaded once and never mutated; a `Selection` only picks which
/// `CountryValues` is current.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmissionsDataset(pub BTreeMap<String, BTreeMap<MetricKind, CountryValues>>);

impl EmissionsDataset {
    /// Parse a dataset from JSON and check every value is a non-negative finite number
    pub fn from_json_str(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<()> {
        for (year, metrics) in &self.0 {
            for (metric, values) in metrics {
                if let Some((iso3, value)) = values
                    .iter()
                    .find(|(_, value)| !value.is_finite() || **value < 0.0)
                {
                    return Err(CarbonMapError::InvalidEmissionsValue {
                        year: year.clone(),
                        metric: *metric,
                        iso3: iso3.clone(),
                        value: *value,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn metrics(&self, year: &str) -> Vec<MetricKind> {
        self.0
            .get(year)
            .map(|metrics| metrics.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The sub-mapping for the given selection
    pub fn current(&self, selection: &Selection) -> Result<&CountryValues> {
        self.0
            .get(&selection.year)
            .ok_or_else(|| CarbonMapError::UnknownYear(selection.year.clone()))?
            .get(&selection.metric)
            .ok_or_else(|| CarbonMapError::MissingMetric {
                year: selection.year.clone(),
                metric: selection.metric,
            })
    }
}
