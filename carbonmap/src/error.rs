//! Error types.

use crate::emissions::MetricKind;

#[derive(thiserror::Error, Debug)]
pub enum CarbonMapError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error(
        "Error loading emissions data from '{location}'. Please check the source and try again."
    )]
    EmissionsLoad {
        location: String,
        #[source]
        cause: Box<CarbonMapError>,
    },
    #[error(
        "Failed to load map data from both sources. Please check your internet connection. \
         (primary: {primary}; alternative: {fallback})"
    )]
    BoundaryLoad {
        primary: Box<CarbonMapError>,
        fallback: Box<CarbonMapError>,
    },
    #[error(
        "Error processing map data: could not find countries object in the TopoJSON data \
         (objects present: {available:?})"
    )]
    MissingCountryObject { available: Vec<String> },
    #[error("Error processing map data: {0}")]
    InvalidTopology(String),
    #[error("Invalid emissions value {value} for {iso3} ({year}, {metric})")]
    InvalidEmissionsValue {
        year: String,
        metric: MetricKind,
        iso3: String,
        value: f64,
    },
    #[error("No emissions data recorded for year {0}")]
    UnknownYear(String),
    #[error("No '{metric}' emissions recorded for year {year}")]
    MissingMetric { year: String, metric: MetricKind },
    #[error("Wrapped request error: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Wrapped IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Wrapped serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CarbonMapError>;
