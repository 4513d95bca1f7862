//! Names of the properties/columns written for each choropleth shape by the
//! output formatters.

pub const NAME: &str = "name";
pub const ISO3: &str = "iso3";
pub const FEATURE_ID: &str = "feature_id";
pub const VALUE: &str = "value";
pub const UNITS: &str = "units";
pub const FILL: &str = "fill";
pub const TOOLTIP: &str = "tooltip";
pub const MATCHED_VIA: &str = "matched_via";
pub const YEAR: &str = "year";
pub const METRIC: &str = "metric";
