//! Colouring of resolved boundary features by their emissions value.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::{
    emissions::{EmissionsDataset, MetricKind},
    error::Result,
    geo::BBox,
    resolver::{MatchPath, ResolvedBinding, Resolver},
    selection::Selection,
    topology::BoundaryFeature,
};

/// Fill for features without emissions data in the current selection
pub const NEUTRAL_FILL: &str = "#ccc";

/// ColorBrewer sequential "Reds", light to dark
const REDS: [(u8, u8, u8); 9] = [
    (0xff, 0xf5, 0xf0),
    (0xfe, 0xe0, 0xd2),
    (0xfc, 0xbb, 0xa1),
    (0xfc, 0x92, 0x72),
    (0xfb, 0x6a, 0x4a),
    (0xef, 0x3b, 0x2c),
    (0xcb, 0x18, 0x1d),
    (0xa5, 0x0f, 0x15),
    (0x67, 0x00, 0x0d),
];

/// Sequential colour scale over a fixed domain. Values outside the domain
/// are clamped to its ends.
///
/// Colours are interpolated linearly between neighbouring Reds stops. d3's
/// `interpolateReds` uses a basis spline through the same stops instead, so
/// the end colours agree but mid-range fills can differ by a few units per
/// channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColourScale {
    pub domain: (f64, f64),
}

impl ColourScale {
    pub fn for_metric(metric: MetricKind) -> Self {
        Self {
            domain: metric.domain(),
        }
    }

    pub fn colour(&self, value: f64) -> String {
        let (lo, hi) = self.domain;
        let t = if hi > lo && value.is_finite() {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let scaled = t * (REDS.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(REDS.len() - 2);
        let frac = scaled - idx as f64;
        let (from, to) = (REDS[idx], REDS[idx + 1]);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            lerp(from.0, to.0),
            lerp(from.1, to.1),
            lerp(from.2, to.2)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendStop {
    pub value: f64,
    /// Position of the stop along the legend, 0 to 100
    pub offset_percent: f64,
    pub colour: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub domain: (f64, f64),
    pub stops: Vec<LegendStop>,
}

impl Legend {
    pub fn for_metric(metric: MetricKind) -> Self {
        let scale = ColourScale::for_metric(metric);
        let (lo, hi) = scale.domain;
        let step = match metric {
            MetricKind::Total => 2000.0,
            MetricKind::Capita => 10.0,
        };
        let count = ((hi - lo) / step).round() as usize;
        let stops = (0..=count)
            .map(|i| {
                let value = lo + step * i as f64;
                LegendStop {
                    value,
                    offset_percent: (value - lo) * 100.0 / (hi - lo),
                    colour: scale.colour(value),
                }
            })
            .collect();
        Self {
            title: format!("CO₂ Emissions ({})", metric.units()),
            domain: scale.domain,
            stops,
        }
    }
}

/// One boundary feature with its rendering attributes
#[derive(Clone, Debug, PartialEq)]
pub struct ChoroplethShape {
    pub name: Option<String>,
    pub id: Option<u16>,
    pub binding: ResolvedBinding,
    pub value: Option<f64>,
    pub fill: String,
    pub tooltip: Option<String>,
    pub geometry: Option<MultiPolygon<f64>>,
}

impl ChoroplethShape {
    pub fn iso3(&self) -> Option<&str> {
        self.binding.iso3()
    }

    pub fn matched_via(&self) -> Option<&MatchPath> {
        self.binding.via()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Choropleth {
    pub selection: Selection,
    pub legend: Legend,
    pub shapes: Vec<ChoroplethShape>,
}

impl Choropleth {
    /// Resolve and colour every feature for `selection`, keeping input order.
    /// Only an unknown year or metric is an error; unresolved features get
    /// the neutral fill and no tooltip.
    pub fn build(
        features: &[BoundaryFeature],
        resolver: &Resolver,
        dataset: &EmissionsDataset,
        selection: &Selection,
    ) -> Result<Self> {
        let current = dataset.current(selection)?;
        let scale = ColourScale::for_metric(selection.metric);
        let units = selection.metric.units();
        let shapes = features
            .iter()
            .map(|feature| {
                let binding = resolver.resolve(feature, current);
                let name = feature.name().map(String::from);
                let value = binding.iso3().and_then(|iso3| current.get(iso3).copied());
                let (fill, tooltip) = match (binding.iso3(), value) {
                    (Some(iso3), Some(value)) => (
                        scale.colour(value),
                        Some(format!(
                            "{}: CO₂ emissions: {value} {units}",
                            name.as_deref().unwrap_or(iso3)
                        )),
                    ),
                    _ => (NEUTRAL_FILL.to_string(), None),
                };
                ChoroplethShape {
                    name,
                    id: feature.id,
                    binding,
                    value,
                    fill,
                    tooltip,
                    geometry: feature.geometry.clone(),
                }
            })
            .collect();
        Ok(Self {
            selection: selection.clone(),
            legend: Legend::for_metric(selection.metric),
            shapes,
        })
    }

    /// Number of shapes bound to an emissions record
    pub fn matched(&self) -> usize {
        self.shapes
            .iter()
            .filter(|shape| shape.binding.is_resolved())
            .count()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ChoroplethShape> {
        self.shapes
            .iter()
            .filter(|shape| !shape.binding.is_resolved())
    }

    /// Keep only the shapes whose geometry intersects `bbox`
    pub fn filter_bbox(mut self, bbox: &BBox) -> Self {
        self.shapes.retain(|shape| {
            shape
                .geometry
                .as_ref()
                .map(|geometry| bbox.intersects(geometry))
                .unwrap_or(false)
        });
        self
    }
}
