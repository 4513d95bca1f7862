//! Decoding of TopoJSON boundary data into `BoundaryFeature`s.
//!
//! Only the parts of the format needed for country outlines are handled:
//! `Polygon`, `MultiPolygon` and nested `GeometryCollection`s, optionally
//! quantized with a `transform`. Any other geometry type produces a feature
//! without geometry so that it can still be resolved and shaded.

use std::collections::BTreeMap;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CarbonMapError, Result};

/// Property holding the canonical display name of a feature
pub const NAME_PROPERTY: &str = "name";

/// One country or territory from the boundary dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<u16>,
    pub properties: Map<String, Value>,
    pub geometry: Option<MultiPolygon<f64>>,
}

impl BoundaryFeature {
    pub fn new(id: Option<u16>, properties: Map<String, Value>) -> Self {
        Self {
            id,
            properties,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: MultiPolygon<f64>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// The "name" property if it is a string
    pub fn name(&self) -> Option<&str> {
        self.string_property(NAME_PROPERTY)
    }

    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// All string-valued properties
    pub fn string_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|value| (key.as_str(), value)))
    }
}

/// Identifiers appear either as JSON numbers or as zero-padded strings ("036").
/// Anything else, or a number outside the ISO numeric range, counts as absent.
fn parse_feature_id(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|id| u16::try_from(id).ok()),
        Value::String(id) => id.trim().parse::<u16>().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// A geometry object inside a topology. Kept loosely typed so that unknown
/// geometry types do not stop the whole payload from being read.
#[derive(Debug, Deserialize)]
pub struct TopoObject {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub arcs: Option<Value>,
    #[serde(default)]
    pub geometries: Vec<TopoObject>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub objects: BTreeMap<String, TopoObject>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub transform: Option<Transform>,
}

impl Topology {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    /// Decode the first of `object_names` present in the topology into features.
    pub fn into_features(mut self, object_names: &[String]) -> Result<Vec<BoundaryFeature>> {
        let Some(name) = object_names
            .iter()
            .find(|name| self.objects.contains_key(name.as_str()))
        else {
            return Err(CarbonMapError::MissingCountryObject {
                available: self.object_names(),
            });
        };
        debug!("Using country object name: {name}");
        let object = self.objects.remove(name.as_str()).ok_or_else(|| {
            CarbonMapError::MissingCountryObject {
                available: self.object_names(),
            }
        })?;
        let arcs = self.decode_arcs()?;

        let objects = match object.kind.as_deref() {
            Some("GeometryCollection") => object.geometries,
            _ => vec![object],
        };
        objects
            .into_iter()
            .map(|object| object_to_feature(object, &arcs))
            .collect()
    }

    /// Absolute coordinates for every arc, undoing delta encoding when quantized
    fn decode_arcs(&self) -> Result<Vec<Vec<Coord<f64>>>> {
        self.arcs
            .iter()
            .enumerate()
            .map(|(idx, arc)| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|position| {
                        let [dx, dy] = match position.as_slice() {
                            [dx, dy, ..] => [*dx, *dy],
                            _ => {
                                return Err(CarbonMapError::InvalidTopology(format!(
                                    "arc {idx} has a position with fewer than two coordinates"
                                )))
                            }
                        };
                        Ok(match &self.transform {
                            Some(transform) => {
                                x += dx;
                                y += dy;
                                Coord {
                                    x: x * transform.scale[0] + transform.translate[0],
                                    y: y * transform.scale[1] + transform.translate[1],
                                }
                            }
                            None => Coord { x: dx, y: dy },
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Parse a TopoJSON payload and decode its country collection.
pub fn decode_features(json: &str, object_names: &[String]) -> Result<Vec<BoundaryFeature>> {
    Topology::from_json_str(json)?.into_features(object_names)
}

fn object_to_feature(mut object: TopoObject, arcs: &[Vec<Coord<f64>>]) -> Result<BoundaryFeature> {
    let id = object.id.as_ref().and_then(parse_feature_id);
    let properties = object.properties.take().unwrap_or_default();
    let polygons = object_polygons(object, arcs)?;
    let feature = BoundaryFeature::new(id, properties);
    Ok(if polygons.is_empty() {
        feature
    } else {
        feature.with_geometry(MultiPolygon(polygons))
    })
}

fn object_polygons(object: TopoObject, arcs: &[Vec<Coord<f64>>]) -> Result<Vec<Polygon<f64>>> {
    match (object.kind.as_deref(), object.arcs) {
        (Some("Polygon"), Some(rings)) => {
            let rings: Vec<Vec<i64>> = serde_json::from_value(rings)?;
            Ok(vec![polygon(&rings, arcs)?])
        }
        (Some("MultiPolygon"), Some(polygons)) => {
            let polygons: Vec<Vec<Vec<i64>>> = serde_json::from_value(polygons)?;
            polygons.iter().map(|rings| polygon(&rings[..], arcs)).collect()
        }
        (Some("GeometryCollection"), _) => {
            let mut polygons = vec![];
            for geometry in object.geometries {
                polygons.extend(object_polygons(geometry, arcs)?);
            }
            Ok(polygons)
        }
        _ => Ok(vec![]),
    }
}

fn polygon(rings: &[Vec<i64>], arcs: &[Vec<Coord<f64>>]) -> Result<Polygon<f64>> {
    let mut rings = rings
        .iter()
        .map(|ring| ring_coords(ring, arcs).map(LineString::new));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(vec![]));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Stitch arcs into a ring. Consecutive arcs share an endpoint, so it is
/// dropped before appending the next arc. A negative index `i` refers to arc
/// `!i` traversed in reverse.
fn ring_coords(ring: &[i64], arcs: &[Vec<Coord<f64>>]) -> Result<Vec<Coord<f64>>> {
    let mut coords: Vec<Coord<f64>> = vec![];
    for &index in ring {
        let (arc_idx, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(arc_idx)
            .ok()
            .and_then(|idx| arcs.get(idx))
            .ok_or_else(|| {
                CarbonMapError::InvalidTopology(format!("reference to missing arc {index}"))
            })?;
        coords.pop();
        if reversed {
            coords.extend(arc.iter().rev());
        } else {
            coords.extend(arc.iter());
        }
    }
    if let Some(&first) = coords.first() {
        while coords.len() < 4 {
            coords.push(first);
        }
    }
    Ok(coords)
}
