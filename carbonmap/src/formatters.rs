use std::io::Write;

use anyhow::Result;
use enum_dispatch::enum_dispatch;
use geozero::{csv::CsvWriter, geojson::GeoJson, GeozeroDatasource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    choropleth::{Choropleth, ChoroplethShape},
    COL,
};

/// Properties written for a shape. `missing` stands in for absent values:
/// null for GeoJSON, an empty string for CSV so every row has every column.
fn shape_properties(
    choropleth: &Choropleth,
    shape: &ChoroplethShape,
    missing: &Value,
) -> Map<String, Value> {
    let or_missing = |value: Option<Value>| value.unwrap_or_else(|| missing.clone());
    let mut properties = Map::new();
    properties.insert(
        COL::NAME.into(),
        or_missing(shape.name.clone().map(Value::from)),
    );
    properties.insert(COL::ISO3.into(), or_missing(shape.iso3().map(Value::from)));
    properties.insert(COL::FEATURE_ID.into(), or_missing(shape.id.map(Value::from)));
    properties.insert(COL::VALUE.into(), or_missing(shape.value.map(Value::from)));
    properties.insert(
        COL::UNITS.into(),
        Value::from(choropleth.selection.metric.units()),
    );
    properties.insert(COL::FILL.into(), Value::from(shape.fill.clone()));
    properties.insert(
        COL::TOOLTIP.into(),
        or_missing(shape.tooltip.clone().map(Value::from)),
    );
    properties.insert(
        COL::MATCHED_VIA.into(),
        or_missing(shape.matched_via().map(|via| Value::from(via.to_string()))),
    );
    properties.insert(
        COL::YEAR.into(),
        Value::from(choropleth.selection.year.clone()),
    );
    properties.insert(
        COL::METRIC.into(),
        Value::from(choropleth.selection.metric.to_string()),
    );
    properties
}

fn shape_feature(
    choropleth: &Choropleth,
    shape: &ChoroplethShape,
    missing: &Value,
) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: shape
            .geometry
            .as_ref()
            .map(|geometry| geojson::Geometry::new(geojson::Value::from(geometry))),
        id: shape
            .id
            .map(|id| geojson::feature::Id::Number(serde_json::Number::from(id))),
        properties: Some(shape_properties(choropleth, shape, missing)),
        foreign_members: None,
    }
}

/// Trait to define different output generators. Defines two
/// functions, save which writes the serialized choropleth to a writer and
/// format which returns it as a string
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, choropleth: &Choropleth) -> Result<()>;
    fn format(&self, choropleth: &Choropleth) -> Result<String> {
        let mut data: Vec<u8> = vec![];
        self.save(&mut data, choropleth)?;
        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    GeoJSONSeq(GeoJSONSeqFormatter),
    Csv(CSVFormatter),
}

/// Format the choropleth as a geojson feature collection. The selection and
/// legend are included as foreign members so a renderer can draw the key.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter;

impl GeoJSONFormatter {
    fn feature_collection(
        choropleth: &Choropleth,
        missing: &Value,
    ) -> geojson::FeatureCollection {
        let features = choropleth
            .shapes
            .iter()
            .map(|shape| shape_feature(choropleth, shape, missing))
            .collect();
        let mut foreign_members = Map::new();
        foreign_members.insert("selection".into(), json!(choropleth.selection));
        foreign_members.insert("legend".into(), json!(choropleth.legend));
        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }
}

impl OutputGenerator for GeoJSONFormatter {
    fn format(&self, choropleth: &Choropleth) -> Result<String> {
        Ok(Self::feature_collection(choropleth, &Value::Null).to_string())
    }

    fn save(&self, writer: &mut impl Write, choropleth: &Choropleth) -> Result<()> {
        let result = self.format(choropleth)?;
        writer.write_all(result.as_bytes())?;
        Ok(())
    }
}

/// Format the results as geojson sequence format
/// This is one line per feature serialized as a
/// geojson feature
#[derive(Serialize, Deserialize, Debug)]
pub struct GeoJSONSeqFormatter;

impl OutputGenerator for GeoJSONSeqFormatter {
    fn save(&self, writer: &mut impl Write, choropleth: &Choropleth) -> Result<()> {
        for shape in &choropleth.shapes {
            let feature = shape_feature(choropleth, shape, &Value::Null);
            writeln!(writer, "{feature}")?;
        }
        Ok(())
    }
}

/// Format the results as a CSV file with the geometry encoded as WKT
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CSVFormatter;

impl OutputGenerator for CSVFormatter {
    fn save(&self, writer: &mut impl Write, choropleth: &Choropleth) -> Result<()> {
        let geojson =
            GeoJSONFormatter::feature_collection(choropleth, &Value::String(String::new()))
                .to_string();
        let mut csv_writer = CsvWriter::new(writer);
        GeoJson(&geojson).process(&mut csv_writer)?;
        Ok(())
    }
}
