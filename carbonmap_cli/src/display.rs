use comfy_table::{presets::NOTHING, *};
use itertools::izip;

use carbonmap::{
    choropleth::{Choropleth, Legend},
    emissions::EmissionsDataset,
    resolver::ResolvedBinding,
    topology::BoundaryFeature,
};

fn create_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|title| Cell::new(title).add_attribute(Attribute::Bold)),
        )
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn id_cell(id: Option<u16>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

pub fn choropleth_table(choropleth: &Choropleth) -> Table {
    let mut table = create_table(&["Name", "ISO3", "Feature ID", "Value", "Fill", "Matched via"]);
    for shape in &choropleth.shapes {
        table.add_row(vec![
            shape.name.clone().unwrap_or_default(),
            shape.iso3().unwrap_or_default().to_string(),
            id_cell(shape.id),
            shape.value.map(|value| value.to_string()).unwrap_or_default(),
            shape.fill.clone(),
            shape
                .matched_via()
                .map(ToString::to_string)
                .unwrap_or_default(),
        ]);
    }
    table
}

pub fn bindings_table(
    features: &[BoundaryFeature],
    bindings: &[ResolvedBinding],
    unresolved_only: bool,
) -> Table {
    let mut table = create_table(&["Feature ID", "Name", "ISO3", "Matched via"]);
    for (feature, binding) in izip!(features, bindings)
        .filter(|(_, binding)| !unresolved_only || !binding.is_resolved())
    {
        table.add_row(vec![
            id_cell(feature.id),
            feature.name().unwrap_or_default().to_string(),
            binding.iso3().unwrap_or_default().to_string(),
            binding.via().map(ToString::to_string).unwrap_or_default(),
        ]);
    }
    table
}

pub fn display_bindings(
    features: &[BoundaryFeature],
    bindings: &[ResolvedBinding],
    unresolved_only: bool,
) -> anyhow::Result<()> {
    println!("\n{}", bindings_table(features, bindings, unresolved_only));
    let matched = bindings.iter().filter(|binding| binding.is_resolved()).count();
    println!(
        "Found matches for {} out of {} countries",
        matched,
        bindings.len()
    );
    Ok(())
}

pub fn years_table(dataset: &EmissionsDataset) -> Table {
    let mut table = create_table(&["Year", "Metric", "Countries"]);
    for (year, metrics) in &dataset.0 {
        for (metric, values) in metrics {
            table.add_row(vec![
                year.clone(),
                metric.to_string(),
                values.len().to_string(),
            ]);
        }
    }
    table
}

pub fn display_years(dataset: &EmissionsDataset) -> anyhow::Result<()> {
    println!("\n{}", years_table(dataset));
    Ok(())
}

pub fn display_legend(legend: &Legend) -> anyhow::Result<()> {
    let mut table = create_table(&["Value", "Offset (%)", "Colour"]);
    for stop in &legend.stops {
        table.add_row(vec![
            stop.value.to_string(),
            stop.offset_percent.to_string(),
            stop.colour.clone(),
        ]);
    }
    println!("\n{}\n{}", legend.title, table);
    Ok(())
}
