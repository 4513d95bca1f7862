use std::fmt::Display;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{choropleth::Choropleth, emissions::MetricKind, error::Result, CarbonMap};

/// The active (year, metric) pair that picks which part of the emissions
/// dataset is current.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub year: String,
    pub metric: MetricKind,
}

impl Selection {
    pub fn new(year: impl Into<String>, metric: MetricKind) -> Self {
        Self {
            year: year.into(),
            metric,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new("2020", MetricKind::Total)
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.year, self.metric)
    }
}

/// Owns the loaded map together with the current selection and the
/// choropleth last rendered for it. Every selection change resolves all
/// features again since bindings depend on which codes the selection covers.
pub struct MapView {
    map: CarbonMap,
    selection: Selection,
    choropleth: Choropleth,
}

impl MapView {
    pub fn new(map: CarbonMap, selection: Selection) -> Result<Self> {
        let choropleth = map.choropleth(&selection)?;
        Ok(Self {
            map,
            selection,
            choropleth,
        })
    }

    pub fn map(&self) -> &CarbonMap {
        &self.map
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn choropleth(&self) -> &Choropleth {
        &self.choropleth
    }

    /// Switch to a new selection and re-render. On error the previous
    /// selection and choropleth are kept.
    pub fn set_selection(
        &mut self,
        year: impl Into<String>,
        metric: MetricKind,
    ) -> Result<&Choropleth> {
        let selection = Selection::new(year, metric);
        debug!("Updating map with new selection: {selection}");
        self.choropleth = self.map.choropleth(&selection)?;
        self.selection = selection;
        Ok(&self.choropleth)
    }

    pub fn set_year(&mut self, year: impl Into<String>) -> Result<&Choropleth> {
        let metric = self.selection.metric;
        self.set_selection(year, metric)
    }

    pub fn set_metric(&mut self, metric: MetricKind) -> Result<&Choropleth> {
        let year = self.selection.year.clone();
        self.set_selection(year, metric)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::Config, emissions::EmissionsDataset, error::CarbonMapError,
        topology::BoundaryFeature,
    };

    fn test_view() -> MapView {
        let emissions = EmissionsDataset::from_json_str(
            r#"{
                "2019": {"total": {"USA": 5285.0, "CHN": 10175.0}, "capita": {"USA": 16.1}},
                "2020": {"total": {"CHN": 10668.0}}
            }"#,
        )
        .unwrap();
        let boundaries = vec![
            BoundaryFeature::new(
                Some(840),
                json!({"name": "United States of America"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
            BoundaryFeature::new(
                Some(156),
                json!({"name": "China"}).as_object().cloned().unwrap(),
            ),
        ];
        let map = CarbonMap::from_parts(Config::default(), emissions, boundaries);
        MapView::new(map, Selection::default()).unwrap()
    }

    #[test]
    fn default_selection_should_be_2020_total() {
        assert_eq!(Selection::default(), Selection::new("2020", MetricKind::Total));
        assert_eq!(Selection::default().to_string(), "2020 (total)");
    }

    #[test]
    fn set_selection_should_re_resolve() {
        let mut view = test_view();
        assert_eq!(view.choropleth().matched(), 1);
        assert!(view.choropleth().shapes[0].iso3().is_none());

        let choropleth = view.set_year("2019").unwrap();
        assert_eq!(choropleth.matched(), 2);
        assert_eq!(choropleth.shapes[0].iso3(), Some("USA"));

        let choropleth = view.set_metric(MetricKind::Capita).unwrap();
        assert_eq!(choropleth.matched(), 1);
        assert_eq!(choropleth.shapes[1].iso3(), None);
        assert_eq!(
            view.selection(),
            &Selection::new("2019", MetricKind::Capita)
        );
    }

    #[test]
    fn invalid_selection_should_keep_previous_state() {
        let mut view = test_view();
        let result = view.set_metric(MetricKind::Capita);
        assert!(matches!(result, Err(CarbonMapError::MissingMetric { .. })));
        assert_eq!(view.selection(), &Selection::default());
        assert_eq!(view.choropleth().selection, Selection::default());
        assert!(matches!(
            view.set_year("1850"),
            Err(CarbonMapError::UnknownYear(_))
        ));
    }
}
