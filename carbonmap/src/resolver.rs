//! Reconciliation of boundary features with emissions records.
//!
//! A feature is resolved to the ISO-3166 alpha-3 code of the emissions record
//! it describes, trying progressively less specific signals:
//!
//! 1. the feature's "name" property,
//! 2. any other string property holding a recognised country name,
//! 3. the feature's numeric identifier.
//!
//! A code only counts if the current selection has a value for it, so a
//! feature has to be resolved again whenever the selection changes.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    countries::CountryTable,
    emissions::CountryValues,
    topology::{BoundaryFeature, NAME_PROPERTY},
};

/// Which signal produced a binding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPath {
    Name,
    ScannedProperty(String),
    NumericId,
}

impl Display for MatchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPath::Name => write!(f, "name"),
            MatchPath::ScannedProperty(key) => write!(f, "property:{key}"),
            MatchPath::NumericId => write!(f, "id"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedBinding {
    Resolved { iso3: String, via: MatchPath },
    Unresolved,
}

impl ResolvedBinding {
    pub fn iso3(&self) -> Option<&str> {
        match self {
            ResolvedBinding::Resolved { iso3, .. } => Some(iso3),
            ResolvedBinding::Unresolved => None,
        }
    }

    pub fn via(&self) -> Option<&MatchPath> {
        match self {
            ResolvedBinding::Resolved { via, .. } => Some(via),
            ResolvedBinding::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedBinding::Resolved { .. })
    }
}

/// A mapped code only counts when the current selection records a value for it
fn present<'a>(code: Option<&'a str>, current: &CountryValues) -> Option<&'a str> {
    code.filter(|code| current.contains_key(*code))
}

#[derive(Clone, Debug)]
pub struct Resolver {
    table: CountryTable,
    name_properties: Vec<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Resolver {
    /// `name_properties` are scanned first, in order, before the remaining
    /// string properties in key order.
    pub fn new(table: CountryTable, name_properties: Vec<String>) -> Self {
        Self {
            table,
            name_properties,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CountryTable::builtin(), config.name_properties.clone())
    }

    pub fn table(&self) -> &CountryTable {
        &self.table
    }

    pub fn resolve(&self, feature: &BoundaryFeature, current: &CountryValues) -> ResolvedBinding {
        if let Some(iso3) = present(
            feature.name().and_then(|name| self.table.code_for_name(name)),
            current,
        ) {
            return ResolvedBinding::Resolved {
                iso3: iso3.into(),
                via: MatchPath::Name,
            };
        }

        for (key, value) in self.scan_order(feature) {
            if let Some(iso3) = present(self.table.code_for_name(value), current) {
                return ResolvedBinding::Resolved {
                    iso3: iso3.into(),
                    via: MatchPath::ScannedProperty(key.into()),
                };
            }
        }

        if let Some(iso3) = present(feature.id.and_then(|id| self.table.code_for_id(id)), current) {
            return ResolvedBinding::Resolved {
                iso3: iso3.into(),
                via: MatchPath::NumericId,
            };
        }

        ResolvedBinding::Unresolved
    }

    /// Number of features that resolve against `current`
    pub fn match_count<'a, I>(&self, features: I, current: &CountryValues) -> usize
    where
        I: IntoIterator<Item = &'a BoundaryFeature>,
    {
        features
            .into_iter()
            .filter(|feature| self.resolve(feature, current).is_resolved())
            .count()
    }

    /// String properties to scan after the "name" lookup fails, configured
    /// keys first and then every other key in lexicographic order.
    fn scan_order<'f>(&self, feature: &'f BoundaryFeature) -> Vec<(&'f str, &'f str)> {
        let preferred = self.name_properties.iter().filter_map(|key| {
            feature
                .properties
                .get_key_value(key.as_str())
                .and_then(|(key, value)| value.as_str().map(|value| (key.as_str(), value)))
        });
        let remaining = feature
            .string_properties()
            .filter(|(key, _)| {
                *key != NAME_PROPERTY && !self.name_properties.iter().any(|p| p == key)
            })
            .sorted_by_key(|(key, _)| *key);
        preferred
            .filter(|(key, _)| *key != NAME_PROPERTY)
            .chain(remaining)
            .collect()
    }
}
