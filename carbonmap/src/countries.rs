//! Country lookup tables used to reconcile boundary features with emissions records.
//!
//! Both the name and numeric-id lookups are derived from a single list of
//! `CountryRecord`s so the two can never disagree about which code a country has.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// (canonical English name, ISO-3166 alpha-3, ISO-3166 numeric)
pub const COUNTRIES: &[(&str, &str, u16)] = &[
    ("United States", "USA", 840),
    ("China", "CHN", 156),
    ("India", "IND", 356),
    ("Russia", "RUS", 643),
    ("Japan", "JPN", 392),
    ("Germany", "DEU", 276),
    ("Iran", "IRN", 364),
    ("South Korea", "KOR", 410),
    ("Saudi Arabia", "SAU", 682),
    ("Indonesia", "IDN", 360),
    ("Canada", "CAN", 124),
    ("Mexico", "MEX", 484),
    ("Brazil", "BRA", 76),
    ("South Africa", "ZAF", 710),
    ("Australia", "AUS", 36),
    ("Turkey", "TUR", 792),
    ("United Kingdom", "GBR", 826),
    ("Italy", "ITA", 380),
    ("France", "FRA", 250),
    ("Poland", "POL", 616),
    ("Qatar", "QAT", 634),
    ("Kuwait", "KWT", 414),
    ("United Arab Emirates", "ARE", 784),
    ("Kazakhstan", "KAZ", 398),
    ("Netherlands", "NLD", 528),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub iso3: String,
    pub numeric_id: u16,
}

impl From<&(&str, &str, u16)> for CountryRecord {
    fn from(&(name, iso3, numeric_id): &(&str, &str, u16)) -> Self {
        Self {
            name: name.into(),
            iso3: iso3.into(),
            numeric_id,
        }
    }
}

/// NameToCodeTable and IdToCodeTable, built together.
#[derive(Clone, Debug)]
pub struct CountryTable {
    records: Vec<CountryRecord>,
    name_to_code: HashMap<String, usize>,
    id_to_code: HashMap<u16, usize>,
}

impl CountryTable {
    /// Build the lookups from a list of records. When a name or id appears
    /// more than once the first record wins.
    pub fn from_records<I: IntoIterator<Item = CountryRecord>>(records: I) -> Self {
        let records: Vec<CountryRecord> = records.into_iter().collect();
        let mut name_to_code = HashMap::with_capacity(records.len());
        let mut id_to_code = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            name_to_code.entry(record.name.clone()).or_insert(idx);
            id_to_code.entry(record.numeric_id).or_insert(idx);
        }
        Self {
            records,
            name_to_code,
            id_to_code,
        }
    }

    pub fn builtin() -> Self {
        Self::from_records(COUNTRIES.iter().map(CountryRecord::from))
    }

    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_code
            .get(name)
            .map(|idx| self.records[*idx].iso3.as_str())
    }

    pub fn code_for_id(&self, id: u16) -> Option<&str> {
        self.id_to_code
            .get(&id)
            .map(|idx| self.records[*idx].iso3.as_str())
    }

    pub fn record_for_code(&self, iso3: &str) -> Option<&CountryRecord> {
        self.records.iter().find(|record| record.iso3 == iso3)
    }

    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_table_should_have_unique_keys() {
        let names: HashSet<_> = COUNTRIES.iter().map(|(name, _, _)| name).collect();
        let codes: HashSet<_> = COUNTRIES.iter().map(|(_, iso3, _)| iso3).collect();
        let ids: HashSet<_> = COUNTRIES.iter().map(|(_, _, id)| id).collect();
        assert_eq!(names.len(), COUNTRIES.len());
        assert_eq!(codes.len(), COUNTRIES.len());
        assert_eq!(ids.len(), COUNTRIES.len());
    }

    #[test]
    fn name_and_id_lookups_should_agree() {
        let table = CountryTable::builtin();
        assert_eq!(table.len(), 25);
        for record in table.records() {
            assert_eq!(table.code_for_name(&record.name), Some(record.iso3.as_str()));
            assert_eq!(table.code_for_id(record.numeric_id), Some(record.iso3.as_str()));
        }
    }

    #[test]
    fn lookups_should_match_known_countries() {
        let table = CountryTable::default();
        assert_eq!(table.code_for_name("United States"), Some("USA"));
        assert_eq!(table.code_for_id(840), Some("USA"));
        assert_eq!(table.code_for_id(36), Some("AUS"));
        assert_eq!(table.code_for_name("united states"), None);
        assert_eq!(table.code_for_id(4), None);
        assert_eq!(
            table.record_for_code("GBR").map(|r| r.name.as_str()),
            Some("United Kingdom")
        );
    }

    #[test]
    fn first_duplicate_record_should_win() {
        let table = CountryTable::from_records(vec![
            CountryRecord::from(&("Atlantis", "ATL", 900)),
            CountryRecord::from(&("Atlantis", "ATX", 901)),
        ]);
        assert_eq!(table.code_for_name("Atlantis"), Some("ATL"));
        assert_eq!(table.code_for_id(901), Some("ATX"));
    }
}
