use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::model::{Field, Record};

/// One group: the key's text and the summed metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEntry {
    pub key: String,
    pub value: f64,
}

impl AggregateEntry {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Grouped sums in first-seen key order. Never cached across filter
/// changes; rebuild from the current view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Aggregate {
    entries: Vec<AggregateEntry>,
}

impl Aggregate {
    pub fn entries(&self) -> &[AggregateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    /// Entry with the largest value; ties go to the earliest entry.
    pub fn max_entry(&self) -> Option<&AggregateEntry> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if e.value <= b.value => Some(b),
            _ => Some(e),
        })
    }

    /// Copy sorted ascending by key, numerically when both keys parse as
    /// numbers (so years order as 2019 < 2020 < 2100) and lexically
    /// otherwise.
    pub fn sorted_by_key(&self) -> Aggregate {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| compare_keys(&a.key, &b.key));
        Aggregate { entries }
    }
}

impl From<Vec<AggregateEntry>> for Aggregate {
    fn from(entries: Vec<AggregateEntry>) -> Self {
        Aggregate { entries }
    }
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

/// Group `records` by `key_field` and sum `value_field`.
///
/// Records whose key is falsy (empty text, zero) are skipped. The value is
/// read through the lenient coercion policy, so non-numeric fields add 0.
pub fn group_sum<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    key_field: Field,
    value_field: Field,
) -> Aggregate {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<AggregateEntry> = Vec::new();

    for rec in records {
        let Some(key) = rec.key(key_field) else {
            continue;
        };
        let value = rec.metric(value_field);
        match positions.get(&key) {
            Some(&i) => entries[i].value += value,
            None => {
                positions.insert(key.clone(), entries.len());
                entries.push(AggregateEntry { key, value });
            }
        }
    }

    Aggregate { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i64, region: &str, mode: &str, sales: f64) -> Record {
        Record {
            year,
            region: region.into(),
            mode: mode.into(),
            sales_volume: sales,
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_gives_empty_aggregate() {
        let agg = group_sum(std::iter::empty(), Field::Mode, Field::SalesVolume);
        assert!(agg.is_empty());
        assert!(agg.max_entry().is_none());
    }

    #[test]
    fn sums_in_first_seen_order() {
        let records = vec![
            rec(2020, "EU", "SUV", 10.0),
            rec(2020, "EU", "SUV", 5.0),
            rec(2020, "EU", "Sedan", 3.0),
        ];
        let agg = group_sum(&records, Field::Mode, Field::SalesVolume);
        assert_eq!(
            agg.entries(),
            &[AggregateEntry::new("SUV", 15.0), AggregateEntry::new("Sedan", 3.0)]
        );
    }

    #[test]
    fn falsy_keys_are_skipped() {
        let records = vec![rec(2020, "", "SUV", 10.0), rec(0, "EU", "SUV", 4.0)];
        let by_region = group_sum(&records, Field::Region, Field::SalesVolume);
        assert_eq!(by_region.entries(), &[AggregateEntry::new("EU", 4.0)]);

        let by_year = group_sum(&records, Field::Year, Field::SalesVolume);
        assert_eq!(by_year.entries(), &[AggregateEntry::new("2020", 10.0)]);
    }

    #[test]
    fn text_value_field_sums_as_zero() {
        let records = vec![rec(2020, "EU", "SUV", 10.0)];
        let agg = group_sum(&records, Field::Year, Field::Region);
        assert_eq!(agg.entries(), &[AggregateEntry::new("2020", 0.0)]);
    }

    #[test]
    fn sorted_by_key_orders_years_numerically() {
        let records = vec![
            rec(2022, "EU", "SUV", 1.0),
            rec(999, "EU", "SUV", 2.0),
            rec(2020, "EU", "SUV", 3.0),
        ];
        let sorted = group_sum(&records, Field::Year, Field::SalesVolume).sorted_by_key();
        assert_eq!(sorted.keys(), vec!["999", "2020", "2022"]);
    }

    #[test]
    fn max_entry_prefers_first_on_ties() {
        let agg = Aggregate::from(vec![
            AggregateEntry::new("a", 5.0),
            AggregateEntry::new("b", 9.0),
            AggregateEntry::new("c", 9.0),
        ]);
        assert_eq!(agg.max_entry().map(|e| e.key.as_str()), Some("b"));
    }
}
